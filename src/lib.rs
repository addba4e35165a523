//! Supervised distance metric learning through maximization of the Jeffrey
//! divergence (DMLMJ), in a linear and a kernelized flavour.

pub mod error;
pub mod metrics;
pub mod numerical;
pub mod distance;
pub mod kernel;
pub mod representation;

// Fitting pipeline
pub mod neighbors;
pub mod scatter;
pub mod regularize;
pub mod eigen;
pub mod ranking;

// Learners
pub mod traits;
pub mod dmlmj;
pub mod kdmlmj;

#[cfg(feature = "python")]
pub mod python;

pub use crate::dmlmj::{Dmlmj, DmlmjConfig};
pub use crate::error::{DmlError, DmlResult};
pub use crate::kdmlmj::KernelDmlmj;
pub use crate::kernel::{Kernel, KernelConfig};
pub use crate::metrics::Metric;
pub use crate::traits::{Metadata, MetricLearner};

#[cfg(all(feature = "python", not(test)))]
#[pyo3::pymodule]
#[pyo3(name = "_dmlmj_backend")]
fn dmlmj_backend(m: &pyo3::Bound<'_, pyo3::types::PyModule>) -> pyo3::PyResult<()> {
    use pyo3::types::PyModuleMethods;

    m.add_class::<python::PyDmlmj>()?;
    m.add_class::<python::PyKernelDmlmj>()?;

    Ok(())
}
