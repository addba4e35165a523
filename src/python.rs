//! Python bindings for the linear and kernel learners.

use numpy::{IntoPyArray, PyArray1, PyArray2, PyReadonlyArray2};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::{PyBytes, PyDict};

use crate::dmlmj::{Dmlmj, DmlmjConfig};
use crate::error::DmlError;
use crate::kdmlmj::KernelDmlmj;
use crate::kernel::{Kernel, KernelConfig};
use crate::traits::{Metadata, MetricLearner};

impl From<DmlError> for PyErr {
    fn from(err: DmlError) -> Self {
        PyValueError::new_err(err.to_string())
    }
}

fn build_config(num_dims: Option<usize>, n_neighbors: usize, alpha: f64, reg_tol: f64) -> DmlmjConfig {
    let mut config = DmlmjConfig::default()
        .with_n_neighbors(n_neighbors)
        .with_alpha(alpha)
        .with_reg_tol(reg_tol);
    config.num_dims = num_dims;
    config
}

fn metadata_dict<'py>(py: Python<'py>, meta: Metadata) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new_bound(py);
    dict.set_item("acum_eig", meta.acum_eig)?;
    dict.set_item("num_dims", meta.num_dims)?;
    Ok(dict)
}

/// Distance Metric Learning through the Maximization of the Jeffrey divergence
#[pyclass(name = "DMLMJ", module = "dmlmj._dmlmj_backend")]
pub struct PyDmlmj {
    inner: Dmlmj,
}

#[pymethods]
impl PyDmlmj {
    #[new]
    #[pyo3(signature = (num_dims=None, n_neighbors=3, alpha=0.001, reg_tol=1e-10))]
    fn new(num_dims: Option<usize>, n_neighbors: usize, alpha: f64, reg_tol: f64) -> Self {
        Self {
            inner: Dmlmj::new(build_config(num_dims, n_neighbors, alpha, reg_tol)),
        }
    }

    /// Fit the model from the data in X and the labels in y
    fn fit<'py>(
        mut slf: PyRefMut<'py, Self>,
        x: PyReadonlyArray2<'py, f64>,
        y: Vec<usize>,
    ) -> PyResult<PyRefMut<'py, Self>> {
        slf.inner.fit(x.as_array(), &y)?;
        Ok(slf)
    }

    /// Learned projection, shape (num_dims, n_features)
    fn transformer<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyArray2<f64>>> {
        Ok(self.inner.transformer()?.clone().into_pyarray_bound(py))
    }

    /// Mahalanobis matrix L^T L
    fn metric<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyArray2<f64>>> {
        Ok(self.inner.metric()?.into_pyarray_bound(py))
    }

    fn metadata<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        metadata_dict(py, self.inner.metadata()?)
    }

    #[getter]
    fn eig_vals_<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyArray1<f64>>> {
        Ok(self.inner.eigenvalues()?.clone().into_pyarray_bound(py))
    }

    fn transform<'py>(&self, py: Python<'py>, x: PyReadonlyArray2<'py, f64>) -> PyResult<Bound<'py, PyArray2<f64>>> {
        Ok(self.inner.transform(x.as_array())?.into_pyarray_bound(py))
    }

    pub fn __getstate__(&self, py: Python<'_>) -> PyResult<Py<PyBytes>> {
        let encoded = self.inner.to_bytes()?;
        Ok(PyBytes::new_bound(py, &encoded).into())
    }

    pub fn __setstate__(&mut self, state: &Bound<'_, PyBytes>) -> PyResult<()> {
        self.inner = Dmlmj::from_bytes(state.as_bytes())?;
        Ok(())
    }
}

/// Kernelized DMLMJ
///
/// `kernel` is one of "linear", "poly", "rbf", "sigmoid", "cosine" or
/// "precomputed". Python callables are not accepted as kernels; pass a
/// precomputed Gram matrix instead. The model cannot be pickled and has no
/// `metric()`.
#[pyclass(name = "KDMLMJ", module = "dmlmj._dmlmj_backend")]
pub struct PyKernelDmlmj {
    inner: KernelDmlmj,
}

#[pymethods]
impl PyKernelDmlmj {
    #[new]
    #[pyo3(signature = (
        num_dims=None,
        n_neighbors=3,
        alpha=0.001,
        reg_tol=1e-10,
        kernel="linear",
        gamma=None,
        degree=3,
        coef0=1.0
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        num_dims: Option<usize>,
        n_neighbors: usize,
        alpha: f64,
        reg_tol: f64,
        kernel: &str,
        gamma: Option<f64>,
        degree: u32,
        coef0: f64,
    ) -> PyResult<Self> {
        let mut kernel_config = KernelConfig::new(Kernel::from_name(kernel)?)
            .with_degree(degree)
            .with_coef0(coef0);
        kernel_config.gamma = gamma;
        Ok(Self {
            inner: KernelDmlmj::new(build_config(num_dims, n_neighbors, alpha, reg_tol), kernel_config),
        })
    }

    /// Fit from samples (or the Gram matrix when kernel="precomputed") and labels
    fn fit<'py>(
        mut slf: PyRefMut<'py, Self>,
        x: PyReadonlyArray2<'py, f64>,
        y: Vec<usize>,
    ) -> PyResult<PyRefMut<'py, Self>> {
        slf.inner.fit(x.as_array(), &y)?;
        Ok(slf)
    }

    /// Learned projection, shape (num_dims, n_samples)
    fn transformer<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyArray2<f64>>> {
        Ok(self.inner.transformer()?.clone().into_pyarray_bound(py))
    }

    fn metadata<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        metadata_dict(py, self.inner.metadata()?)
    }

    fn transform<'py>(&self, py: Python<'py>, x: PyReadonlyArray2<'py, f64>) -> PyResult<Bound<'py, PyArray2<f64>>> {
        Ok(self.inner.transform(x.as_array())?.into_pyarray_bound(py))
    }
}
