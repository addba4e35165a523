//! Common surface of the metric learners.

use ndarray::{stack, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{DmlError, DmlResult};

/// Diagnostics of a fitted model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Fraction of the ranked eigenvalue mass kept by the output dimensions.
    pub acum_eig: f64,
    /// Output dimensionality.
    pub num_dims: usize,
}

/// A supervised learner producing a linear map into a space where
/// Euclidean distance reflects class structure.
pub trait MetricLearner {
    /// Fit on samples `x` (one per row) with class labels `y`.
    ///
    /// Any previous fit is discarded.
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[usize]) -> DmlResult<&mut Self>;

    /// Learned projection, one output dimension per row.
    fn transformer(&self) -> DmlResult<&Array2<f64>>;

    fn metadata(&self) -> DmlResult<Metadata>;

    /// Map new samples into the learned space.
    fn transform(&self, x: ArrayView2<'_, f64>) -> DmlResult<Array2<f64>>;

    fn is_fitted(&self) -> bool {
        self.transformer().is_ok()
    }

    /// Euclidean distance between two samples after projection.
    fn distance(&self, a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> DmlResult<f64> {
        if a.len() != b.len() {
            return Err(DmlError::ShapeMismatch {
                what: "query vector",
                expected: a.len(),
                found: b.len(),
            });
        }
        let pair = stack(Axis(0), &[a.view(), b.view()]).map_err(|e| DmlError::Linalg(e.to_string()))?;
        let projected = self.transform(pair.view())?;
        let diff = &projected.row(0) - &projected.row(1);
        Ok(diff.dot(&diff).sqrt())
    }
}
