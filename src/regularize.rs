//! Shrinkage of near-singular scatter matrices toward the identity.

use log::debug;
use ndarray::Array2;
use ndarray_linalg::Determinant;

use crate::error::{DmlError, DmlResult};

/// Blend weight and determinant threshold for regularization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Regularizer {
    pub alpha: f64,
    pub tol: f64,
}

impl Regularizer {
    pub fn new(alpha: f64, tol: f64) -> DmlResult<Self> {
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(DmlError::InvalidParameter {
                name: "alpha",
                message: format!("must lie in (0, 1), got {}", alpha),
            });
        }
        if !(tol > 0.0) || !tol.is_finite() {
            return Err(DmlError::InvalidParameter {
                name: "reg_tol",
                message: format!("must be a positive finite number, got {}", tol),
            });
        }
        Ok(Self { alpha, tol })
    }

    /// `|det(m)| < tol`, evaluated on the log scale so large matrices with
    /// tiny eigenvalues do not underflow.
    pub fn is_near_singular(&self, m: &Array2<f64>) -> DmlResult<bool> {
        if m.is_empty() {
            return Ok(true);
        }
        let (sign, ln_abs_det) = m.sln_det()?;
        Ok(sign == 0.0 || ln_abs_det < self.tol.ln())
    }

    /// Return `(1 − α)·m + α·I` if `m` is near-singular, otherwise `m` unchanged.
    pub fn apply(&self, m: Array2<f64>, name: &str) -> DmlResult<Array2<f64>> {
        if !self.is_near_singular(&m)? {
            return Ok(m);
        }
        Ok(self.shrink(m, name))
    }

    /// Unconditional `(1 − α)·m + α·I`.
    ///
    /// Eigenvalues of a PSD `m` end up at least α, so the result always
    /// admits a Cholesky factorization.
    pub fn shrink(&self, m: Array2<f64>, name: &str) -> Array2<f64> {
        debug!(
            "regularizing {} ({}x{}) with alpha={}",
            name,
            m.nrows(),
            m.ncols(),
            self.alpha
        );
        let n = m.nrows();
        m * (1.0 - self.alpha) + Array2::<f64>::eye(n) * self.alpha
    }
}
