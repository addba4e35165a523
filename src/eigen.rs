//! Symmetric-definite generalized eigenproblem `D v = λ S v`.
//!
//! ```text
//! S = C Cᵀ            (Cholesky, S must be positive definite)
//! A = C⁻¹ D C⁻ᵀ       (symmetric)
//! A w = λ w           (standard symmetric eigenproblem)
//! v = C⁻ᵀ w
//! ```
//!
//! Eigenvalues come back in ascending order, eigenvectors as columns
//! rescaled to unit Euclidean norm.

use log::debug;
use ndarray::{Array1, Array2, Axis};
use ndarray_linalg::{Cholesky, Eigh, Inverse, UPLO};

use crate::error::{DmlError, DmlResult};

/// Eigenvalues and matching unit-norm eigenvectors (columns).
#[derive(Debug, Clone)]
pub struct GeneralizedEigen {
    pub values: Array1<f64>,
    pub vectors: Array2<f64>,
}

/// Solve `numerator · v = λ · denominator · v`.
pub fn solve_generalized(
    numerator: &Array2<f64>,
    denominator: &Array2<f64>,
) -> DmlResult<GeneralizedEigen> {
    let n = denominator.nrows();
    if denominator.ncols() != n {
        return Err(DmlError::ShapeMismatch {
            what: "denominator columns",
            expected: n,
            found: denominator.ncols(),
        });
    }
    if numerator.dim() != (n, n) {
        return Err(DmlError::ShapeMismatch {
            what: "numerator rows",
            expected: n,
            found: numerator.nrows(),
        });
    }

    let chol = denominator.cholesky(UPLO::Lower)?;
    let chol_inv = chol.inv()?;

    let mut reduced = chol_inv.dot(numerator).dot(&chol_inv.t());
    let transposed = reduced.t().to_owned();
    reduced = (reduced + transposed) * 0.5;

    let (values, w) = reduced.eigh(UPLO::Lower)?;
    let mut vectors = chol_inv.t().dot(&w);
    normalize_columns(&mut vectors);

    debug!("solved {}x{} generalized eigenproblem", n, n);

    Ok(GeneralizedEigen { values, vectors })
}

fn normalize_columns(m: &mut Array2<f64>) {
    for mut col in m.axis_iter_mut(Axis(1)) {
        let norm = col.dot(&col).sqrt();
        if norm > 0.0 {
            col.mapv_inplace(|v| v / norm);
        }
    }
}
