//! Numerical constants and input checks shared by the metric learners.

use ndarray::ArrayView2;

use crate::error::{DmlError, DmlResult};

/// Default number of homogeneous / heterogeneous neighbors per sample.
pub const DEFAULT_N_NEIGHBORS: usize = 3;

/// Default blend weight toward the identity when regularizing.
pub const DEFAULT_ALPHA: f64 = 1e-3;

/// Default determinant threshold below which a scatter matrix is regularized.
pub const DEFAULT_REG_TOL: f64 = 1e-10;

/// Default polynomial kernel degree.
pub const DEFAULT_DEGREE: u32 = 3;

/// Default independent term of the poly and sigmoid kernels.
pub const DEFAULT_COEF0: f64 = 1.0;

/// Squared distances below zero only appear through rounding.
#[inline]
pub fn clamp_squared_distance(d2: f64) -> f64 {
    d2.max(0.0)
}

/// Validate that an array contains no NaN or Inf values
pub fn validate_array(arr: &ArrayView2<'_, f64>) -> DmlResult<()> {
    if arr.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(DmlError::NonFiniteInput)
    }
}

/// Validate a labelled training set and return the number of distinct labels.
pub fn validate_training_set(x: &ArrayView2<'_, f64>, y: &[usize]) -> DmlResult<usize> {
    let n_samples = x.nrows();
    if n_samples == 0 || x.ncols() == 0 {
        return Err(DmlError::EmptyInput);
    }
    if y.len() != n_samples {
        return Err(DmlError::ShapeMismatch {
            what: "labels",
            expected: n_samples,
            found: y.len(),
        });
    }
    validate_array(x)?;

    let mut classes = y.to_vec();
    classes.sort_unstable();
    classes.dedup();
    if classes.len() < 2 {
        return Err(DmlError::TooFewClasses { found: classes.len() });
    }
    Ok(classes.len())
}
