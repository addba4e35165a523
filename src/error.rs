use std::fmt;

use crate::metrics::MetricError;

/// Result type returned by the metric learners and their building blocks.
pub type DmlResult<T> = Result<T, DmlError>;

/// Errors that can arise while fitting or querying a metric learner.
#[derive(Debug, Clone, PartialEq)]
pub enum DmlError {
    /// No samples were provided.
    EmptyInput,
    /// Two inputs that must agree in size do not.
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    /// Input contains NaN or infinite values.
    NonFiniteInput,
    /// Fewer than two distinct labels, so no heterogeneous neighbors exist.
    TooFewClasses { found: usize },
    /// A hyperparameter is outside its valid range.
    InvalidParameter {
        name: &'static str,
        message: String,
    },
    /// `transformer`, `metadata` or `transform` called before `fit`.
    NotFitted,
    /// A LAPACK routine failed.
    Linalg(String),
    /// Model (de)serialization failed.
    Serialization(String),
    Metric(MetricError),
}

impl fmt::Display for DmlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DmlError::EmptyInput => write!(f, "empty input provided"),
            DmlError::ShapeMismatch { what, expected, found } => {
                write!(f, "shape mismatch in {}: expected {}, found {}", what, expected, found)
            }
            DmlError::NonFiniteInput => write!(f, "input contains NaN or Inf values"),
            DmlError::TooFewClasses { found } => {
                write!(f, "need at least 2 distinct labels, got {}", found)
            }
            DmlError::InvalidParameter { name, message } => {
                write!(f, "invalid parameter '{}': {}", name, message)
            }
            DmlError::NotFitted => write!(f, "model not fitted. Call fit() first."),
            DmlError::Linalg(msg) => write!(f, "linear algebra failure: {}", msg),
            DmlError::Serialization(msg) => write!(f, "serialization failure: {}", msg),
            DmlError::Metric(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for DmlError {}

impl From<MetricError> for DmlError {
    fn from(err: MetricError) -> Self {
        DmlError::Metric(err)
    }
}

impl From<ndarray_linalg::error::LinalgError> for DmlError {
    fn from(err: ndarray_linalg::error::LinalgError) -> Self {
        DmlError::Linalg(err.to_string())
    }
}

impl From<bincode::Error> for DmlError {
    fn from(err: bincode::Error) -> Self {
        DmlError::Serialization(err.to_string())
    }
}
