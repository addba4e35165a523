use std::fmt;

use serde::{Deserialize, Serialize};

/// Result type returned by metric helpers.
pub type MetricResult<T> = Result<T, MetricError>;

/// Errors that can arise while evaluating a metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricError {
    DimensionMismatch { left: usize, right: usize },
}

impl fmt::Display for MetricError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricError::DimensionMismatch { left, right } => {
                write!(f, "vector length mismatch: left={} right={}", left, right)
            }
        }
    }
}

impl std::error::Error for MetricError {}

/// Distance used to pick nearest neighbors in feature space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Metric {
    Euclidean,
    SquaredEuclidean,
    Manhattan,
    Chebyshev,
    Minkowski(f64),
    Cosine,
}

impl Default for Metric {
    fn default() -> Self {
        Metric::Euclidean
    }
}

impl Metric {
    /// Evaluate the metric between two vectors.
    pub fn distance(&self, a: &[f64], b: &[f64]) -> MetricResult<f64> {
        match *self {
            Metric::Euclidean => euclidean(a, b),
            Metric::SquaredEuclidean => squared_euclidean(a, b),
            Metric::Manhattan => manhattan(a, b),
            Metric::Chebyshev => chebyshev(a, b),
            Metric::Minkowski(p) => minkowski(a, b, p),
            Metric::Cosine => cosine(a, b),
        }
    }
}

#[inline]
fn ensure_same_length(a: &[f64], b: &[f64]) -> MetricResult<()> {
    if a.len() != b.len() {
        Err(MetricError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        })
    } else {
        Ok(())
    }
}

/// Squared Euclidean distance
///
/// sum((x_i - y_i)^2)
pub fn squared_euclidean(a: &[f64], b: &[f64]) -> MetricResult<f64> {
    ensure_same_length(a, b)?;
    Ok(a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum())
}

/// Euclidean distance (L2 norm)
///
/// sqrt(sum((x_i - y_i)^2))
pub fn euclidean(a: &[f64], b: &[f64]) -> MetricResult<f64> {
    squared_euclidean(a, b).map(f64::sqrt)
}

/// Manhattan distance (L1 norm)
pub fn manhattan(a: &[f64], b: &[f64]) -> MetricResult<f64> {
    ensure_same_length(a, b)?;
    Ok(a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum())
}

/// Chebyshev distance (L∞ norm or max norm)
pub fn chebyshev(a: &[f64], b: &[f64]) -> MetricResult<f64> {
    ensure_same_length(a, b)?;
    Ok(a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0f64, f64::max))
}

/// Minkowski distance with parameter p
///
/// (sum(|x_i - y_i|^p))^(1/p)
pub fn minkowski(a: &[f64], b: &[f64], p: f64) -> MetricResult<f64> {
    ensure_same_length(a, b)?;

    if p == 1.0 {
        return manhattan(a, b);
    } else if p == 2.0 {
        return euclidean(a, b);
    } else if p == f64::INFINITY {
        return chebyshev(a, b);
    }

    Ok(a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs().powf(p))
        .sum::<f64>()
        .powf(1.0 / p))
}

/// Cosine distance (1 - cosine similarity)
///
/// Returns distance in [0, 2], where 0 means identical direction
pub fn cosine(a: &[f64], b: &[f64]) -> MetricResult<f64> {
    ensure_same_length(a, b)?;

    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    let denom = norm_a * norm_b;
    if denom < 1e-10 {
        Ok(1.0) // Undefined for zero vectors
    } else {
        Ok(1.0 - (dot / denom))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_euclidean_distance() {
        let a = vec![0.0, 0.0, 0.0];
        let b = vec![3.0, 4.0, 0.0];
        assert_relative_eq!(euclidean(&a, &b).unwrap(), 5.0);
        assert_relative_eq!(squared_euclidean(&a, &b).unwrap(), 25.0);
    }

    #[test]
    fn test_euclidean_zero_distance() {
        let a = vec![1.0, 2.0, 3.0];
        assert_relative_eq!(euclidean(&a, &a).unwrap(), 0.0);
    }

    #[test]
    fn test_manhattan_distance() {
        let a = vec![0.0, 0.0];
        let b = vec![1.0, 1.0];
        assert_relative_eq!(manhattan(&a, &b).unwrap(), 2.0);
    }

    #[test]
    fn test_cosine_orthogonal_and_opposite() {
        assert_relative_eq!(cosine(&[1.0, 0.0], &[0.0, 1.0]).unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(cosine(&[1.0, 0.0], &[-1.0, 0.0]).unwrap(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_chebyshev_distance() {
        let a = vec![0.0, 0.0];
        let b = vec![3.0, 4.0];
        assert_relative_eq!(chebyshev(&a, &b).unwrap(), 4.0);
    }

    #[test]
    fn test_minkowski_matches_special_cases() {
        let a = vec![0.0, 0.0];
        let b = vec![3.0, 4.0];
        assert_relative_eq!(minkowski(&a, &b, 1.0).unwrap(), 7.0);
        assert_relative_eq!(minkowski(&a, &b, 2.0).unwrap(), 5.0);
        assert_relative_eq!(
            minkowski(&a, &b, 3.0).unwrap(),
            (27.0f64 + 64.0).powf(1.0 / 3.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_metric_enum_dispatch() {
        let a = [1.0, 1.0];
        let b = [4.0, 5.0];
        assert_relative_eq!(Metric::default().distance(&a, &b).unwrap(), 5.0);
        assert_relative_eq!(Metric::Manhattan.distance(&a, &b).unwrap(), 7.0);
    }

    #[test]
    fn test_dimension_mismatch_error() {
        let a = vec![1.0, 2.0];
        let b = vec![1.0];
        let err = euclidean(&a, &b).unwrap_err();
        assert_eq!(err, MetricError::DimensionMismatch { left: 2, right: 1 });
    }
}
