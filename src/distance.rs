//! Pairwise distance matrices over a dataset.
//!
//! Rows are computed independently on the rayon pool and written into
//! disjoint rows of the output, so no ordering or locking is needed.

use ndarray::{Array2, ArrayView2};
use rayon::prelude::*;

use crate::metrics::{Metric, MetricResult};
use crate::numerical::clamp_squared_distance;

/// Compute the n×n distance matrix between the rows of `data`.
pub fn pairwise_distances(data: &ArrayView2<'_, f64>, metric: Metric) -> MetricResult<Array2<f64>> {
    let n = data.nrows();
    let rows: Vec<Vec<f64>> = data.rows().into_iter().map(|row| row.to_vec()).collect();

    let dists: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|i| -> MetricResult<Vec<f64>> {
            let mut row = vec![0.0; n];
            for j in 0..n {
                if i != j {
                    row[j] = metric.distance(&rows[i], &rows[j])?;
                }
            }
            Ok(row)
        })
        .collect::<MetricResult<Vec<Vec<f64>>>>()?;

    let mut distances = Array2::zeros((n, n));
    for (i, row) in dists.into_iter().enumerate() {
        for (j, d) in row.into_iter().enumerate() {
            distances[[i, j]] = d;
        }
    }

    Ok(distances)
}

/// Distances in the feature space induced by a Gram matrix:
/// `d(i, j) = sqrt(K[i,i] + K[j,j] - 2 K[i,j])`.
///
/// `gram` must be square; callers validate the shape.
pub fn pairwise_distances_from_gram(gram: &ArrayView2<'_, f64>) -> Array2<f64> {
    let n = gram.nrows();
    let diagonal: Vec<f64> = gram.diag().to_vec();

    let dists: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|i| {
            (0..n)
                .map(|j| {
                    if i == j {
                        0.0
                    } else {
                        let sq = diagonal[i] + diagonal[j] - 2.0 * gram[[i, j]];
                        clamp_squared_distance(sq).sqrt()
                    }
                })
                .collect()
        })
        .collect();

    let mut distances = Array2::zeros((n, n));
    for (i, row) in dists.into_iter().enumerate() {
        for (j, d) in row.into_iter().enumerate() {
            distances[[i, j]] = d;
        }
    }
    distances
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_pairwise_euclidean() {
        let x = array![[0.0, 0.0], [3.0, 4.0], [6.0, 8.0]];
        let d = pairwise_distances(&x.view(), Metric::Euclidean).unwrap();
        assert_relative_eq!(d[[0, 1]], 5.0);
        assert_relative_eq!(d[[0, 2]], 10.0);
        assert_relative_eq!(d[[2, 1]], 5.0);
        for i in 0..3 {
            assert_eq!(d[[i, i]], 0.0);
            for j in 0..3 {
                assert_relative_eq!(d[[i, j]], d[[j, i]]);
            }
        }
    }

    #[test]
    fn test_pairwise_manhattan() {
        let x = array![[0.0, 0.0], [1.0, 2.0]];
        let d = pairwise_distances(&x.view(), Metric::Manhattan).unwrap();
        assert_relative_eq!(d[[0, 1]], 3.0);
    }

    #[test]
    fn test_gram_distances_match_euclidean_for_linear_kernel() {
        let x = array![[1.0, 2.0], [-1.0, 0.5], [3.0, -2.0], [0.0, 0.0]];
        let gram = x.dot(&x.t());
        let from_gram = pairwise_distances_from_gram(&gram.view());
        let direct = pairwise_distances(&x.view(), Metric::Euclidean).unwrap();
        for i in 0..4 {
            for j in 0..4 {
                assert_relative_eq!(from_gram[[i, j]], direct[[i, j]], epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_gram_distances_clamp_negative_rounding() {
        // K[0,1] slightly above the diagonal mean yields a tiny negative squared distance
        let gram = array![[1.0, 1.0 + 1e-15], [1.0 + 1e-15, 1.0]];
        let d = pairwise_distances_from_gram(&gram.view());
        assert_eq!(d[[0, 1]], 0.0);
    }
}
