//! Ordering of generalized eigenpairs by their Jeffrey divergence contribution.
//!
//! For a direction with eigenvalue λ the divergence term is proportional to
//! `λ + 1/λ`, which is symmetric under `λ ↔ 1/λ`: a direction where the
//! heterogeneous differences dominate and one where the homogeneous ones
//! dominate by the same ratio separate the classes equally well.

use ndarray::{Array1, Array2};

use crate::eigen::GeneralizedEigen;

/// Divergence contribution of an eigenvalue, on its absolute value.
#[inline]
pub fn score(lambda: f64) -> f64 {
    let a = lambda.abs();
    a + 1.0 / a
}

/// Eigenpairs reordered by descending [`score`] and truncated.
#[derive(Debug, Clone)]
pub struct RankedEigenpairs {
    /// All |λ| in ranked order (before truncation).
    pub values: Array1<f64>,
    /// Retained eigenvectors as rows, `num_dims × dim`.
    pub vectors: Array2<f64>,
    pub num_dims: usize,
    pub acum_eig: f64,
}

/// Rank eigenpairs and keep the first `num_dims` (clamped to the number of pairs).
///
/// Equal scores keep the solver's ascending eigenvalue order.
pub fn rank_eigenpairs(eig: &GeneralizedEigen, num_dims: usize) -> RankedEigenpairs {
    let total = eig.values.len();
    let num_dims = num_dims.min(total);

    let mut order: Vec<usize> = (0..total).collect();
    order.sort_by(|&a, &b| score(eig.values[b]).total_cmp(&score(eig.values[a])));

    let values: Array1<f64> = order.iter().map(|&i| eig.values[i].abs()).collect();

    let dim = eig.vectors.nrows();
    let mut vectors = Array2::zeros((num_dims, dim));
    for (row, &idx) in order.iter().take(num_dims).enumerate() {
        vectors.row_mut(row).assign(&eig.vectors.column(idx));
    }

    let acum_eig = accumulated_ratio(&values, num_dims);

    RankedEigenpairs {
        values,
        vectors,
        num_dims,
        acum_eig,
    }
}

/// Share of the total ranked eigenvalue mass held by the first `num_dims` values.
pub fn accumulated_ratio(ranked_values: &Array1<f64>, num_dims: usize) -> f64 {
    if num_dims == 0 || ranked_values.is_empty() {
        return 0.0;
    }
    let total: f64 = ranked_values.sum();
    if !(total > 0.0) {
        return 0.0;
    }
    let kept: f64 = ranked_values.iter().take(num_dims).sum();
    (kept / total).clamp(0.0, 1.0)
}
