//! Scatter matrices of neighbor difference vectors.
//!
//! ```text
//! S = 1/(n·k) Σ_i Σ_{j ∈ hom(i)} (r_i − r_j)(r_i − r_j)ᵀ
//! D = 1/(n·k) Σ_i Σ_{j ∈ het(i)} (r_i − r_j)(r_i − r_j)ᵀ
//! ```
//!
//! The divisor is always `n·k`, even when some neighbor slots are empty.

use ndarray::Array2;

use crate::neighbors::NeighborTables;
use crate::representation::SampleRepresentation;

/// Homogeneous (`within`) and heterogeneous (`between`) scatter matrices.
#[derive(Debug, Clone)]
pub struct ScatterMatrices {
    pub within: Array2<f64>,
    pub between: Array2<f64>,
}

pub fn build_scatter_matrices<R: SampleRepresentation + ?Sized>(
    rep: &R,
    tables: &NeighborTables,
) -> ScatterMatrices {
    let n = rep.n_samples();
    let divisor = (n * tables.k()) as f64;

    let within = scatter_of(rep, |i| tables.hom_of(i).collect()) / divisor;
    let between = scatter_of(rep, |i| tables.het_of(i).collect()) / divisor;

    ScatterMatrices { within, between }
}

/// Unnormalised sum of outer products over the given neighbor lists,
/// computed as `Δᵀ Δ` with one difference vector per row of `Δ`.
fn scatter_of<R, F>(rep: &R, neighbors_of: F) -> Array2<f64>
where
    R: SampleRepresentation + ?Sized,
    F: Fn(usize) -> Vec<usize>,
{
    let pairs: Vec<(usize, usize)> = (0..rep.n_samples())
        .flat_map(|i| neighbors_of(i).into_iter().map(move |j| (i, j)))
        .collect();

    let mut diffs: Array2<f64> = Array2::zeros((pairs.len(), rep.dim()));
    for (mut row, &(i, j)) in diffs.rows_mut().into_iter().zip(pairs.iter()) {
        row.assign(&(&rep.row(i) - &rep.row(j)));
    }

    let scatter = diffs.t().dot(&diffs);
    // gemm does not guarantee bitwise symmetry
    (&scatter + &scatter.t()) * 0.5
}
