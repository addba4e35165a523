//! Homogeneous (same-class) and heterogeneous (different-class) neighbor search.

use std::collections::BinaryHeap;

use log::warn;
use ndarray::Array2;
use ordered_float::OrderedFloat;
use rayon::prelude::*;

use crate::error::{DmlError, DmlResult};
use crate::representation::SampleRepresentation;

/// Marks a neighbor slot that could not be filled because the partition had
/// fewer than k members.
pub const NO_NEIGHBOR: usize = usize::MAX;

/// Per-sample neighbor indices, each row sorted by ascending distance.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborTables {
    /// n×k different-class neighbors.
    pub het: Array2<usize>,
    /// n×k same-class neighbors.
    pub hom: Array2<usize>,
    /// Heterogeneous slots left as [`NO_NEIGHBOR`].
    pub missing_het: usize,
    /// Homogeneous slots left as [`NO_NEIGHBOR`].
    pub missing_hom: usize,
}

impl NeighborTables {
    pub fn n_samples(&self) -> usize {
        self.het.nrows()
    }

    /// Requested neighborhood size, including unfilled slots.
    pub fn k(&self) -> usize {
        self.het.ncols()
    }

    /// Valid different-class neighbors of sample `i`.
    pub fn het_of(&self, i: usize) -> impl Iterator<Item = usize> + '_ {
        self.het.row(i).into_iter().copied().filter(|&j| j != NO_NEIGHBOR)
    }

    /// Valid same-class neighbors of sample `i`.
    pub fn hom_of(&self, i: usize) -> impl Iterator<Item = usize> + '_ {
        self.hom.row(i).into_iter().copied().filter(|&j| j != NO_NEIGHBOR)
    }

    pub fn missing(&self) -> usize {
        self.missing_het + self.missing_hom
    }
}

/// Find the `k` nearest same-class and different-class neighbors of every sample.
pub fn find_neighbors<R: SampleRepresentation + ?Sized>(
    rep: &R,
    labels: &[usize],
    k: usize,
) -> DmlResult<NeighborTables> {
    let n = rep.n_samples();
    if labels.len() != n {
        return Err(DmlError::ShapeMismatch {
            what: "labels",
            expected: n,
            found: labels.len(),
        });
    }
    let distances = rep.distance_matrix()?;
    neighbors_from_distances(&distances, labels, k)
}

/// Neighbor search over a precomputed n×n distance matrix.
pub fn neighbors_from_distances(
    distances: &Array2<f64>,
    labels: &[usize],
    k: usize,
) -> DmlResult<NeighborTables> {
    if k == 0 {
        return Err(DmlError::InvalidParameter {
            name: "n_neighbors",
            message: "must be at least 1".to_string(),
        });
    }
    let n = labels.len();
    if distances.nrows() != n || distances.ncols() != n {
        return Err(DmlError::ShapeMismatch {
            what: "distance matrix",
            expected: n,
            found: distances.nrows(),
        });
    }

    let rows: Vec<(Vec<usize>, Vec<usize>)> = (0..n)
        .into_par_iter()
        .map(|i| {
            // Max-heaps keyed on (distance, index): popping drops the farthest,
            // and among equal distances the larger index.
            let mut het: BinaryHeap<(OrderedFloat<f64>, usize)> = BinaryHeap::with_capacity(k + 1);
            let mut hom: BinaryHeap<(OrderedFloat<f64>, usize)> = BinaryHeap::with_capacity(k + 1);

            for j in 0..n {
                if i == j {
                    continue;
                }
                let heap = if labels[j] == labels[i] { &mut hom } else { &mut het };
                heap.push((OrderedFloat(distances[[i, j]]), j));
                if heap.len() > k {
                    heap.pop();
                }
            }

            let sorted = |heap: BinaryHeap<(OrderedFloat<f64>, usize)>| -> Vec<usize> {
                heap.into_sorted_vec().into_iter().map(|(_, j)| j).collect()
            };
            (sorted(het), sorted(hom))
        })
        .collect();

    let mut het = Array2::from_elem((n, k), NO_NEIGHBOR);
    let mut hom = Array2::from_elem((n, k), NO_NEIGHBOR);
    let mut missing_het = 0;
    let mut missing_hom = 0;

    for (i, (het_row, hom_row)) in rows.into_iter().enumerate() {
        missing_het += k - het_row.len();
        missing_hom += k - hom_row.len();
        for (slot, j) in het_row.into_iter().enumerate() {
            het[[i, slot]] = j;
        }
        for (slot, j) in hom_row.into_iter().enumerate() {
            hom[[i, slot]] = j;
        }
    }

    if missing_het > 0 || missing_hom > 0 {
        warn!(
            "n_neighbors={} exceeds available neighbors: {} heterogeneous and {} homogeneous slots left empty",
            k, missing_het, missing_hom
        );
    }

    Ok(NeighborTables {
        het,
        hom,
        missing_het,
        missing_hom,
    })
}
