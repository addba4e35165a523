//! How samples are seen by the shared fitting pipeline.
//!
//! The linear learner works on raw feature rows; the kernel learner works on
//! rows of the Gram matrix. Neighbor search, scatter accumulation and the
//! eigen solve only need the operations below, so both learners run the
//! same code.

use ndarray::{Array2, ArrayView1, ArrayView2};

use crate::distance::{pairwise_distances, pairwise_distances_from_gram};
use crate::error::DmlResult;
use crate::metrics::Metric;

pub trait SampleRepresentation {
    /// Number of samples.
    fn n_samples(&self) -> usize;

    /// Length of each sample row (d for features, n for a Gram matrix).
    fn dim(&self) -> usize;

    /// Row used to build difference vectors.
    fn row(&self, i: usize) -> ArrayView1<'_, f64>;

    /// Full n×n distance matrix used for neighbor search.
    fn distance_matrix(&self) -> DmlResult<Array2<f64>>;
}

/// Raw feature rows compared with a vector metric.
pub struct FeatureRows<'a> {
    data: ArrayView2<'a, f64>,
    metric: Metric,
}

impl<'a> FeatureRows<'a> {
    pub fn new(data: ArrayView2<'a, f64>, metric: Metric) -> Self {
        Self { data, metric }
    }
}

impl SampleRepresentation for FeatureRows<'_> {
    fn n_samples(&self) -> usize {
        self.data.nrows()
    }

    fn dim(&self) -> usize {
        self.data.ncols()
    }

    fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.data.row(i)
    }

    fn distance_matrix(&self) -> DmlResult<Array2<f64>> {
        Ok(pairwise_distances(&self.data, self.metric)?)
    }
}

/// Rows of a square Gram matrix; distances come from the kernel trick.
pub struct GramRows<'a> {
    gram: ArrayView2<'a, f64>,
}

impl<'a> GramRows<'a> {
    pub fn new(gram: ArrayView2<'a, f64>) -> Self {
        Self { gram }
    }
}

impl SampleRepresentation for GramRows<'_> {
    fn n_samples(&self) -> usize {
        self.gram.nrows()
    }

    fn dim(&self) -> usize {
        self.gram.ncols()
    }

    fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.gram.row(i)
    }

    fn distance_matrix(&self) -> DmlResult<Array2<f64>> {
        Ok(pairwise_distances_from_gram(&self.gram))
    }
}
