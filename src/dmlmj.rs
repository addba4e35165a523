//! Distance Metric Learning through the Maximization of the Jeffrey divergence (DMLMJ).
//!
//! DMLMJ learns a linear map `L` that maximizes the Jeffrey divergence between
//! two zero-mean Gaussians: one fit to the differences between each sample
//! and its nearest same-class neighbors (scatter `S`), one fit to the
//! differences with its nearest different-class neighbors (scatter `D`).
//! The maximizers are the generalized eigenvectors of `D v = λ S v`, ranked
//! by `λ + 1/λ`.
//!
//! # Algorithm
//!
//! ```text
//! 1. For every sample find the k nearest homogeneous and heterogeneous neighbors
//! 2. Accumulate S and D from the neighbor difference vectors, divided by n·k
//! 3. Shrink S or D toward I when |det| < reg_tol
//! 4. Solve D v = λ S v
//! 5. Sort eigenpairs by |λ| + 1/|λ|, keep the first num_dims as rows of L
//! ```
//!
//! # Example
//!
//! ```ignore
//! use dmlmj::{Dmlmj, DmlmjConfig, MetricLearner};
//! use ndarray::array;
//!
//! let x = array![[0.0, 0.0], [0.1, 3.0], [1.0, 0.2], [1.1, 2.9]];
//! let y = [0, 0, 1, 1];
//!
//! let mut model = Dmlmj::new(DmlmjConfig::default().with_num_dims(1).with_n_neighbors(1));
//! model.fit(x.view(), &y)?;
//! let projected = model.transform(x.view())?;
//! ```
//!
//! # References
//!
//! - Nguyen, Morell, De Baets (2017). "Supervised distance metric learning
//!   through maximization of the Jeffrey divergence". Pattern Recognition 64.

use log::debug;
use ndarray::{Array1, Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::eigen::solve_generalized;
use crate::error::{DmlError, DmlResult};
use crate::metrics::Metric;
use crate::neighbors::find_neighbors;
use crate::numerical::{validate_training_set, DEFAULT_ALPHA, DEFAULT_N_NEIGHBORS, DEFAULT_REG_TOL};
use crate::ranking::rank_eigenpairs;
use crate::regularize::Regularizer;
use crate::representation::{FeatureRows, SampleRepresentation};
use crate::scatter::{build_scatter_matrices, ScatterMatrices};
use crate::traits::{Metadata, MetricLearner};

/// Hyperparameters shared by the linear and kernel learners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DmlmjConfig {
    /// Output dimension. `None` keeps the full dimension.
    pub num_dims: Option<usize>,
    /// Neighbors per sample used to build the difference spaces.
    pub n_neighbors: usize,
    /// Regularization blend weight toward the identity.
    pub alpha: f64,
    /// Determinant threshold below which a scatter matrix is regularized.
    pub reg_tol: f64,
    /// Metric used for neighbor search in feature space.
    pub metric: Metric,
}

impl Default for DmlmjConfig {
    fn default() -> Self {
        Self {
            num_dims: None,
            n_neighbors: DEFAULT_N_NEIGHBORS,
            alpha: DEFAULT_ALPHA,
            reg_tol: DEFAULT_REG_TOL,
            metric: Metric::Euclidean,
        }
    }
}

impl DmlmjConfig {
    pub fn with_num_dims(mut self, num_dims: usize) -> Self {
        self.num_dims = Some(num_dims);
        self
    }

    pub fn with_n_neighbors(mut self, n_neighbors: usize) -> Self {
        self.n_neighbors = n_neighbors;
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_reg_tol(mut self, reg_tol: f64) -> Self {
        self.reg_tol = reg_tol;
        self
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// Check ranges and build the regularizer.
    pub fn validate(&self) -> DmlResult<Regularizer> {
        if self.n_neighbors == 0 {
            return Err(DmlError::InvalidParameter {
                name: "n_neighbors",
                message: "must be at least 1".to_string(),
            });
        }
        if self.num_dims == Some(0) {
            return Err(DmlError::InvalidParameter {
                name: "num_dims",
                message: "must be at least 1".to_string(),
            });
        }
        if let Metric::Minkowski(p) = self.metric {
            if !p.is_finite() || p <= 0.0 {
                return Err(DmlError::InvalidParameter {
                    name: "metric",
                    message: format!("Minkowski p must be a positive finite number, got {}", p),
                });
            }
        }
        Regularizer::new(self.alpha, self.reg_tol)
    }
}

/// Everything `fit` produces. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedProjection {
    /// `num_dims × dim` projection, one eigenvector per row.
    pub transformer: Array2<f64>,
    /// All |λ| in ranked order.
    pub eigenvalues: Array1<f64>,
    pub metadata: Metadata,
    /// Neighbor slots that could not be filled.
    pub missing_neighbors: usize,
}

/// Run the full pipeline on any sample representation.
pub(crate) fn fit_representation<R: SampleRepresentation + ?Sized>(
    rep: &R,
    y: &[usize],
    config: &DmlmjConfig,
    regularizer: &Regularizer,
) -> DmlResult<FittedProjection> {
    let dim = rep.dim();
    let num_dims = config.num_dims.map_or(dim, |nd| nd.min(dim));

    let tables = find_neighbors(rep, y, config.n_neighbors)?;
    let ScatterMatrices { within, between } = build_scatter_matrices(rep, &tables);

    let within = regularizer.apply(within, "homogeneous scatter")?;
    let between = regularizer.apply(between, "heterogeneous scatter")?;

    // Large-scale data can pass the determinant test and still fail to
    // factorize; retry once on a shrunk S.
    let eig = match solve_generalized(&between, &within) {
        Ok(eig) => eig,
        Err(DmlError::Linalg(msg)) => {
            debug!("generalized eigen solve failed ({}), retrying with shrunk scatter", msg);
            let within = regularizer.shrink(within, "homogeneous scatter");
            solve_generalized(&between, &within)?
        }
        Err(err) => return Err(err),
    };
    let ranked = rank_eigenpairs(&eig, num_dims);

    debug!(
        "fitted projection {}x{} from {} samples, acum_eig={:.4}",
        ranked.num_dims,
        dim,
        rep.n_samples(),
        ranked.acum_eig
    );

    Ok(FittedProjection {
        transformer: ranked.vectors,
        eigenvalues: ranked.values,
        metadata: Metadata {
            acum_eig: ranked.acum_eig,
            num_dims: ranked.num_dims,
        },
        missing_neighbors: tables.missing(),
    })
}

/// Linear DMLMJ on raw feature vectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dmlmj {
    config: DmlmjConfig,
    fitted: Option<FittedProjection>,
}

impl Default for Dmlmj {
    fn default() -> Self {
        Self::new(DmlmjConfig::default())
    }
}

impl Dmlmj {
    pub fn new(config: DmlmjConfig) -> Self {
        Self { config, fitted: None }
    }

    pub fn config(&self) -> &DmlmjConfig {
        &self.config
    }

    fn fitted(&self) -> DmlResult<&FittedProjection> {
        self.fitted.as_ref().ok_or(DmlError::NotFitted)
    }

    /// All |λ| in ranked order, including the discarded ones.
    pub fn eigenvalues(&self) -> DmlResult<&Array1<f64>> {
        Ok(&self.fitted()?.eigenvalues)
    }

    /// Neighbor slots left empty during the last fit.
    pub fn missing_neighbors(&self) -> DmlResult<usize> {
        Ok(self.fitted()?.missing_neighbors)
    }

    /// Mahalanobis matrix `M = Lᵀ L` of the learned distance.
    pub fn metric(&self) -> DmlResult<Array2<f64>> {
        let l = &self.fitted()?.transformer;
        Ok(l.t().dot(l))
    }

    pub fn to_bytes(&self) -> DmlResult<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> DmlResult<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

impl MetricLearner for Dmlmj {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[usize]) -> DmlResult<&mut Self> {
        self.fitted = None;
        let regularizer = self.config.validate()?;
        validate_training_set(&x, y)?;

        let rep = FeatureRows::new(x, self.config.metric);
        self.fitted = Some(fit_representation(&rep, y, &self.config, &regularizer)?);
        Ok(self)
    }

    fn transformer(&self) -> DmlResult<&Array2<f64>> {
        Ok(&self.fitted()?.transformer)
    }

    fn metadata(&self) -> DmlResult<Metadata> {
        Ok(self.fitted()?.metadata)
    }

    fn transform(&self, x: ArrayView2<'_, f64>) -> DmlResult<Array2<f64>> {
        let l = &self.fitted()?.transformer;
        if x.ncols() != l.ncols() {
            return Err(DmlError::ShapeMismatch {
                what: "feature columns",
                expected: l.ncols(),
                found: x.ncols(),
            });
        }
        Ok(x.dot(&l.t()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Axis};
    use rand::prelude::*;
    use rand_distr::Normal;

    /// Two classes separated along x, with large noise along y.
    fn anisotropic_blobs(n_per_class: usize, seed: u64) -> (Array2<f64>, Vec<usize>) {
        let mut rng = StdRng::seed_from_u64(seed);
        let x_noise = Normal::new(0.0, 0.2).unwrap();
        let y_noise = Normal::new(0.0, 60.0).unwrap();
        let mut data = Array2::zeros((2 * n_per_class, 2));
        let mut labels = Vec::with_capacity(2 * n_per_class);
        for class in 0..2 {
            let cx = class as f64;
            for i in 0..n_per_class {
                let row = class * n_per_class + i;
                data[[row, 0]] = cx + x_noise.sample(&mut rng);
                data[[row, 1]] = y_noise.sample(&mut rng);
                labels.push(class);
            }
        }
        (data, labels)
    }

    /// Leave-one-out 1-NN accuracy under Euclidean distance.
    fn loo_accuracy(data: &Array2<f64>, labels: &[usize]) -> f64 {
        let n = data.nrows();
        let mut correct = 0;
        for i in 0..n {
            let mut best = (f64::INFINITY, usize::MAX);
            for j in 0..n {
                if i == j {
                    continue;
                }
                let diff = &data.row(i) - &data.row(j);
                let d = diff.dot(&diff);
                if d < best.0 {
                    best = (d, j);
                }
            }
            if labels[best.1] == labels[i] {
                correct += 1;
            }
        }
        correct as f64 / n as f64
    }

    #[test]
    fn test_unfitted_access_is_error() {
        let model = Dmlmj::default();
        assert_eq!(model.transformer().unwrap_err(), DmlError::NotFitted);
        assert_eq!(model.metadata().unwrap_err(), DmlError::NotFitted);
        assert!(model.transform(array![[1.0, 2.0]].view()).is_err());
        assert!(!model.is_fitted());
    }

    #[test]
    fn test_blobs_align_with_separating_axis() {
        let (data, labels) = anisotropic_blobs(50, 7);
        let mut model = Dmlmj::new(DmlmjConfig::default().with_n_neighbors(3).with_num_dims(1));
        model.fit(data.view(), &labels).unwrap();

        let l = model.transformer().unwrap();
        assert_eq!(l.dim(), (1, 2));
        let row = l.row(0);
        let cos = row[0].abs() / row.dot(&row).sqrt();
        assert!(cos > 0.95, "first direction should follow the x axis, got {:?}", row);

        let projected = model.transform(data.view()).unwrap();
        let raw_acc = loo_accuracy(&data, &labels);
        let proj_acc = loo_accuracy(&projected, &labels);
        assert!(
            proj_acc > raw_acc,
            "projected accuracy {} should beat raw accuracy {}",
            proj_acc,
            raw_acc
        );
    }

    #[test]
    fn test_transformer_shape_clamped() {
        let (data, labels) = anisotropic_blobs(10, 1);
        for requested in [1, 2, 5] {
            let mut model = Dmlmj::new(DmlmjConfig::default().with_num_dims(requested));
            model.fit(data.view(), &labels).unwrap();
            assert_eq!(model.transformer().unwrap().dim(), (requested.min(2), 2));
            assert_eq!(model.metadata().unwrap().num_dims, requested.min(2));
        }
        let mut model = Dmlmj::default();
        model.fit(data.view(), &labels).unwrap();
        assert_eq!(model.transformer().unwrap().dim(), (2, 2));
        assert_relative_eq!(model.metadata().unwrap().acum_eig, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_acum_eig_monotone_in_num_dims() {
        let mut rng = StdRng::seed_from_u64(3);
        let normal = Normal::new(0.0, 1.0).unwrap();
        let data = Array2::from_shape_fn((40, 4), |(i, j)| {
            normal.sample(&mut rng) + if j == 0 { (i % 2) as f64 * 2.0 } else { 0.0 }
        });
        let labels: Vec<usize> = (0..40).map(|i| i % 2).collect();

        let mut prev = 0.0;
        for nd in 1..=4 {
            let mut model = Dmlmj::new(DmlmjConfig::default().with_num_dims(nd));
            model.fit(data.view(), &labels).unwrap();
            let acum = model.metadata().unwrap().acum_eig;
            assert!((0.0..=1.0).contains(&acum));
            assert!(acum + 1e-12 >= prev);
            prev = acum;
        }
    }

    #[test]
    fn test_singleton_class_fits() {
        let x = array![[0.0, 0.0], [1.0, 0.5], [0.5, 1.0], [1.5, 1.5], [6.0, 6.0]];
        let y = [0, 0, 0, 0, 1];
        let mut model = Dmlmj::default();
        model.fit(x.view(), &y).unwrap();
        assert!(model.transformer().unwrap().iter().all(|v| v.is_finite()));
        // hom: the lone class 1 sample leaves 3 slots empty
        // het: each class 0 sample has one candidate, leaving 4 × 2 empty
        assert_eq!(model.missing_neighbors().unwrap(), 3 + 8);
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let x = array![[0.0, 1.0], [1.0, 0.0], [2.0, 2.0]];
        let mut model = Dmlmj::default();
        assert_eq!(
            model.fit(x.view(), &[0, 0, 0]).unwrap_err(),
            DmlError::TooFewClasses { found: 1 }
        );
        assert!(matches!(
            model.fit(x.view(), &[0, 1]).unwrap_err(),
            DmlError::ShapeMismatch { .. }
        ));
        let bad = array![[0.0, f64::NAN], [1.0, 0.0]];
        assert_eq!(model.fit(bad.view(), &[0, 1]).unwrap_err(), DmlError::NonFiniteInput);

        let mut model = Dmlmj::new(DmlmjConfig::default().with_n_neighbors(0));
        assert!(matches!(
            model.fit(x.view(), &[0, 1, 1]).unwrap_err(),
            DmlError::InvalidParameter { name: "n_neighbors", .. }
        ));
        let mut model = Dmlmj::new(DmlmjConfig::default().with_alpha(1.5));
        assert!(model.fit(x.view(), &[0, 1, 1]).is_err());
    }

    #[test]
    fn test_invalid_minkowski_exponent_rejected() {
        let x = array![[0.0, 1.0], [1.0, 0.0], [2.0, 2.0]];
        for p in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let mut model = Dmlmj::new(DmlmjConfig::default().with_metric(Metric::Minkowski(p)));
            assert!(matches!(
                model.fit(x.view(), &[0, 1, 1]).unwrap_err(),
                DmlError::InvalidParameter { name: "metric", .. }
            ));
        }
        let mut model = Dmlmj::new(DmlmjConfig::default().with_metric(Metric::Minkowski(3.0)));
        assert!(model.fit(x.view(), &[0, 1, 1]).is_ok());
    }

    #[test]
    fn test_collinear_features_at_large_scale() {
        let mut rng = StdRng::seed_from_u64(9);
        let normal = Normal::new(0.0, 1.0).unwrap();
        let n = 40;
        let mut data = Array2::zeros((n, 3));
        let mut labels = Vec::with_capacity(n);
        for i in 0..n {
            let class = i % 2;
            let a = 1e4 * (normal.sample(&mut rng) + 3.0 * class as f64);
            let b = 1e4 * normal.sample(&mut rng);
            data[[i, 0]] = a;
            data[[i, 1]] = b;
            data[[i, 2]] = 0.7 * a - 1.3 * b;
            labels.push(class);
        }

        let mut model = Dmlmj::default();
        model.fit(data.view(), &labels).unwrap();
        assert_eq!(model.transformer().unwrap().dim(), (3, 3));
        assert!(model.transformer().unwrap().iter().all(|v| v.is_finite()));
        assert!(model.eigenvalues().unwrap().iter().all(|v| v.is_finite()));
        let acum = model.metadata().unwrap().acum_eig;
        assert!((0.0..=1.0).contains(&acum));
    }

    #[test]
    fn test_distance_accepts_unrelated_views() {
        let (data, labels) = anisotropic_blobs(10, 8);
        let mut model = Dmlmj::default();
        model.fit(data.view(), &labels).unwrap();

        let query = array![0.5, 1.0];
        let d = {
            let local = array![0.5, 1.0];
            model.distance(query.view(), local.view()).unwrap()
        };
        assert_relative_eq!(d, 0.0);
        let d = model.distance(data.row(0), query.view()).unwrap();
        assert!(d > 0.0);
    }

    #[test]
    fn test_refit_discards_previous_state() {
        let (data, labels) = anisotropic_blobs(10, 2);
        let mut model = Dmlmj::new(DmlmjConfig::default().with_num_dims(1));
        model.fit(data.view(), &labels).unwrap();
        let first = model.transformer().unwrap().clone();

        let three_d = ndarray::concatenate(Axis(1), &[data.view(), data.column(0).insert_axis(Axis(1))]).unwrap();
        model.fit(three_d.view(), &labels).unwrap();
        assert_eq!(model.transformer().unwrap().ncols(), 3);
        assert_eq!(first.ncols(), 2);

        let bad = array![[0.0, 0.0]];
        assert!(model.fit(bad.view(), &[0]).is_err());
        assert!(!model.is_fitted());
    }

    #[test]
    fn test_metric_and_distance_consistent() {
        let (data, labels) = anisotropic_blobs(15, 4);
        let mut model = Dmlmj::default();
        model.fit(data.view(), &labels).unwrap();

        let m = model.metric().unwrap();
        let a = data.row(0);
        let b = data.row(20);
        let diff = &a - &b;
        let mahalanobis = diff.dot(&m.dot(&diff)).sqrt();
        assert_relative_eq!(model.distance(a, b).unwrap(), mahalanobis, epsilon = 1e-9);
    }

    #[test]
    fn test_rows_are_unit_norm() {
        let (data, labels) = anisotropic_blobs(20, 5);
        let mut model = Dmlmj::default();
        model.fit(data.view(), &labels).unwrap();
        for row in model.transformer().unwrap().rows() {
            assert_relative_eq!(row.dot(&row), 1.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_serialization_roundtrip() {
        let (data, labels) = anisotropic_blobs(10, 6);
        let mut model = Dmlmj::new(DmlmjConfig::default().with_num_dims(1));
        model.fit(data.view(), &labels).unwrap();

        let bytes = model.to_bytes().unwrap();
        let restored = Dmlmj::from_bytes(&bytes).unwrap();
        assert_eq!(restored.transformer().unwrap(), model.transformer().unwrap());
        assert_eq!(restored.metadata().unwrap(), model.metadata().unwrap());
        assert_eq!(restored.config(), model.config());
    }
}
