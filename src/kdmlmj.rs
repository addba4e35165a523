//! Kernelized DMLMJ.
//!
//! Samples are represented by their rows of the Gram matrix `K`, so the
//! scatter matrices are n×n and the learned transformer is `num_dims × n`.
//! A new sample `x` is projected as `A · k(x)`, where `k(x)` holds the kernel
//! values between `x` and every training sample.

use ndarray::{Array1, Array2, ArrayView2};

use crate::dmlmj::{fit_representation, DmlmjConfig, FittedProjection};
use crate::error::{DmlError, DmlResult};
use crate::kernel::KernelConfig;
use crate::numerical::{validate_array, validate_training_set};
use crate::representation::GramRows;
use crate::traits::{Metadata, MetricLearner};

/// DMLMJ in the feature space induced by a kernel.
#[derive(Debug, Clone)]
pub struct KernelDmlmj {
    config: DmlmjConfig,
    kernel: KernelConfig,
    /// Training samples, kept to evaluate kernel vectors of new points.
    /// `None` for a precomputed kernel.
    train: Option<Array2<f64>>,
    fitted: Option<FittedProjection>,
}

impl KernelDmlmj {
    pub fn new(config: DmlmjConfig, kernel: KernelConfig) -> Self {
        Self {
            config,
            kernel,
            train: None,
            fitted: None,
        }
    }

    pub fn config(&self) -> &DmlmjConfig {
        &self.config
    }

    pub fn kernel(&self) -> &KernelConfig {
        &self.kernel
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

    /// Project kernel vectors (one row per sample, one column per training
    /// sample) with the learned transformer.
    pub fn transform_kernel(&self, kernel_rows: ArrayView2<'_, f64>) -> DmlResult<Array2<f64>> {
        let a = &self.fitted()?.transformer;
        if kernel_rows.ncols() != a.ncols() {
            return Err(DmlError::ShapeMismatch {
                what: "kernel vector length",
                expected: a.ncols(),
                found: kernel_rows.ncols(),
            });
        }
        Ok(kernel_rows.dot(&a.t()))
    }
}

impl MetricLearner for KernelDmlmj {
    /// With a precomputed kernel `x` is the n×n Gram matrix of the training set.
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[usize]) -> DmlResult<&mut Self> {
        self.fitted = None;
        self.train = None;
        let regularizer = self.config.validate()?;
        self.kernel.validate()?;
        validate_training_set(&x, y)?;

        let gram = self.kernel.gram_matrix(&x)?;
        validate_array(&gram.view())?;

        let rep = GramRows::new(gram.view());
        let fitted = fit_representation(&rep, y, &self.config, &regularizer)?;

        if !self.kernel.kernel.is_precomputed() {
            self.train = Some(x.to_owned());
        }
        self.fitted = Some(fitted);
        Ok(self)
    }

    fn transformer(&self) -> DmlResult<&Array2<f64>> {
        Ok(&self.fitted()?.transformer)
    }

    fn metadata(&self) -> DmlResult<Metadata> {
        Ok(self.fitted()?.metadata)
    }

    /// With a precomputed kernel `x` must already hold the kernel rows
    /// against the training set.
    fn transform(&self, x: ArrayView2<'_, f64>) -> DmlResult<Array2<f64>> {
        self.fitted()?;
        match &self.train {
            None => self.transform_kernel(x),
            Some(train) => {
                if x.ncols() != train.ncols() {
                    return Err(DmlError::ShapeMismatch {
                        what: "feature columns",
                        expected: train.ncols(),
                        found: x.ncols(),
                    });
                }
                let kernel_rows = self.kernel.cross_kernel(&x, &train.view());
                self.transform_kernel(kernel_rows.view())
            }
        }
    }
}
