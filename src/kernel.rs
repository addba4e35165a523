//! Kernel functions and Gram matrices for the kernelized learner.
//!
//! Kernels follow the usual parameterisation:
//!
//! | Kernel | k(x, y) |
//! |--------|---------|
//! | Linear | x·y |
//! | Poly | (γ x·y + c₀)^degree |
//! | Rbf | exp(-γ ‖x − y‖²) |
//! | Sigmoid | tanh(γ x·y + c₀) |
//! | Cosine | x·y / (‖x‖ ‖y‖) |
//!
//! `γ` defaults to `1 / n_features` when not set.

use std::fmt;
use std::sync::Arc;

use ndarray::{Array2, ArrayView2};
use rayon::prelude::*;

use crate::error::{DmlError, DmlResult};
use crate::numerical::{DEFAULT_COEF0, DEFAULT_DEGREE};

/// User supplied kernel. Any extra parameters live in the closure.
pub type KernelFn = Arc<dyn Fn(&[f64], &[f64]) -> f64 + Send + Sync>;

/// Kernel selection.
#[derive(Clone, Default)]
pub enum Kernel {
    #[default]
    Linear,
    Poly,
    Rbf,
    Sigmoid,
    Cosine,
    /// Training input is already an n×n Gram matrix.
    Precomputed,
    Custom(KernelFn),
}

impl fmt::Debug for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kernel::Linear => "Linear",
            Kernel::Poly => "Poly",
            Kernel::Rbf => "Rbf",
            Kernel::Sigmoid => "Sigmoid",
            Kernel::Cosine => "Cosine",
            Kernel::Precomputed => "Precomputed",
            Kernel::Custom(_) => "Custom",
        };
        f.write_str(name)
    }
}

impl Kernel {
    /// Parse the kernel names accepted by the Python bindings.
    pub fn from_name(name: &str) -> DmlResult<Self> {
        match name {
            "linear" => Ok(Kernel::Linear),
            "poly" => Ok(Kernel::Poly),
            "rbf" => Ok(Kernel::Rbf),
            "sigmoid" => Ok(Kernel::Sigmoid),
            "cosine" => Ok(Kernel::Cosine),
            "precomputed" => Ok(Kernel::Precomputed),
            other => Err(DmlError::InvalidParameter {
                name: "kernel",
                message: format!("unknown kernel '{}'", other),
            }),
        }
    }

    pub fn is_precomputed(&self) -> bool {
        matches!(self, Kernel::Precomputed)
    }
}

/// Kernel together with its hyperparameters.
#[derive(Debug, Clone)]
pub struct KernelConfig {
    pub kernel: Kernel,
    /// Coefficient for rbf, poly and sigmoid. `None` means `1 / n_features`.
    pub gamma: Option<f64>,
    pub degree: u32,
    pub coef0: f64,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            kernel: Kernel::Linear,
            gamma: None,
            degree: DEFAULT_DEGREE,
            coef0: DEFAULT_COEF0,
        }
    }
}

impl KernelConfig {
    pub fn new(kernel: Kernel) -> Self {
        Self {
            kernel,
            ..Self::default()
        }
    }

    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = Some(gamma);
        self
    }

    pub fn with_degree(mut self, degree: u32) -> Self {
        self.degree = degree;
        self
    }

    pub fn with_coef0(mut self, coef0: f64) -> Self {
        self.coef0 = coef0;
        self
    }

    pub fn validate(&self) -> DmlResult<()> {
        if let Some(gamma) = self.gamma {
            if !gamma.is_finite() || gamma <= 0.0 {
                return Err(DmlError::InvalidParameter {
                    name: "gamma",
                    message: format!("must be a positive finite number, got {}", gamma),
                });
            }
        }
        if !self.coef0.is_finite() {
            return Err(DmlError::InvalidParameter {
                name: "coef0",
                message: "must be finite".to_string(),
            });
        }
        Ok(())
    }

    fn gamma_for(&self, n_features: usize) -> f64 {
        self.gamma.unwrap_or(1.0 / n_features.max(1) as f64)
    }

    /// Evaluate the kernel between two vectors with an explicit `gamma`.
    pub fn evaluate(&self, a: &[f64], b: &[f64], gamma: f64) -> f64 {
        match &self.kernel {
            Kernel::Linear | Kernel::Precomputed => dot(a, b),
            Kernel::Poly => (gamma * dot(a, b) + self.coef0).powi(self.degree as i32),
            Kernel::Rbf => {
                let d2: f64 = a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum();
                (-gamma * d2).exp()
            }
            Kernel::Sigmoid => (gamma * dot(a, b) + self.coef0).tanh(),
            Kernel::Cosine => {
                let denom = dot(a, a).sqrt() * dot(b, b).sqrt();
                if denom == 0.0 {
                    0.0
                } else {
                    dot(a, b) / denom
                }
            }
            Kernel::Custom(f) => f(a, b),
        }
    }

    /// Gram matrix of the training set.
    ///
    /// For [`Kernel::Precomputed`] the input is checked to be square and
    /// returned as is.
    pub fn gram_matrix(&self, x: &ArrayView2<'_, f64>) -> DmlResult<Array2<f64>> {
        if self.kernel.is_precomputed() {
            if x.nrows() != x.ncols() {
                return Err(DmlError::ShapeMismatch {
                    what: "precomputed gram matrix columns",
                    expected: x.nrows(),
                    found: x.ncols(),
                });
            }
            return Ok(x.to_owned());
        }
        Ok(self.cross_kernel(x, x))
    }

    /// Kernel values between every row of `x` and every row of `reference`,
    /// shape `(x.nrows(), reference.nrows())`.
    pub fn cross_kernel(&self, x: &ArrayView2<'_, f64>, reference: &ArrayView2<'_, f64>) -> Array2<f64> {
        let gamma = self.gamma_for(reference.ncols());
        let rows: Vec<Vec<f64>> = x.rows().into_iter().map(|r| r.to_vec()).collect();
        let refs: Vec<Vec<f64>> = reference.rows().into_iter().map(|r| r.to_vec()).collect();

        let values: Vec<Vec<f64>> = rows
            .par_iter()
            .map(|a| refs.iter().map(|b| self.evaluate(a, b, gamma)).collect())
            .collect();

        let mut out = Array2::zeros((rows.len(), refs.len()));
        for (i, row) in values.into_iter().enumerate() {
            for (j, v) in row.into_iter().enumerate() {
                out[[i, j]] = v;
            }
        }
        out
    }
}

#[inline]
fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
