use ndarray::{Array1, ArrayView1, Zip};
use serde::{Deserialize, Serialize};

/// A weight distribution with a mean vector and a diagonal covariance.
///
/// Confidence weighted algorithms keep one of these and only differ in how they
/// pick the step sizes of each update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(super) struct Gaussian {
    pub mean: Array1<f64>,
    pub cov: Array1<f64>,
}

impl Gaussian {
    pub fn new(dim: usize) -> Self {
        Self {
            mean: Array1::zeros(dim),
            cov: Array1::ones(dim),
        }
    }

    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    /// Signed margin `y * <mean, x>`.
    pub fn margin(&self, x: ArrayView1<'_, f64>, y: f64) -> f64 {
        y * self.mean.dot(&x)
    }

    /// Variance of the margin, `x^T Σ x`.
    pub fn variance(&self, x: ArrayView1<'_, f64>) -> f64 {
        Zip::from(&self.cov)
            .and(&x)
            .fold(0.0, |acc, &s, &xi| acc + s * xi * xi)
    }

    /// Moves the mean by `alpha * y * Σ x`.
    pub fn shift(&mut self, x: ArrayView1<'_, f64>, y: f64, alpha: f64) {
        Zip::from(&mut self.mean)
            .and(&self.cov)
            .and(&x)
            .for_each(|m, &s, &xi| *m += alpha * y * s * xi);
    }

    /// Shrinks the covariance by `beta * (Σ x)^2`, the diagonal of `β Σ x x^T Σ`.
    pub fn shrink(&mut self, x: ArrayView1<'_, f64>, beta: f64) {
        Zip::from(&mut self.cov)
            .and(&x)
            .for_each(|s, &xi| *s -= beta * (*s * xi) * (*s * xi));
    }
}
