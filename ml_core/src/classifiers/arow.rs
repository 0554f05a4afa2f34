use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use super::{gaussian::Gaussian, positive};
use crate::{Learner, Result};

/// Adaptive Regularization of Weight vectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arow {
    r: f64,
    weights: Gaussian,
}

impl Arow {
    /// Creates an untrained AROW model.
    ///
    /// # Args
    /// * `dim` - The feature dimension.
    /// * `r` - The regularization trade-off, larger values mean smaller steps.
    ///
    /// # Errors
    /// Returns `MlError::InvalidHyperParam` unless `r` is positive.
    pub fn new(dim: usize, r: f64) -> Result<Self> {
        Ok(Self {
            r: positive("r", r)?,
            weights: Gaussian::new(dim),
        })
    }
}

impl Learner for Arow {
    fn dim(&self) -> usize {
        self.weights.dim()
    }

    fn weights(&self) -> ArrayView1<'_, f64> {
        self.weights.mean.view()
    }

    fn learn(&mut self, x: ArrayView1<'_, f64>, y: f64) {
        let margin = self.weights.margin(x, y);
        if margin >= 1.0 {
            return;
        }

        let variance = self.weights.variance(x);
        let beta = 1.0 / (variance + self.r);
        let alpha = (1.0 - margin) * beta;

        self.weights.shift(x, y, alpha);
        self.weights.shrink(x, beta);
    }
}
