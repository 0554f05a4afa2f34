use ndarray::{ArrayView1, Zip};
use serde::{Deserialize, Serialize};

use super::{gaussian::Gaussian, positive};
use crate::{Learner, Result};

/// Normal Herding.
///
/// The `diagonal` flag picks how the diagonal covariance is updated: `0` keeps
/// the diagonal of the full-matrix update, anything else applies the exact
/// per-coordinate update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Nherd {
    c: f64,
    diagonal: i64,
    weights: Gaussian,
}

impl Nherd {
    /// Creates an untrained NHERD model.
    ///
    /// # Errors
    /// Returns `MlError::InvalidHyperParam` unless `c` is positive.
    pub fn new(dim: usize, c: f64, diagonal: i64) -> Result<Self> {
        Ok(Self {
            c: positive("c", c)?,
            diagonal,
            weights: Gaussian::new(dim),
        })
    }
}

impl Learner for Nherd {
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

        let c = self.c;
        let variance = self.weights.variance(x);
        let alpha = (1.0 - margin) / (variance + 1.0 / c);
        self.weights.shift(x, y, alpha);

        if self.diagonal == 0 {
            let beta = (2.0 * c + c * c * variance) / (1.0 + c * variance).powi(2);
            self.weights.shrink(x, beta);
        } else {
            Zip::from(&mut self.weights.cov)
                .and(&x)
                .for_each(|s, &xi| *s /= (1.0 + c * xi * xi * *s).powi(2));
        }
    }
}
