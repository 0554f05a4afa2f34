use ndarray::{Array1, ArrayView1, Zip};
use serde::{Deserialize, Serialize};

use super::positive;
use crate::{Learner, MlError, Result};

/// AdaGrad with Regularized Dual Averaging over the hinge loss.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdagradRda {
    eta: f64,
    lambda: f64,
    steps: u64,
    grad_sum: Array1<f64>,
    grad_sq_sum: Array1<f64>,
    weights: Array1<f64>,
}

impl AdagradRda {
    /// Creates an untrained AdaGrad-RDA model.
    ///
    /// # Args
    /// * `dim` - The feature dimension.
    /// * `eta` - The learning rate.
    /// * `lambda` - The l1 regularization strength, coordinates whose average
    ///   gradient stays below it are kept at zero.
    ///
    /// # Errors
    /// Returns `MlError::InvalidHyperParam` if `eta` is not positive or `lambda` is negative.
    pub fn new(dim: usize, eta: f64, lambda: f64) -> Result<Self> {
        if !(lambda >= 0.0 && lambda.is_finite()) {
            return Err(MlError::InvalidHyperParam {
                name: "lambda",
                reason: "must be a finite non negative number",
            });
        }

        Ok(Self {
            eta: positive("eta", eta)?,
            lambda,
            steps: 0,
            grad_sum: Array1::zeros(dim),
            grad_sq_sum: Array1::zeros(dim),
            weights: Array1::zeros(dim),
        })
    }
}

impl Learner for AdagradRda {
    fn dim(&self) -> usize {
        self.weights.len()
    }

    fn weights(&self) -> ArrayView1<'_, f64> {
        self.weights.view()
    }

    fn learn(&mut self, x: ArrayView1<'_, f64>, y: f64) {
        self.steps += 1;

        if y * self.weights.dot(&x) < 1.0 {
            // The hinge loss subgradient is -y x.
            Zip::from(&mut self.grad_sum)
                .and(&mut self.grad_sq_sum)
                .and(&x)
                .for_each(|g, h, &xi| {
                    *g -= y * xi;
                    *h += xi * xi;
                });
        }

        let t = self.steps as f64;
        let (eta, lambda) = (self.eta, self.lambda);

        Zip::from(&mut self.weights)
            .and(&self.grad_sum)
            .and(&self.grad_sq_sum)
            .for_each(|w, &g, &h| {
                let avg = g / t;
                *w = if h == 0.0 || avg.abs() <= lambda {
                    0.0
                } else {
                    -avg.signum() * eta * t / h.sqrt() * (avg.abs() - lambda)
                };
            });
    }
}
