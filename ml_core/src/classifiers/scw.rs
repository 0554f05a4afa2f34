use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use super::{gaussian::Gaussian, positive};
use crate::{probit::probit, Learner, MlError, Result};

/// Exact Soft Confidence-Weighted learning, first variant (SCW-I).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scw {
    c: f64,
    eta: f64,
    phi: f64,
    weights: Gaussian,
}

impl Scw {
    /// Creates an untrained SCW-I model.
    ///
    /// # Args
    /// * `dim` - The feature dimension.
    /// * `c` - Aggressiveness, the upper bound of every step.
    /// * `eta` - The confidence the margin must reach, strictly between 0.5 and 1.
    ///
    /// # Errors
    /// Returns `MlError::InvalidHyperParam` if `c` is not positive or `eta` is out of range.
    pub fn new(dim: usize, c: f64, eta: f64) -> Result<Self> {
        if !(eta > 0.5 && eta < 1.0) {
            return Err(MlError::InvalidHyperParam {
                name: "eta",
                reason: "must lie strictly between 0.5 and 1",
            });
        }

        Ok(Self {
            c: positive("c", c)?,
            eta,
            phi: probit(eta),
            weights: Gaussian::new(dim),
        })
    }
}

impl Learner for Scw {
    fn dim(&self) -> usize {
        self.weights.dim()
    }

    fn weights(&self) -> ArrayView1<'_, f64> {
        self.weights.mean.view()
    }

    fn learn(&mut self, x: ArrayView1<'_, f64>, y: f64) {
        let phi = self.phi;
        let margin = self.weights.margin(x, y);
        let variance = self.weights.variance(x);

        if variance <= 0.0 || phi * variance.sqrt() - margin <= 0.0 {
            return;
        }

        let psi = 1.0 + phi * phi / 2.0;
        let zeta = 1.0 + phi * phi;

        let root = (margin * margin * phi.powi(4) / 4.0 + variance * phi * phi * zeta).sqrt();
        let alpha = ((-margin * psi + root) / (variance * zeta)).clamp(0.0, self.c);
        if alpha == 0.0 {
            return;
        }

        let avp = alpha * variance * phi;
        let u = 0.25 * (-avp + (avp * avp + 4.0 * variance).sqrt()).powi(2);
        let beta = alpha * phi / (u.sqrt() + avp);

        self.weights.shift(x, y, alpha);
        self.weights.shrink(x, beta);
    }
}
