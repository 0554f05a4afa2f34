use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

use super::positive;
use crate::{Learner, MlError, Result};

/// The step size policy of a passive aggressive model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaVariant {
    /// Unbounded steps, the classic PA.
    Hard,
    /// Steps capped by `c` (PA-I).
    Capped,
    /// Steps softened by `1 / 2c` (PA-II).
    Soft,
}

impl TryFrom<i64> for PaVariant {
    type Error = MlError;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            0 => Ok(PaVariant::Hard),
            1 => Ok(PaVariant::Capped),
            2 => Ok(PaVariant::Soft),
            _ => Err(MlError::InvalidHyperParam {
                name: "variant",
                reason: "must be 0 (PA), 1 (PA-I) or 2 (PA-II)",
            }),
        }
    }
}

/// Passive Aggressive learning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pa {
    c: f64,
    variant: PaVariant,
    weights: Array1<f64>,
}

impl Pa {
    /// Creates an untrained passive aggressive model.
    ///
    /// # Errors
    /// Returns `MlError::InvalidHyperParam` unless `c` is positive.
    pub fn new(dim: usize, c: f64, variant: PaVariant) -> Result<Self> {
        Ok(Self {
            c: positive("c", c)?,
            variant,
            weights: Array1::zeros(dim),
        })
    }
}

impl Learner for Pa {
    fn dim(&self) -> usize {
        self.weights.len()
    }

    fn weights(&self) -> ArrayView1<'_, f64> {
        self.weights.view()
    }

    fn learn(&mut self, x: ArrayView1<'_, f64>, y: f64) {
        let loss = 1.0 - y * self.weights.dot(&x);
        let norm = x.dot(&x);
        if loss <= 0.0 || norm == 0.0 {
            return;
        }

        let tau = match self.variant {
            PaVariant::Hard => loss / norm,
            PaVariant::Capped => (loss / norm).min(self.c),
            PaVariant::Soft => loss / (norm + 1.0 / (2.0 * self.c)),
        };

        self.weights.scaled_add(tau * y, &x);
    }
}
