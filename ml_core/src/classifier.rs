use std::path::Path;

use ndarray::ArrayView1;
use serde::{de::DeserializeOwned, Serialize};

use crate::{persist, Label, MlError, Result};

/// The capability set every online binary classifier offers.
///
/// This trait is object safe, the controller holds one `Box<dyn OnlineClassifier>`
/// per enabled algorithm and never needs to know which one it is talking to.
pub trait OnlineClassifier: Send {
    /// Returns the feature dimension the model was built for.
    fn dim(&self) -> usize;

    /// Updates the model with a single labelled example.
    ///
    /// # Errors
    /// Returns `MlError::ShapeMismatch` if `features` doesn't match `dim`.
    fn update(&mut self, features: &[f64], label: Label) -> Result<()>;

    /// Predicts the class of `features`.
    ///
    /// # Errors
    /// Returns `MlError::ShapeMismatch` if `features` doesn't match `dim`.
    fn predict(&self, features: &[f64]) -> Result<Label>;

    /// Serializes the whole model state into `path`.
    fn save(&self, path: &Path) -> Result<()>;

    /// Replaces the model state with the one serialized at `path`.
    ///
    /// # Errors
    /// Returns `MlError::ModelMissing` if there is no model at `path` and
    /// `MlError::ShapeMismatch` if the stored model has another dimension. The
    /// current state is left untouched on failure.
    fn load(&mut self, path: &Path) -> Result<()>;
}

/// A linear model with an algorithm specific update rule.
///
/// Implementing this is enough to get an `OnlineClassifier`, shape checks,
/// prediction and persistence are shared.
pub trait Learner: Serialize + DeserializeOwned + Send {
    fn dim(&self) -> usize;

    /// The current weight vector, the prediction is the sign of its dot product
    /// with the features.
    fn weights(&self) -> ArrayView1<'_, f64>;

    /// Applies one update for `x` with signed label `y` (either `1.0` or `-1.0`).
    fn learn(&mut self, x: ArrayView1<'_, f64>, y: f64);
}

impl<L: Learner> OnlineClassifier for L {
    fn dim(&self) -> usize {
        Learner::dim(self)
    }

    fn update(&mut self, features: &[f64], label: Label) -> Result<()> {
        check_dim(Learner::dim(self), features)?;
        self.learn(ArrayView1::from(features), label.sign());
        Ok(())
    }

    fn predict(&self, features: &[f64]) -> Result<Label> {
        check_dim(Learner::dim(self), features)?;
        let score = self.weights().dot(&ArrayView1::from(features));
        Ok(if score > 0.0 {
            Label::Positive
        } else {
            Label::Negative
        })
    }

    fn save(&self, path: &Path) -> Result<()> {
        persist::save(self, path)
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        let stored: L = persist::load(path)?;
        if Learner::dim(&stored) != Learner::dim(self) {
            return Err(MlError::ShapeMismatch {
                what: "stored model",
                got: Learner::dim(&stored),
                expected: Learner::dim(self),
            });
        }

        *self = stored;
        Ok(())
    }
}

fn check_dim(dim: usize, features: &[f64]) -> Result<()> {
    if features.len() != dim {
        return Err(MlError::ShapeMismatch {
            what: "features",
            got: features.len(),
            expected: dim,
        });
    }

    Ok(())
}
