//! Online binary classifiers updated one labelled example at a time.
//!
//! Every algorithm keeps a linear model over `f64` features and is driven through
//! the object safe `OnlineClassifier` trait, so callers can hold a heterogeneous
//! set of them behind `Box<dyn OnlineClassifier>`.

mod classifier;
pub mod classifiers;
mod error;
mod label;
mod persist;
mod probit;

pub use classifier::{Learner, OnlineClassifier};
pub use classifiers::{AdagradRda, Adam, Arow, Nherd, Pa, PaVariant, Scw};
pub use error::{MlError, Result};
pub use label::Label;
