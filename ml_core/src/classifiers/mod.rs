//! The catalog of online learning algorithms.

mod adagrad_rda;
mod adam;
mod arow;
mod gaussian;
mod nherd;
mod pa;
mod scw;


pub use adagrad_rda::AdagradRda;
pub use adam::Adam;
pub use arow::Arow;
pub use nherd::Nherd;
pub use pa::{Pa, PaVariant};
pub use scw::Scw;

use crate::{MlError, Result};

fn positive(name: &'static str, value: f64) -> Result<f64> {
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(MlError::InvalidHyperParam {
            name,
            reason: "must be a finite positive number",
        })
    }
}
