//! JSON persistence for classifier state.

use std::{fs, path::Path};

use serde::{de::DeserializeOwned, Serialize};

use crate::{MlError, Result};

/// Writes `state` into `path`, replacing any previous content.
pub(crate) fn save<T: Serialize>(state: &T, path: &Path) -> Result<()> {
    let bytes = serde_json::to_vec(state).map_err(|e| MlError::format(path, e))?;
    fs::write(path, bytes).map_err(|e| MlError::io(path, e))
}

/// Reads back a state written by `save`.
///
/// # Errors
/// Returns `MlError::ModelMissing` if there is nothing at `path`.
pub(crate) fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).map_err(|e| MlError::io(path, e))?;
    serde_json::from_slice(&bytes).map_err(|e| MlError::format(path, e))
}
