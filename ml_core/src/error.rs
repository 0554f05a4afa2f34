use std::{
    error::Error,
    fmt, io,
    path::{Path, PathBuf},
};

/// The result type used across the online learning crate.
pub type Result<T> = std::result::Result<T, MlError>;

/// Errors produced by online classifiers.
#[derive(Debug)]
pub enum MlError {
    /// A hyperparameter is outside of the algorithm's domain.
    InvalidHyperParam {
        name: &'static str,
        reason: &'static str,
    },

    /// A shape invariant was violated (e.g. a feature vector of the wrong length).
    ShapeMismatch {
        /// Human-readable context for the mismatch (e.g. "features", "stored model").
        what: &'static str,
        /// Observed value.
        got: usize,
        /// Expected value.
        expected: usize,
    },

    /// There is no serialized model at the given path.
    ModelMissing(PathBuf),

    /// Reading or writing a serialized model failed.
    Io { path: PathBuf, source: io::Error },

    /// A serialized model could not be encoded or decoded.
    Format {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl MlError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => Self::ModelMissing(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }

    pub(crate) fn format(path: &Path, source: serde_json::Error) -> Self {
        Self::Format {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl fmt::Display for MlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MlError::InvalidHyperParam { name, reason } => {
                write!(f, "invalid hyperparameter {name}: {reason}")
            }
            MlError::ShapeMismatch {
                what,
                got,
                expected,
            } => {
                write!(f, "shape mismatch for {what}: got {got}, expected {expected}")
            }
            MlError::ModelMissing(path) => write!(f, "no model at {}", path.display()),
            MlError::Io { path, source } => write!(f, "io error at {}: {source}", path.display()),
            MlError::Format { path, source } => {
                write!(f, "bad model encoding at {}: {source}", path.display())
            }
        }
    }
}

impl Error for MlError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MlError::Io { source, .. } => Some(source),
            MlError::Format { source, .. } => Some(source),
            _ => None,
        }
    }
}
