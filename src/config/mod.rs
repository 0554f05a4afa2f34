//! Typed access to the controller's key/value configuration.

mod properties;
mod settings;

use std::{collections::HashMap, error::Error, fmt, io, path::PathBuf, str::FromStr};

pub use properties::{PropertiesFile, PROPS_PREFIX};
pub use settings::{Layout, Mode, Settings};

/// A flat source of string configuration values.
pub trait ConfigSource {
    /// Returns the raw value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<&str>;

    /// Parses the value under `key`, absent keys yield `Ok(None)`.
    ///
    /// # Errors
    /// Returns `ConfigErr::Invalid` if the value is present but doesn't parse as `T`.
    fn parse<T: FromStr>(&self, key: &str) -> Result<Option<T>, ConfigErr> {
        let Some(raw) = self.get(key) else {
            return Ok(None);
        };

        raw.parse().map(Some).map_err(|_| ConfigErr::Invalid {
            key: key.to_string(),
            value: raw.to_string(),
            reason: "unparsable value",
        })
    }

    /// Parses the value under `key`, failing if it's absent.
    ///
    /// # Errors
    /// Returns `ConfigErr::Missing` for absent keys and `ConfigErr::Invalid` for
    /// unparsable ones.
    fn require<T: FromStr>(&self, key: &str) -> Result<T, ConfigErr> {
        self.parse(key)?
            .ok_or_else(|| ConfigErr::Missing(key.to_string()))
    }
}

impl ConfigSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<&str> {
        HashMap::get(self, key).map(String::as_str)
    }
}

/// Configuration failures, all of them fatal at startup.
#[derive(Debug)]
pub enum ConfigErr {
    /// The properties file doesn't exist.
    FileMissing(PathBuf),
    /// The properties file exists but couldn't be read.
    Io { path: PathBuf, source: io::Error },
    /// A required key is absent.
    Missing(String),
    /// A key holds a value outside of its domain.
    Invalid {
        key: String,
        value: String,
        reason: &'static str,
    },
    /// The port is not a number between 1 and 65535.
    InvalidPort(String),
}

impl fmt::Display for ConfigErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileMissing(path) => {
                write!(f, "properties file does not exist {}", path.display())
            }
            Self::Io { path, source } => {
                write!(f, "failed to read properties file {}: {source}", path.display())
            }
            Self::Missing(key) => write!(f, "missing configuration key {key}"),
            Self::Invalid { key, value, reason } => {
                write!(f, "invalid value {value:?} for {key}: {reason}")
            }
            Self::InvalidPort(value) => write!(f, "invalid port number {value:?}"),
        }
    }
}

impl Error for ConfigErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn absent_keys_parse_to_none() {
        let src = source(&[]);
        assert_eq!(src.parse::<i64>("mode").unwrap(), None);
        assert!(matches!(src.require::<i64>("mode"), Err(ConfigErr::Missing(k)) if k == "mode"));
    }

    #[test]
    fn unparsable_values_are_invalid() {
        let src = source(&[("AROW.hparam.r", "abc")]);
        let err = src.require::<f64>("AROW.hparam.r").unwrap_err();
        assert!(matches!(err, ConfigErr::Invalid { ref value, .. } if value == "abc"));
    }
}
