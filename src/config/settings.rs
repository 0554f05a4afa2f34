use std::{
    fs, io,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
};

use super::{ConfigErr, ConfigSource};

pub const KEY_PORT: &str = "port";
pub const KEY_HOST: &str = "host";
pub const KEY_MODE: &str = "mode";
pub const KEY_INPUTS: &str = "inputs";
pub const KEY_LOG_TRAINING: &str = "log.data.training";

/// What the controller does with every data frame, fixed for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Train from scratch and save after every frame.
    TrainNew,
    /// Load the saved models once, then train and save after every frame.
    TrainContinue,
    /// Load the saved models once, then only predict.
    Infer,
}

impl TryFrom<i64> for Mode {
    type Error = i64;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Mode::TrainNew),
            1 => Ok(Mode::TrainContinue),
            2 => Ok(Mode::Infer),
            other => Err(other),
        }
    }
}

/// Where models and logs live on disk.
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub const MODELS_DIR: &'static str = "models";
    pub const LOGS_DIR: &'static str = "logs";

    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// A layout rooted at the process working directory.
    pub fn current() -> Self {
        Self::new(".")
    }

    pub fn models_dir(&self) -> PathBuf {
        self.root.join(Self::MODELS_DIR)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join(Self::LOGS_DIR)
    }

    /// The path of the serialized model named `name`.
    pub fn model_path(&self, name: &str) -> PathBuf {
        self.models_dir().join(name)
    }

    pub fn training_log(&self) -> PathBuf {
        self.logs_dir().join("training.csv")
    }

    pub fn inference_log(&self) -> PathBuf {
        self.logs_dir().join("inference.csv")
    }

    pub fn process_log(&self) -> PathBuf {
        self.logs_dir().join("orbitai.log")
    }

    /// Creates the models and logs directories if they don't exist yet.
    pub fn create_dirs(&self) -> io::Result<()> {
        fs::create_dir_all(self.models_dir())?;
        fs::create_dir_all(self.logs_dir())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// The validated, immutable controller configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: IpAddr,
    pub port: u16,
    pub mode: Mode,
    /// Ordered names of the feature vector entries, its length is the feature dimension.
    pub inputs: Vec<String>,
    pub log_training: bool,
}

impl Settings {
    /// Reads every controller setting out of `src`.
    ///
    /// # Errors
    /// Returns `ConfigErr::InvalidPort` for a missing or out of range port,
    /// `ConfigErr::Missing` for other missing keys and `ConfigErr::Invalid` for
    /// values outside of their domain.
    pub fn from_source<S: ConfigSource>(src: &S) -> Result<Self, ConfigErr> {
        let port = read_port(src)?;

        let host = src
            .parse(KEY_HOST)?
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

        let mode = src.require::<i64>(KEY_MODE)?;
        let mode = Mode::try_from(mode).map_err(|value| ConfigErr::Invalid {
            key: KEY_MODE.to_string(),
            value: value.to_string(),
            reason: "must be 0 (train new), 1 (train continue) or 2 (infer)",
        })?;

        let inputs = read_inputs(src)?;

        let log_training = match src.parse::<i64>(KEY_LOG_TRAINING)? {
            None | Some(0) => false,
            Some(1) => true,
            Some(other) => {
                return Err(ConfigErr::Invalid {
                    key: KEY_LOG_TRAINING.to_string(),
                    value: other.to_string(),
                    reason: "must be 0 or 1",
                })
            }
        };

        Ok(Self {
            host,
            port,
            mode,
            inputs,
            log_training,
        })
    }

    /// The feature dimension.
    pub fn dim(&self) -> usize {
        self.inputs.len()
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn read_port<S: ConfigSource>(src: &S) -> Result<u16, ConfigErr> {
    let raw = src.get(KEY_PORT).unwrap_or_default();
    match raw.parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(ConfigErr::InvalidPort(raw.to_string())),
    }
}

fn read_inputs<S: ConfigSource>(src: &S) -> Result<Vec<String>, ConfigErr> {
    let raw = src
        .get(KEY_INPUTS)
        .ok_or_else(|| ConfigErr::Missing(KEY_INPUTS.to_string()))?;

    let inputs: Vec<String> = raw.split(',').map(|s| s.trim().to_string()).collect();
    if inputs.iter().any(String::is_empty) {
        return Err(ConfigErr::Invalid {
            key: KEY_INPUTS.to_string(),
            value: raw.to_string(),
            reason: "input names must not be empty",
        });
    }

    Ok(inputs)
}
