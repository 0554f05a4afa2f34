use std::{error::Error, fmt, io, path::PathBuf};

use ml_core::MlError;

use crate::config::ConfigErr;

/// The controller's result type.
pub type Result<T> = std::result::Result<T, OrbitErr>;

/// Process exit codes, one per fatal failure point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    Unknown = 1,
    ParseArgs = 2,
    InvalidPort = 3,
    CreateSocket = 4,
    BindPort = 5,
    ListenSocket = 6,
    AcceptConnection = 7,
    InvalidArgs = 8,
    PropertiesFileMissing = 9,
    CommandProcessing = 10,
    SerializedModelMissing = 11,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// The socket setup step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStage {
    Create,
    Bind,
    Listen,
    Accept,
}

impl fmt::Display for SetupStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SetupStage::Create => "create socket",
            SetupStage::Bind => "bind port",
            SetupStage::Listen => "listen on socket",
            SetupStage::Accept => "accept connection",
        };

        write!(f, "{s}")
    }
}

/// Controller failures.
#[derive(Debug)]
pub enum OrbitErr {
    /// Wrong command line usage.
    InvalidArgs(String),
    /// Bad or missing configuration.
    Config(ConfigErr),
    /// A socket setup step failed.
    Setup { stage: SetupStage, source: io::Error },
    /// The client closed the connection without sending `exit`.
    Disconnected,
    /// Reading from or writing to the client failed.
    Transport(io::Error),
    /// A model operation failed.
    Model { name: &'static str, source: MlError },
    /// A file operation on models or logs failed.
    Io { path: PathBuf, source: io::Error },
}

impl OrbitErr {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// The code the process exits with when this error is fatal.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::InvalidArgs(_) => ExitCode::InvalidArgs,
            Self::Config(ConfigErr::FileMissing(_)) => ExitCode::PropertiesFileMissing,
            Self::Config(ConfigErr::InvalidPort(_)) => ExitCode::InvalidPort,
            Self::Config(ConfigErr::Missing(_) | ConfigErr::Invalid { .. }) => ExitCode::ParseArgs,
            Self::Config(ConfigErr::Io { .. }) => ExitCode::Unknown,
            Self::Setup { stage, .. } => match stage {
                SetupStage::Create => ExitCode::CreateSocket,
                SetupStage::Bind => ExitCode::BindPort,
                SetupStage::Listen => ExitCode::ListenSocket,
                SetupStage::Accept => ExitCode::AcceptConnection,
            },
            Self::Disconnected | Self::Transport(_) => ExitCode::CommandProcessing,
            Self::Model {
                source: MlError::ModelMissing(_),
                ..
            } => ExitCode::SerializedModelMissing,
            Self::Model { .. } | Self::Io { .. } => ExitCode::Unknown,
        }
    }
}

impl fmt::Display for OrbitErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgs(msg) => write!(f, "invalid arguments: {msg}"),
            Self::Config(e) => write!(f, "config error: {e}"),
            Self::Setup { stage, source } => write!(f, "failed to {stage}: {source}"),
            Self::Disconnected => write!(f, "client disconnected"),
            Self::Transport(e) => write!(f, "transport error: {e}"),
            Self::Model { name, source } => write!(f, "model {name} failed: {source}"),
            Self::Io { path, source } => write!(f, "io error at {}: {source}", path.display()),
        }
    }
}

impl Error for OrbitErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Setup { source, .. } => Some(source),
            Self::Transport(e) => Some(e),
            Self::Model { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigErr> for OrbitErr {
    fn from(value: ConfigErr) -> Self {
        Self::Config(value)
    }
}
