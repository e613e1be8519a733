use crate::fsutil::FileError;
use crate::minecraft::ValidationError;
use crate::telemetry::stats::StatParseError;
use crate::{compose, docker, telemetry};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Could not find compose.yaml for server {name}")]
    ComposeFileNotFound { name: String },

    #[error("compose.yaml already exists for server {name}")]
    ComposeFileExists { name: String },

    #[error("compose file describes server `{found}`, expected `{expected}`")]
    NameMismatch { expected: String, found: String },

    #[error("Cannot {action} server {name} while it is created")]
    StillCreated { name: String, action: &'static str },

    #[error("Server {name} is not running")]
    NotRunning { name: String },

    #[error("Server {name} is not healthy")]
    NotHealthy { name: String },

    #[error("Could not find container ID for service 'mc' in server {name}")]
    ContainerNotFound { name: String },

    #[error("Data directory does not exist for server {name}")]
    DataDirMissing { name: String },

    #[error("Unable to parse disk usage of server {name}: {source}")]
    DiskUsage {
        name: String,
        #[source]
        source: StatParseError,
    },

    #[error(transparent)]
    File(#[from] FileError),

    #[error(transparent)]
    Compose(#[from] compose::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Docker(#[from] docker::Error),

    #[error(transparent)]
    Telemetry(#[from] telemetry::Error),
}

impl Error {
    /// Whether the failure is a missing file, container or process rather than a fault.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::ComposeFileNotFound { .. } | Error::ContainerNotFound { .. } => true,
            Error::File(err) => err.is_not_found(),
            Error::Compose(err) => err.is_not_found(),
            Error::Validation(ValidationError::Document(err)) => err.is_not_found(),
            Error::Telemetry(err) => err.is_not_found(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
