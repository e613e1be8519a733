use std::path::PathBuf;

use crate::fsutil::FileError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid port format: {0}")]
    InvalidPort(String),

    #[error("Invalid volume format: {0}")]
    InvalidVolume(String),

    #[error("Invalid environment entry: {0}")]
    InvalidEnvironment(String),

    #[error("invalid compose document: {0}")]
    InvalidDocument(String),

    #[error("failed to decode compose YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("compose file not found at `{path}`")]
    NotFound { path: PathBuf },

    #[error("failed to access compose file `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

impl From<FileError> for Error {
    fn from(err: FileError) -> Self {
        if err.is_not_found() {
            Error::NotFound { path: err.path }
        } else {
            Error::Io {
                path: err.path,
                source: err.source,
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
