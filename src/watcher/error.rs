use crate::fsutil::FileError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to connect to database: {0}")]
    ConnectionError(#[source] sqlx::Error),
    #[error("failed to run initial migration: {0}")]
    MigrationError(#[source] sqlx::migrate::MigrateError),
    #[error("failed to read servers: {0}")]
    ReadError(#[source] sqlx::Error),
    #[error("failed to store servers: {0}")]
    WriteError(#[source] sqlx::Error),
    #[error("failed to scan servers directory: {0}")]
    ScanError(#[from] FileError),
    #[error("failed to encode notification: {0}")]
    EncodeError(#[from] serde_json::Error),
    #[error("failed to bind API server to `{addr}`: {source}")]
    BindError {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("API server failed: {0}")]
    ServeError(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
