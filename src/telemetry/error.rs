use std::path::PathBuf;

use super::stats::StatParseError;

/// Errors raised while reading telemetry sources.
///
/// A missing file means the container or process is gone and is reported as
/// [`Error::NotFound`], separately from any other OS failure.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{what} not found at `{path}`")]
    NotFound { what: &'static str, path: PathBuf },

    #[error("failed to read {what} from `{path}`: {source}")]
    Read {
        what: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {what} from `{path}`: {source}")]
    Parse {
        what: &'static str,
        path: PathBuf,
        #[source]
        source: StatParseError,
    },
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
