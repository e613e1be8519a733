use std::io;
use std::path::{Path, PathBuf};

/// Error that occurs when reading or writing a file fails.
#[derive(Debug, thiserror::Error)]
#[error("failed to access file `{path}`: {source}")]
pub struct FileError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

impl FileError {
    fn new(path: &Path, source: io::Error) -> Self {
        Self {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Whether the underlying error is [`io::ErrorKind::NotFound`].
    pub fn is_not_found(&self) -> bool {
        self.source.kind() == io::ErrorKind::NotFound
    }
}

/// Reads a whole file into a string.
///
/// # Errors
///
/// Returns a [`FileError`] if the file cannot be opened or is not valid UTF-8.
///
/// # Example
/// ```no_run
/// # use mc_docker_manager::fsutil;
/// # async fn demo() -> Result<(), fsutil::FileError> {
/// let content = fsutil::read_to_string("/sys/fs/cgroup/cpu.stat").await?;
/// # Ok(())
/// # }
/// ```
pub async fn read_to_string(path: impl AsRef<Path>) -> Result<String, FileError> {
    let path = path.as_ref();
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| FileError::new(path, source))
}

/// Writes `content` to `path`, replacing any existing file.
///
/// # Errors
///
/// Returns a [`FileError`] if the file cannot be written.
pub async fn write_string(path: impl AsRef<Path>, content: &str) -> Result<(), FileError> {
    let path = path.as_ref();
    tokio::fs::write(path, content)
        .await
        .map_err(|source| FileError::new(path, source))
}

/// Creates a directory and all missing parents.
///
/// # Errors
///
/// Returns a [`FileError`] if creation fails.
pub async fn create_dir_all(path: impl AsRef<Path>) -> Result<(), FileError> {
    let path = path.as_ref();
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| FileError::new(path, source))
}

/// Deletes a directory tree.
pub async fn remove_dir_all(path: impl AsRef<Path>) -> Result<(), FileError> {
    let path = path.as_ref();
    tokio::fs::remove_dir_all(path)
        .await
        .map_err(|source| FileError::new(path, source))
}

/// Whether `path` exists. Probe failures count as "does not exist".
pub async fn exists(path: impl AsRef<Path>) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

/// Returns the first of `candidates` that exists, probing them concurrently.
///
/// Probe failures (e.g. permission errors) count as "does not exist".
pub async fn first_existing(candidates: &[PathBuf]) -> Option<PathBuf> {
    let mut probes = tokio::task::JoinSet::new();
    for (idx, candidate) in candidates.iter().enumerate() {
        let candidate = candidate.clone();
        probes.spawn(async move { (idx, tokio::fs::try_exists(candidate).await) });
    }

    let mut found: Option<usize> = None;
    while let Some(joined) = probes.join_next().await {
        if let Ok((idx, Ok(true))) = joined {
            found = Some(found.map_or(idx, |prev| prev.min(idx)));
        }
    }
    found.map(|idx| candidates[idx].clone())
}
