use std::sync::{Mutex, PoisonError};

use log::{Level, LevelFilter, Log, Metadata, Record};

/// Identity of a record for duplicate detection.
type RecordKey = (String, Level, String);

/// Wraps an [`env_logger::Logger`] and drops a record identical to the one logged right
/// before it (same module, level and message).
///
/// The watcher polls in a loop, so a persistent failure would otherwise log the same line
/// on every cycle.
pub struct DedupLogger {
    inner: env_logger::Logger,
    last: Mutex<Option<RecordKey>>,
}

impl DedupLogger {
    pub fn new(inner: env_logger::Logger) -> Self {
        Self {
            inner,
            last: Mutex::new(None),
        }
    }

    pub fn filter(&self) -> LevelFilter {
        self.inner.filter()
    }

    /// Remembers `record` and reports whether it differs from the previous one.
    fn is_new(&self, record: &Record<'_>) -> bool {
        let key = (
            record.module_path().unwrap_or_default().to_string(),
            record.level(),
            record.args().to_string(),
        );
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        if last.as_ref() == Some(&key) {
            return false;
        }
        *last = Some(key);
        true
    }
}

impl Log for DedupLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &Record<'_>) {
        if self.inner.matches(record) && self.is_new(record) {
            self.inner.log(record);
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Builds the watcher's logger from an `env_logger` filter string such as `info` or
/// `mc_docker_manager=debug`.
///
/// `sqlx` is capped at `warn` unless `filters` names it.
pub fn build(filters: &str) -> DedupLogger {
    let inner = env_logger::Builder::new()
        .filter_module("sqlx", LevelFilter::Warn)
        .parse_filters(filters)
        .format_timestamp_secs()
        .build();
    DedupLogger::new(inner)
}

/// Installs [`build`]`(filters)` as the global logger.
///
/// # Errors
///
/// Fails if a logger is already installed.
pub fn init(filters: &str) -> Result<(), log::SetLoggerError> {
    let logger = build(filters);
    let max_level = logger.filter();
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(max_level);
    Ok(())
}
