use std::fmt::Display;

/// Turns a tolerated failure into `None` after logging it.
pub trait LogResultExt<T> {
    /// Returns the success value, or logs `context: error` at `level` and returns `None`.
    fn ok_or_log(self, level: log::Level, context: impl Display) -> Option<T>;
}

impl<T, E> LogResultExt<T> for std::result::Result<T, E>
where
    E: std::error::Error,
{
    fn ok_or_log(self, level: log::Level, context: impl Display) -> Option<T> {
        match self {
            Ok(ok) => Some(ok),
            Err(err) => {
                log::log!(level, "{context}: {err}");
                None
            }
        }
    }
}
