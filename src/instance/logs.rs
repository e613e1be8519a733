use std::io::SeekFrom;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::fsutil::FileError;

static PLAYER_MESSAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\]: (?:\[Not Secure\] )?<(?P<player>.*?)> (?P<message>.*)")
        .expect("player message pattern to be valid")
});

static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1B(?:[@-Z\\-_]|\[[0-?]*[ -/]*[@-~])")
        .expect("ANSI escape pattern to be valid")
});

/// Text read from the server log, with the offset to continue from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogChunk {
    pub content: String,
    /// Byte offset of the end of `content`; pass it as `start` of the next read.
    pub pointer: u64,
    /// The requested start lay beyond the end of the file, so reading restarted at the
    /// beginning. Usually the log was rotated.
    pub reset: bool,
}

/// A chat line sent by a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerMessage {
    pub player: String,
    pub message: String,
}

/// Maps a caller-supplied start to an offset inside a file of `size` bytes.
///
/// A negative start counts back from the end (clamped to the beginning). A start past the
/// end restarts at `0` and reports the reset.
pub fn resolve_start(start: i64, size: u64) -> (u64, bool) {
    if start < 0 {
        (size.saturating_sub(start.unsigned_abs()), false)
    } else if start.unsigned_abs() > size {
        (0, true)
    } else {
        (start.unsigned_abs(), false)
    }
}

/// Reads `path` from the offset resolved by [`resolve_start`] to the end.
pub async fn read_from(path: &Path, start: i64) -> Result<LogChunk, FileError> {
    let file_err = |source| FileError {
        path: path.to_path_buf(),
        source,
    };

    let mut file = tokio::fs::File::open(path).await.map_err(file_err)?;
    let size = file.metadata().await.map_err(file_err)?.len();
    let (offset, reset) = resolve_start(start, size);
    if reset {
        log::debug!(
            "log pointer {start} is past the end of {} ({size} bytes), reading from the start",
            path.display()
        );
    }

    file.seek(SeekFrom::Start(offset)).await.map_err(file_err)?;
    let mut buf = Vec::new();
    let read = file.read_to_end(&mut buf).await.map_err(file_err)?;

    Ok(LogChunk {
        content: String::from_utf8_lossy(&buf).into_owned(),
        pointer: offset + read as u64,
        reset,
    })
}

/// Size of the file at `path`, i.e. the pointer that skips everything logged so far.
pub async fn end_pointer(path: &Path) -> Result<u64, FileError> {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.len())
        .map_err(|source| FileError {
            path: path.to_path_buf(),
            source,
        })
}

/// Extracts chat messages, in log order.
pub fn parse_player_messages(log: &str) -> Vec<PlayerMessage> {
    PLAYER_MESSAGE
        .captures_iter(log)
        .map(|caps| PlayerMessage {
            player: caps["player"].to_string(),
            message: caps["message"].to_string(),
        })
        .collect()
}

pub fn strip_ansi(text: &str) -> String {
    ANSI_ESCAPE.replace_all(text, "").into_owned()
}

/// Parses the reply to the `list` console command:
/// `There are 2 of a max of 20 players online: Alice, Bob`.
pub fn parse_player_list(reply: &str) -> Vec<String> {
    let Some((_, names)) = reply.split_once(':') else {
        return Vec::new();
    };
    names
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
