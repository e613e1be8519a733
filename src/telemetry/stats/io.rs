//! Parsing of the cgroup v2 `io.stat` file.
//!
//! Every line starts with a `major:minor` device token followed by whitespace-separated
//! `key=value` pairs:
//!
//! ```text
//! 8:0 rbytes=1024 wbytes=2048 rios=12 wios=24 dbytes=0 dios=0
//! ```
//!
//! Devices are kept individually, in file order. Unknown keys are ignored, and a device
//! whose pairs are all unknown or malformed is still recorded with zero counters. A line
//! whose device token is not `major:minor` is skipped.
//!
//! # Example
//!
//! ```rust
//! use mc_docker_manager::telemetry::stats::BlockIoStats;
//!
//! let stats = BlockIoStats::parse("8:0 rbytes=10 wbytes=20\n");
//! assert_eq!(stats.devices.len(), 1);
//! assert_eq!(stats.devices[0].total_bytes(), 30);
//! ```

use serde::Serialize;

use super::StatParseError;
use super::parser::{FieldHandlers, KeyValueStat, field_setters};

/// Counters for a single block device.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct BlockIoDevice {
    pub major: u32,
    pub minor: u32,
    /// Bytes read.
    pub rbytes: u64,
    /// Bytes written.
    pub wbytes: u64,
    /// Read operations.
    pub rios: u64,
    /// Write operations.
    pub wios: u64,
    /// Bytes discarded.
    pub dbytes: u64,
    /// Discard operations.
    pub dios: u64,
}

impl BlockIoDevice {
    /// The `major:minor` identifier of the device.
    pub fn device_id(&self) -> String {
        format!("{}:{}", self.major, self.minor)
    }

    /// Read, written and discarded bytes.
    pub fn total_bytes(&self) -> u64 {
        self.rbytes.saturating_add(self.wbytes).saturating_add(self.dbytes)
    }

    /// Read, write and discard operations.
    pub fn total_operations(&self) -> u64 {
        self.rios.saturating_add(self.wios).saturating_add(self.dios)
    }
}

field_setters!(SETTERS: BlockIoDevice {
    rbytes,
    wbytes,
    rios,
    wios,
    dbytes,
    dios,
});

impl KeyValueStat for BlockIoDevice {
    const SPLIT_CHAR: Option<char> = Some('=');
    const SKIP_VALUES: usize = 0;
    const ALLOW_DUPLICATE_KEYS: bool = true;
    const ALLOW_MULTIPLE_KV_PER_LINE: bool = true;

    fn field_handlers() -> &'static FieldHandlers<Self> {
        &SETTERS
    }
}

/// Per-device block I/O statistics from `io.stat`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct BlockIoStats {
    pub devices: Vec<BlockIoDevice>,
}

fn parse_device_token(token: &str, line: usize) -> Result<(u32, u32), StatParseError> {
    let invalid = || StatParseError::InvalidDevice {
        token: token.to_string(),
        line,
    };
    let (major, minor) = token.split_once(':').ok_or_else(invalid)?;
    Ok((
        major.parse().map_err(|_| invalid())?,
        minor.parse().map_err(|_| invalid())?,
    ))
}

impl BlockIoStats {
    /// Parses `io.stat` content. Malformed lines are logged and skipped.
    pub fn parse(content: &str) -> Self {
        let mut devices = Vec::new();

        for (idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (token, pairs) = line.split_once(char::is_whitespace).unwrap_or((line, ""));

            let device = parse_device_token(token, idx + 1).and_then(|(major, minor)| {
                let mut device = BlockIoDevice::parse(pairs)?;
                device.major = major;
                device.minor = minor;
                Ok(device)
            });
            match device {
                Ok(device) => devices.push(device),
                Err(err) => log::debug!("skipping io.stat line: {err}"),
            }
        }

        Self { devices }
    }

    /// Looks up a device by its `major:minor` identifier.
    pub fn get_device_by_id(&self, device_id: &str) -> Option<&BlockIoDevice> {
        self.devices.iter().find(|d| d.device_id() == device_id)
    }

    pub fn total_read_bytes(&self) -> u64 {
        self.devices.iter().map(|d| d.rbytes).fold(0, u64::saturating_add)
    }

    pub fn total_write_bytes(&self) -> u64 {
        self.devices.iter().map(|d| d.wbytes).fold(0, u64::saturating_add)
    }

    pub fn total_bytes(&self) -> u64 {
        self.devices
            .iter()
            .map(BlockIoDevice::total_bytes)
            .fold(0, u64::saturating_add)
    }

    pub fn total_operations(&self) -> u64 {
        self.devices
            .iter()
            .map(BlockIoDevice::total_operations)
            .fold(0, u64::saturating_add)
    }
}
