//! Parsing of the cgroup v2 `cpu.stat` file.
//!
//! The file holds one `<key> <value>` pair per line, times in microseconds and counts as
//! plain integers:
//!
//! ```text
//! usage_usec 1000000
//! user_usec 600000
//! system_usec 400000
//! nr_periods 10
//! nr_throttled 2
//! throttled_usec 50000
//! ```
//!
//! Keys must be unique; a repeated key is reported as [`StatParseError::DuplicateField`].
//!
//! [`StatParseError::DuplicateField`]: super::StatParseError::DuplicateField

use serde::Serialize;

use super::parser::{FieldHandlers, KeyValueStat, field_setters};

/// Parsed data from a cgroup `cpu.stat` file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CpuStat {
    /// Total CPU time (user + system) consumed by the cgroup, in microseconds.
    pub usage_usec: u64,
    /// Time spent in user space, in microseconds.
    pub user_usec: u64,
    /// Time spent in kernel space, in microseconds.
    pub system_usec: u64,
    /// Number of enforcement periods that elapsed.
    pub nr_periods: u64,
    /// Number of periods in which the cgroup was throttled.
    pub nr_throttled: u64,
    /// Total throttled time, in microseconds.
    pub throttled_usec: u64,
    pub nr_bursts: u64,
    pub burst_usec: u64,
}

field_setters!(SETTERS: CpuStat {
    usage_usec,
    user_usec,
    system_usec,
    nr_periods,
    nr_throttled,
    throttled_usec,
    nr_bursts,
    burst_usec,
});

impl KeyValueStat for CpuStat {
    const SPLIT_CHAR: Option<char> = None;
    const SKIP_VALUES: usize = 0;
    const ALLOW_DUPLICATE_KEYS: bool = false;
    const ALLOW_MULTIPLE_KV_PER_LINE: bool = false;

    fn field_handlers() -> &'static FieldHandlers<Self> {
        &SETTERS
    }
}
