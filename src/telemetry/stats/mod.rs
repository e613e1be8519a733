//! Pure parsers turning kernel-exposed text into structured stat records.
//!
//! None of the parsers perform I/O: they take the content of a file that was already read
//! and return a typed record with derived totals. Reading the files is the job of the
//! parent [`telemetry`](super) module.
//!
//! # Records
//!
//! - [`MemoryStats`]: the counters of `memory.stat`, with `total_memory`, `active_memory`
//!   and `inactive_memory`.
//! - [`BlockIoStats`]: one [`BlockIoDevice`] per line of `io.stat`, with aggregates.
//! - [`NetworkStats`]: one [`NetworkInterface`] per data line of `/proc/<pid>/net/dev`.
//! - [`CpuStat`]: the counters of `cpu.stat`, used for CPU percentage sampling.

mod cpu;
mod error;
mod io;
mod memory;
mod net;
mod parser;

pub use cpu::CpuStat;
pub use error::StatParseError;
pub use io::{BlockIoDevice, BlockIoStats};
pub use memory::MemoryStats;
pub use net::{NetworkCounters, NetworkInterface, NetworkStats};
pub use parser::{FieldHandlers, KeyValueStat};
