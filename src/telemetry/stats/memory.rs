//! Parsing of the cgroup v2 `memory.stat` file.
//!
//! Each non-empty line is `<key> <bytes>`. Keys the record does not know are ignored, so
//! newer kernels exporting extra counters parse cleanly. When a key repeats, the last
//! occurrence wins.
//!
//! # Example
//!
//! ```rust
//! use mc_docker_manager::telemetry::stats::{KeyValueStat, MemoryStats};
//!
//! let stats = MemoryStats::parse("anon 100\nfile 50\n").unwrap();
//! assert_eq!(stats.total_memory(), 150);
//! ```

use serde::Serialize;

use super::parser::{FieldHandlers, KeyValueStat, field_setters};

/// Memory counters from `memory.stat`, all in bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct MemoryStats {
    /// Anonymous memory (heap, stacks).
    pub anon: u64,
    /// Page cache.
    pub file: u64,
    /// Total kernel memory.
    pub kernel: u64,
    pub kernel_stack: u64,
    pub pagetables: u64,
    pub sec_pagetables: u64,
    pub percpu: u64,
    /// Network socket buffers.
    pub sock: u64,
    pub vmalloc: u64,
    pub shmem: u64,
    pub zswap: u64,
    pub zswapped: u64,
    pub file_mapped: u64,
    pub file_dirty: u64,
    pub file_writeback: u64,
    pub swapcached: u64,
    pub anon_thp: u64,
    pub file_thp: u64,
    pub shmem_thp: u64,
    pub inactive_anon: u64,
    pub active_anon: u64,
    pub inactive_file: u64,
    pub active_file: u64,
    pub unevictable: u64,
    pub slab_reclaimable: u64,
}

impl MemoryStats {
    /// Anonymous plus file-backed memory.
    pub fn total_memory(&self) -> u64 {
        self.anon.saturating_add(self.file)
    }

    /// Memory on the active LRU lists.
    pub fn active_memory(&self) -> u64 {
        self.active_anon.saturating_add(self.active_file)
    }

    /// Memory on the inactive LRU lists.
    pub fn inactive_memory(&self) -> u64 {
        self.inactive_anon.saturating_add(self.inactive_file)
    }
}

field_setters!(SETTERS: MemoryStats {
    anon,
    file,
    kernel,
    kernel_stack,
    pagetables,
    sec_pagetables,
    percpu,
    sock,
    vmalloc,
    shmem,
    zswap,
    zswapped,
    file_mapped,
    file_dirty,
    file_writeback,
    swapcached,
    anon_thp,
    file_thp,
    shmem_thp,
    inactive_anon,
    active_anon,
    inactive_file,
    active_file,
    unevictable,
    slab_reclaimable,
});

impl KeyValueStat for MemoryStats {
    const SPLIT_CHAR: Option<char> = None;
    const SKIP_VALUES: usize = 0;
    const ALLOW_DUPLICATE_KEYS: bool = true;
    const ALLOW_MULTIPLE_KV_PER_LINE: bool = false;

    fn field_handlers() -> &'static FieldHandlers<Self> {
        &SETTERS
    }
}
