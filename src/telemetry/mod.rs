//! Resource telemetry for Minecraft server containers.
//!
//! This module reads the kernel-exposed accounting files of a Docker container and hands
//! their content to the pure parsers in [`stats`].
//!
//! # Sources
//!
//! - `<cgroup_root>/system.slice/docker-<id>.scope/memory.stat`
//! - `<cgroup_root>/system.slice/docker-<id>.scope/io.stat`
//! - `<cgroup_root>/system.slice/docker-<id>.scope/cpu.stat`
//! - `<proc_root>/<pid>/net/dev`
//!
//! The roots default to `/sys/fs/cgroup` and `/proc` and can be redirected through
//! [`TelemetryPaths`].
//!
//! # Failure model
//!
//! Each reader fails with [`Error::NotFound`] when its file is absent and with
//! [`Error::Read`] for any other OS error. [`read_cgroup_stats`] treats every sub-read as
//! optional, so one failing file never hides the others.

mod disk;
mod error;
mod sampler;
pub mod stats;

use std::path::{Path, PathBuf};

pub use disk::DiskSpaceInfo;
pub use error::{Error, Result};
pub use sampler::CpuSampler;

use crate::error::LogResultExt;
use crate::fsutil;
use stats::{BlockIoStats, CpuStat, KeyValueStat, MemoryStats, NetworkStats};

const DEFAULT_CGROUP_ROOT: &str = "/sys/fs/cgroup";
const DEFAULT_PROC_ROOT: &str = "/proc";

/// Locations of the cgroup v2 hierarchy and of procfs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryPaths {
    cgroup_root: PathBuf,
    proc_root: PathBuf,
}

impl Default for TelemetryPaths {
    fn default() -> Self {
        Self::new(DEFAULT_CGROUP_ROOT, DEFAULT_PROC_ROOT)
    }
}

impl TelemetryPaths {
    pub fn new(cgroup_root: impl Into<PathBuf>, proc_root: impl Into<PathBuf>) -> Self {
        Self {
            cgroup_root: cgroup_root.into(),
            proc_root: proc_root.into(),
        }
    }

    /// The cgroup directory Docker's systemd driver creates for a container.
    pub fn container_scope(&self, container_id: &str) -> PathBuf {
        self.cgroup_root
            .join("system.slice")
            .join(format!("docker-{container_id}.scope"))
    }

    pub fn memory_stat(&self, container_id: &str) -> PathBuf {
        self.container_scope(container_id).join("memory.stat")
    }

    pub fn io_stat(&self, container_id: &str) -> PathBuf {
        self.container_scope(container_id).join("io.stat")
    }

    pub fn cpu_stat(&self, container_id: &str) -> PathBuf {
        self.container_scope(container_id).join("cpu.stat")
    }

    pub fn net_dev(&self, pid: u32) -> PathBuf {
        self.proc_root.join(pid.to_string()).join("net").join("dev")
    }
}

async fn read_source(what: &'static str, path: &Path) -> Result<String> {
    fsutil::read_to_string(path).await.map_err(|err| {
        if err.is_not_found() {
            Error::NotFound {
                what,
                path: err.path,
            }
        } else {
            Error::Read {
                what,
                path: err.path,
                source: err.source,
            }
        }
    })
}

/// Reads and parses `memory.stat` of a container.
///
/// # Errors
///
/// [`Error::NotFound`] if the container's cgroup is gone, [`Error::Read`] otherwise.
pub async fn read_memory_stats(paths: &TelemetryPaths, container_id: &str) -> Result<MemoryStats> {
    const WHAT: &str = "memory stats";
    let path = paths.memory_stat(container_id);
    let content = read_source(WHAT, &path).await?;
    MemoryStats::parse(&content).map_err(|source| Error::Parse {
        what: WHAT,
        path,
        source,
    })
}

/// Reads and parses `io.stat` of a container.
///
/// # Errors
///
/// [`Error::NotFound`] if the container's cgroup is gone, [`Error::Read`] otherwise.
pub async fn read_block_io_stats(
    paths: &TelemetryPaths,
    container_id: &str,
) -> Result<BlockIoStats> {
    let content = read_source("block I/O stats", &paths.io_stat(container_id)).await?;
    Ok(BlockIoStats::parse(&content))
}

/// Reads and parses `cpu.stat` of a container.
///
/// # Errors
///
/// [`Error::NotFound`] if the container's cgroup is gone, [`Error::Read`] or
/// [`Error::Parse`] otherwise.
pub async fn read_cpu_stat(paths: &TelemetryPaths, container_id: &str) -> Result<CpuStat> {
    const WHAT: &str = "cpu stats";
    let path = paths.cpu_stat(container_id);
    let content = read_source(WHAT, &path).await?;
    CpuStat::parse(&content).map_err(|source| Error::Parse {
        what: WHAT,
        path,
        source,
    })
}

/// Reads and parses `/proc/<pid>/net/dev`, i.e. the network namespace of the container's
/// main process.
///
/// # Errors
///
/// [`Error::NotFound`] if the process is gone, [`Error::Read`] otherwise.
pub async fn read_network_stats(paths: &TelemetryPaths, pid: u32) -> Result<NetworkStats> {
    let content = read_source("network stats", &paths.net_dev(pid)).await?;
    Ok(NetworkStats::parse(pid, &content))
}

/// Memory and block I/O of one container, each present only if it could be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CgroupStats {
    pub container_id: String,
    pub memory: Option<MemoryStats>,
    pub block_io: Option<BlockIoStats>,
}

/// Reads memory and block I/O stats concurrently. A failing sub-read is logged and
/// leaves its field empty.
pub async fn read_cgroup_stats(paths: &TelemetryPaths, container_id: &str) -> CgroupStats {
    let (memory, block_io) = tokio::join!(
        read_memory_stats(paths, container_id),
        read_block_io_stats(paths, container_id),
    );

    CgroupStats {
        container_id: container_id.to_string(),
        memory: memory.ok_or_log(log::Level::Warn, "memory stats unavailable"),
        block_io: block_io.ok_or_log(log::Level::Warn, "block I/O stats unavailable"),
    }
}
