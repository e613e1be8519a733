use std::path::PathBuf;

use serde::Serialize;

use crate::minecraft::ServerType;

/// Static description of a server, derived from its compose file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub path: PathBuf,
    pub java_version: u32,
    pub max_memory_bytes: u64,
    pub server_type: ServerType,
    pub game_version: String,
    pub game_port: u16,
    pub rcon_port: u16,
}

/// Resource usage of a running server.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RunningInfo {
    pub cpu_percentage: f64,
    pub memory_usage_bytes: u64,
    pub disk_read_bytes: u64,
    pub disk_write_bytes: u64,
    pub network_receive_bytes: u64,
    pub network_send_bytes: u64,
    pub disk_usage_bytes: u64,
    pub disk_total_bytes: u64,
    pub disk_available_bytes: u64,
}

impl RunningInfo {
    pub fn disk_usage_percentage(&self) -> f64 {
        if self.disk_total_bytes == 0 {
            return 0.0;
        }
        self.disk_usage_bytes as f64 / self.disk_total_bytes as f64 * 100.0
    }
}
