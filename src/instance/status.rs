use std::fmt;

use serde::Serialize;

/// Lifecycle state of a server, ordered by how far it got.
///
/// `Starting` and `Healthy` both refine `Running`: the former while the health check has
/// not passed yet, the latter once it has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServerStatus {
    /// No compose file.
    Removed,
    /// Compose file present, no container.
    Exists,
    /// Container exists but is stopped.
    Created,
    Running,
    Starting,
    Healthy,
}

impl ServerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerStatus::Removed => "REMOVED",
            ServerStatus::Exists => "EXISTS",
            ServerStatus::Created => "CREATED",
            ServerStatus::Running => "RUNNING",
            ServerStatus::Starting => "STARTING",
            ServerStatus::Healthy => "HEALTHY",
        }
    }

    /// Whether the server has a running container, whatever its health.
    pub fn is_running(&self) -> bool {
        *self >= ServerStatus::Running
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The raw probe results a [`ServerStatus`] is derived from, taken at about the same time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub exists: bool,
    pub created: bool,
    pub running: bool,
    pub starting: bool,
    pub healthy: bool,
}

impl StatusSnapshot {
    pub fn status(&self) -> ServerStatus {
        if !self.exists {
            ServerStatus::Removed
        } else if !self.created {
            ServerStatus::Exists
        } else if !self.running {
            ServerStatus::Created
        } else if self.starting {
            ServerStatus::Starting
        } else if !self.healthy {
            ServerStatus::Running
        } else {
            ServerStatus::Healthy
        }
    }
}
