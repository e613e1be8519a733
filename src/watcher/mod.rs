//! Directory watcher service: publishes the game port of every server below a directory.
//!
//! Every poll cycle scans the directory, stores the result and, if anything changed,
//! pushes the list of changes to websocket clients.

pub mod api;
pub mod config;
mod diff;
mod error;
mod scan;
pub mod store;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

pub use api::APIServer;
pub use config::Config;
pub use diff::{ChangeKind, Notification, diff};
pub use error::{Error, Result};
pub use scan::{ServerPorts, WATCHED_FILE_NAMES, scan_servers};
pub use store::{ServerStore, SqliteServerStore};

/// Capacity of the notification channel; slower websocket clients miss older change lists.
pub const NOTIFICATION_BACKLOG: usize = 16;

pub struct Watcher<S> {
    servers_root: PathBuf,
    store: Arc<S>,
    notifications: broadcast::Sender<String>,
}

impl<S: ServerStore> Watcher<S> {
    pub fn new(
        servers_root: impl Into<PathBuf>,
        store: Arc<S>,
        notifications: broadcast::Sender<String>,
    ) -> Self {
        Self {
            servers_root: servers_root.into(),
            store,
            notifications,
        }
    }

    /// Runs one cycle and returns the changes it found.
    pub async fn poll_once(&self) -> Result<Vec<Notification>> {
        let current = scan_servers(&self.servers_root).await?;
        let stored = self.store.get_all_servers().await?;
        if current == stored {
            return Ok(Vec::new());
        }

        log::info!("servers changed, updating database");
        self.store.override_all_servers(&current).await?;

        let notifications = diff(&stored, &current);
        log::info!("notification: {notifications:?}");
        let payload = serde_json::to_string(&notifications)?;
        if self.notifications.send(payload).is_err() {
            log::debug!("no ws clients to notify");
        }
        Ok(notifications)
    }

    /// Polls every `poll_interval` forever. Failed cycles are logged and retried on the next
    /// tick.
    pub async fn run(&self, poll_interval: Duration) {
        log::info!("monitoring {}...", self.servers_root.display());
        let mut interval = tokio::time::interval(poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if let Err(err) = self.poll_once().await {
                log::error!("poll failed: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::watcher::store::MemoryStore;

    fn write_server(root: &Path, name: &str, port: u16) {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("docker-compose.yml"),
            format!("services:\n  mc:\n    container_name: mc-{name}\n    ports: [\"{port}:25565\"]\n"),
        )
        .unwrap();
    }

    fn new_watcher(root: &Path, store: MemoryStore) -> (Watcher<MemoryStore>, broadcast::Receiver<String>) {
        let (tx, rx) = broadcast::channel(NOTIFICATION_BACKLOG);
        (Watcher::new(root, Arc::new(store), tx), rx)
    }

    #[tokio::test]
    async fn test_poll_cycle() {
        let root = tempfile::tempdir().unwrap();
        write_server(root.path(), "alpha", 25565);
        write_server(root.path(), "beta", 25566);
        let (watcher, mut rx) = new_watcher(
            root.path(),
            MemoryStore::with_servers([("beta", 25570), ("gamma", 25567)]),
        );

        let changes = watcher.poll_once().await.unwrap();
        assert_eq!(changes.len(), 3);
        assert_eq!(
            rx.try_recv().unwrap(),
            r#"[{"type":"new","name":"alpha","port":25565},{"type":"updated","name":"beta","port":25566},{"type":"removed","name":"gamma","port":25567}]"#
        );
        assert_eq!(
            watcher.store.get_all_servers().await.unwrap(),
            ServerPorts::from([("alpha".to_string(), 25565), ("beta".to_string(), 25566)])
        );

        // Nothing changed since.
        assert!(watcher.poll_once().await.unwrap().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_poll_without_clients() {
        let root = tempfile::tempdir().unwrap();
        write_server(root.path(), "alpha", 25565);
        let (watcher, rx) = new_watcher(root.path(), MemoryStore::default());
        drop(rx);

        let changes = watcher.poll_once().await.unwrap();
        assert_eq!(changes[0].kind, ChangeKind::New);
    }

    #[tokio::test]
    async fn test_poll_failures_keep_state() {
        let root = tempfile::tempdir().unwrap();
        write_server(root.path(), "alpha", 25565);
        let (watcher, mut rx) = new_watcher(root.path(), MemoryStore::broken());

        assert!(matches!(watcher.poll_once().await, Err(Error::ReadError(_))));
        assert!(rx.try_recv().is_err());

        watcher.store.set_broken(false);
        assert_eq!(watcher.poll_once().await.unwrap().len(), 1);

        let (watcher, _rx) = new_watcher(&root.path().join("missing"), MemoryStore::default());
        assert!(matches!(watcher.poll_once().await, Err(Error::ScanError(_))));
    }
}
