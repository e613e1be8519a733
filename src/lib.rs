//! Manages Minecraft servers that run as Docker Compose projects.
//!
//! Every server lives in its own directory below a servers root, described by a compose file
//! whose `mc` service runs the `itzg/minecraft-server` image. The library validates and edits
//! those files ([`compose`], [`minecraft`]), drives their lifecycle through the docker CLI
//! ([`docker`], [`instance`], [`registry`]) and reads resource usage from cgroup v2 and procfs
//! ([`telemetry`]).
//!
//! The `mc-dir-watcher` binary runs the [`watcher`] service on top of it.

use std::sync::Arc;

use tokio::sync::broadcast;

pub mod compose;
pub mod docker;
pub mod error;
pub mod fsutil;
pub mod instance;
pub mod logging;
pub mod minecraft;
pub mod registry;
pub mod telemetry;
pub mod watcher;

/// Runs the directory watcher service until it fails.
///
/// Opens the server database, serves the HTTP API on the configured address and polls the
/// servers directory.
///
/// # Errors
///
/// Possible errors include:
/// - Failure to open or migrate the database at `config.db_path`.
/// - Failure to bind or serve the HTTP API.
pub async fn run(config: watcher::Config) -> Result<(), Box<dyn std::error::Error>> {
    log::debug!("Config: {config:?}");
    let store = Arc::new(watcher::SqliteServerStore::connect(&config.db_path).await?);
    let (notifications, _) = broadcast::channel(watcher::NOTIFICATION_BACKLOG);

    let api = watcher::APIServer::new(Arc::clone(&store), notifications.clone());
    let monitor = watcher::Watcher::new(config.servers_path.clone(), store, notifications);

    let addr = config.bind_addr();
    tokio::select! {
        served = api.listen(&addr) => served?,
        () = monitor.run(config.poll_interval) => {}
    }
    Ok(())
}
