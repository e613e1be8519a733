use std::collections::BTreeMap;
use std::path::Path;

use serde_yaml::Value;

use crate::compose::PortMapping;
use crate::fsutil::{self, FileError};
use crate::minecraft::{CONTAINER_PREFIX, GAME_PORT};

/// Published game port per server name.
pub type ServerPorts = BTreeMap<String, u16>;

/// Compose file names the watcher looks for, in order of preference.
pub const WATCHED_FILE_NAMES: [&str; 2] = ["docker-compose.yaml", "docker-compose.yml"];

/// Collects the game port of every server in the directories directly below `root`.
///
/// Files that cannot be read or parsed are logged and skipped. When two files name the same
/// server, the one in the later directory (by name) wins.
///
/// # Errors
///
/// Fails only if `root` itself cannot be listed.
pub async fn scan_servers(root: &Path) -> Result<ServerPorts, FileError> {
    let file_err = |source| FileError {
        path: root.to_path_buf(),
        source,
    };
    let mut read_dir = tokio::fs::read_dir(root).await.map_err(file_err)?;
    let mut dirs = Vec::new();
    while let Some(entry) = read_dir.next_entry().await.map_err(file_err)? {
        if entry.file_type().await.is_ok_and(|t| t.is_dir()) {
            dirs.push(entry.path());
        }
    }
    dirs.sort();

    let mut servers = ServerPorts::new();
    for dir in dirs {
        let candidates: Vec<_> = WATCHED_FILE_NAMES.iter().map(|f| dir.join(f)).collect();
        let Some(path) = fsutil::first_existing(&candidates).await else {
            continue;
        };

        let content = match fsutil::read_to_string(&path).await {
            Ok(content) => content,
            Err(err) if err.is_not_found() => continue,
            Err(err) => {
                log::error!("{err}");
                continue;
            }
        };
        let document: Value = match serde_yaml::from_str(&content) {
            Ok(document) => document,
            Err(err) => {
                log::error!("failed to parse {}: {err}", path.display());
                continue;
            }
        };

        if let Some((name, port)) = server_port(&document, &path) {
            servers.insert(name, port);
        }
    }
    Ok(servers)
}

/// Name and published game port of the first Minecraft service in `document`.
fn server_port(document: &Value, path: &Path) -> Option<(String, u16)> {
    let Some(services) = document.get("services").and_then(Value::as_mapping) else {
        log::warn!("no services in {}", path.display());
        return None;
    };

    for service in services.values() {
        let Some(container_name) = service.get("container_name") else {
            log::warn!("no container_name in {}", path.display());
            continue;
        };
        let Some(container_name) = container_name.as_str() else {
            log::warn!("container_name is not a string in {}", path.display());
            continue;
        };
        let Some(name) = container_name.strip_prefix(CONTAINER_PREFIX) else {
            continue;
        };

        let Some(ports) = service.get("ports") else {
            continue;
        };
        let Some(ports) = ports.as_sequence() else {
            log::warn!("ports is not a list in {}", path.display());
            continue;
        };

        let published = ports
            .iter()
            .filter_map(|port| PortMapping::from_value(port).ok())
            .find(|mapping| mapping.targets(GAME_PORT))
            .and_then(|mapping| mapping.published);
        let Some(published) = published else {
            continue;
        };
        if published.is_empty() || !published.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        let Ok(port) = published.parse() else {
            continue;
        };
        return Some((name.to_string(), port));
    }
    None
}
