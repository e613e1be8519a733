use serde::{Deserialize, Serialize};

use super::scan::ServerPorts;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    New,
    Updated,
    Removed,
}

/// One entry of the change list pushed to websocket clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    pub name: String,
    /// The new port, or the last known one for removed servers.
    pub port: u16,
}

/// Changes from `stored` to `current`: new and updated servers in `current` order, then
/// removed ones in `stored` order.
pub fn diff(stored: &ServerPorts, current: &ServerPorts) -> Vec<Notification> {
    let changed = current.iter().filter_map(|(name, &port)| {
        let kind = match stored.get(name) {
            None => ChangeKind::New,
            Some(&old) if old != port => ChangeKind::Updated,
            Some(_) => return None,
        };
        Some(Notification {
            kind,
            name: name.clone(),
            port,
        })
    });
    let removed = stored
        .iter()
        .filter(|(name, _)| !current.contains_key(*name))
        .map(|(name, &port)| Notification {
            kind: ChangeKind::Removed,
            name: name.clone(),
            port,
        });
    changed.chain(removed).collect()
}
