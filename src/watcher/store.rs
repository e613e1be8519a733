use std::future::Future;
use std::path::Path;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use super::scan::ServerPorts;
use super::{Error, Result};

/// Last observed set of servers, kept across restarts.
pub trait ServerStore: Send + Sync + 'static {
    fn get_all_servers(&self) -> impl Future<Output = Result<ServerPorts>> + Send;

    /// Replaces the stored set with `servers`.
    fn override_all_servers(&self, servers: &ServerPorts) -> impl Future<Output = Result<()>> + Send;
}

#[derive(Debug, Clone)]
pub struct SqliteServerStore {
    db: SqlitePool,
}

impl SqliteServerStore {
    /// Opens (or creates) the database file at `path` and applies migrations.
    pub async fn connect(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let db = SqlitePoolOptions::new()
            .acquire_timeout(std::time::Duration::from_secs(10))
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(Error::ConnectionError)?;
        Self::new(db).await
    }

    /// Uses an existing pool, applying migrations first.
    pub async fn new(db: SqlitePool) -> Result<Self> {
        sqlx::migrate!().run(&db).await.map_err(Error::MigrationError)?;
        Ok(Self { db })
    }
}

impl ServerStore for SqliteServerStore {
    async fn get_all_servers(&self) -> Result<ServerPorts> {
        let rows = sqlx::query_as::<_, (String, Option<i64>)>("SELECT name, port FROM servers")
            .fetch_all(&self.db)
            .await
            .map_err(Error::ReadError)?;

        let mut servers = ServerPorts::new();
        for (name, port) in rows {
            match port.and_then(|p| u16::try_from(p).ok()) {
                Some(port) => {
                    servers.insert(name, port);
                }
                None => log::warn!("ignoring stored server {name} with invalid port {port:?}"),
            }
        }
        Ok(servers)
    }

    /// Deletes every row and inserts `servers` in one transaction.
    async fn override_all_servers(&self, servers: &ServerPorts) -> Result<()> {
        let mut tx: sqlx::Transaction<'_, sqlx::Sqlite> =
            self.db.begin().await.map_err(Error::WriteError)?;

        sqlx::query("DELETE FROM servers")
            .execute(&mut *tx)
            .await
            .map_err(Error::WriteError)?;
        for (name, port) in servers {
            sqlx::query("INSERT INTO servers (name, port) VALUES (?, ?)")
                .bind(name)
                .bind(i64::from(*port))
                .execute(&mut *tx)
                .await
                .map_err(Error::WriteError)?;
        }
        tx.commit().await.map_err(Error::WriteError)?;

        Ok(())
    }
}

/// Keeps the servers in memory and can be told to fail.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    servers: std::sync::Mutex<ServerPorts>,
    broken: std::sync::atomic::AtomicBool,
}

#[cfg(test)]
impl MemoryStore {
    pub(crate) fn with_servers<'a>(servers: impl IntoIterator<Item = (&'a str, u16)>) -> Self {
        let store = Self::default();
        *store.servers.lock().unwrap() = servers
            .into_iter()
            .map(|(name, port)| (name.to_string(), port))
            .collect();
        store
    }

    pub(crate) fn broken() -> Self {
        let store = Self::default();
        store.set_broken(true);
        store
    }

    pub(crate) fn set_broken(&self, broken: bool) {
        self.broken.store(broken, std::sync::atomic::Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.broken.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(Error::ReadError(sqlx::Error::PoolClosed));
        }
        Ok(())
    }
}

#[cfg(test)]
impl ServerStore for MemoryStore {
    async fn get_all_servers(&self) -> Result<ServerPorts> {
        self.check()?;
        Ok(self.servers.lock().unwrap().clone())
    }

    async fn override_all_servers(&self, servers: &ServerPorts) -> Result<()> {
        self.check()?;
        *self.servers.lock().unwrap() = servers.clone();
        Ok(())
    }
}
