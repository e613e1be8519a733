//! All servers below one servers root.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;

use crate::docker::{CONFIG_FILES_LABEL, CommandRunner, DockerManager, DockerPsEntry};
use crate::fsutil::FileError;
use crate::instance::{Error, Result, ServerInfo, ServerInstance};
use crate::minecraft::{CONTAINER_PREFIX, McComposeFile};
use crate::telemetry::TelemetryPaths;

/// Hands out one shared [`ServerInstance`] per server name.
///
/// Instances are cached so that per-instance state, such as the CPU sampler, outlives a
/// single request.
pub struct InstanceRegistry<R> {
    servers_root: PathBuf,
    runner: Arc<R>,
    docker: DockerManager<R>,
    telemetry: TelemetryPaths,
    instances: DashMap<String, Arc<ServerInstance<R>>>,
}

impl<R: CommandRunner> InstanceRegistry<R> {
    pub fn new(servers_root: impl Into<PathBuf>, runner: Arc<R>) -> Self {
        Self {
            servers_root: servers_root.into(),
            docker: DockerManager::new(Arc::clone(&runner)),
            runner,
            telemetry: TelemetryPaths::default(),
            instances: DashMap::new(),
        }
    }

    /// Instances created from now on read cgroup and procfs data below other roots.
    pub fn with_telemetry_paths(mut self, paths: TelemetryPaths) -> Self {
        self.telemetry = paths;
        self
    }

    pub fn servers_root(&self) -> &Path {
        &self.servers_root
    }

    pub fn get_instance(&self, name: &str) -> Arc<ServerInstance<R>> {
        let entry = self.instances.entry(name.to_string()).or_insert_with(|| {
            log::trace!("new instance handle for server {name}");
            Arc::new(
                ServerInstance::new(&self.servers_root, name, Arc::clone(&self.runner))
                    .with_telemetry_paths(self.telemetry.clone()),
            )
        });
        Arc::clone(entry.value())
    }

    /// Drops the cached instance of `name`. Handles already given out stay usable.
    pub fn forget(&self, name: &str) {
        self.instances.remove(name);
    }

    /// Names of the directories directly below the servers root, sorted.
    async fn sub_dirs(&self) -> Result<Vec<String>> {
        let file_err = |source| FileError {
            path: self.servers_root.clone(),
            source,
        };
        let mut read_dir = tokio::fs::read_dir(&self.servers_root)
            .await
            .map_err(file_err)?;

        let mut names = Vec::new();
        while let Some(entry) = read_dir.next_entry().await.map_err(file_err)? {
            let is_dir = entry
                .file_type()
                .await
                .is_ok_and(|file_type| file_type.is_dir());
            if !is_dir {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(name) => log::debug!("skipping non UTF-8 directory {name:?}"),
            }
        }
        names.sort();
        Ok(names)
    }

    /// Validated compose files of every server directory.
    ///
    /// Directories without a compose file are skipped silently, invalid ones with a debug
    /// log.
    pub async fn all_server_compose_files(&self) -> Result<Vec<McComposeFile>> {
        let mut compose_files = Vec::new();
        for name in self.sub_dirs().await? {
            match self.get_instance(&name).get_compose_obj().await {
                Ok(compose) => compose_files.push(compose),
                Err(err) if err.is_not_found() => {}
                Err(err) => log::debug!("skipping server directory {name}: {err}"),
            }
        }
        Ok(compose_files)
    }

    pub async fn all_server_names(&self) -> Result<Vec<String>> {
        Ok(self
            .all_server_compose_files()
            .await?
            .iter()
            .map(|compose| compose.get_server_name().to_string())
            .collect())
    }

    pub async fn all_instances(&self) -> Result<Vec<Arc<ServerInstance<R>>>> {
        Ok(self
            .all_server_names()
            .await?
            .iter()
            .map(|name| self.get_instance(name))
            .collect())
    }

    pub async fn all_server_compose_paths(&self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for instance in self.all_instances().await? {
            if let Some(path) = instance.compose_file_path().await {
                paths.push(path);
            }
        }
        Ok(paths)
    }

    pub async fn all_server_info(&self) -> Result<Vec<ServerInfo>> {
        let mut infos = Vec::new();
        for instance in self.all_instances().await? {
            infos.push(instance.get_server_info().await?);
        }
        Ok(infos)
    }

    /// Names of the servers below this root that docker reports as running.
    ///
    /// A container counts when it is named `mc-<name>` for a known server and its compose
    /// project was started from a file inside this servers root.
    pub async fn running_server_names(&self) -> Result<Vec<String>> {
        let (containers, names) = tokio::try_join!(
            async { self.docker.ps().await.map_err(Error::from) },
            self.all_server_names()
        )?;
        let names: HashSet<String> = names.into_iter().collect();
        let root = tokio::fs::canonicalize(&self.servers_root)
            .await
            .map_err(|source| FileError {
                path: self.servers_root.clone(),
                source,
            })?;

        let mut running = Vec::new();
        for container in &containers {
            let Some(name) = container.names.strip_prefix(CONTAINER_PREFIX) else {
                continue;
            };
            if !names.contains(name) {
                continue;
            }
            if !started_below(container, &root).await {
                log::debug!("container {} belongs to another servers root", container.names);
                continue;
            }
            running.push(name.to_string());
        }
        Ok(running)
    }
}

/// Whether the compose project of `container` lives in a directory directly below `root`.
async fn started_below(container: &DockerPsEntry, root: &Path) -> bool {
    // Several config files are joined with commas; the first one names the project dir.
    let Some(config_file) = container
        .labels
        .get(CONFIG_FILES_LABEL)
        .and_then(|files| files.split(',').next())
    else {
        return false;
    };
    let Some(servers_dir) = Path::new(config_file).parent().and_then(Path::parent) else {
        return false;
    };
    tokio::fs::canonicalize(servers_dir)
        .await
        .is_ok_and(|dir| dir == root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docker::testing::ScriptedRunner;

    const DOCKER_PS: &str = "docker ps --no-trunc --format json";

    fn compose_yaml(name: &str, game_port: u16) -> String {
        format!(
            r#"services:
  mc:
    image: itzg/minecraft-server
    container_name: mc-{name}
    environment:
      VERSION: "1.21"
    ports:
      - "{game_port}:25565"
      - "{rcon}:25575"
"#,
            rcon = game_port + 10
        )
    }

    fn write_server(root: &Path, dir: &str, file: &str, yaml: &str) -> PathBuf {
        let project = root.join(dir);
        std::fs::create_dir_all(&project).unwrap();
        let path = project.join(file);
        std::fs::write(&path, yaml).unwrap();
        path
    }

    fn ps_row(names: &str, config_files: &Path) -> String {
        serde_json::json!({
            "ID": "0123abcd",
            "Names": names,
            "Labels": format!(
                "com.docker.compose.project={names},{CONFIG_FILES_LABEL}={}",
                config_files.display()
            ),
            "State": "running",
        })
        .to_string()
    }

    fn registry(root: &Path, runner: ScriptedRunner) -> InstanceRegistry<ScriptedRunner> {
        InstanceRegistry::new(root, Arc::new(runner))
    }

    #[tokio::test]
    async fn test_lists_valid_servers_only() {
        let root = tempfile::tempdir().unwrap();
        write_server(root.path(), "alpha", "compose.yaml", &compose_yaml("alpha", 25565));
        write_server(root.path(), "beta", "docker-compose.yml", &compose_yaml("beta", 25566));
        // Name does not match its directory.
        write_server(root.path(), "gamma", "compose.yaml", &compose_yaml("delta", 25567));
        write_server(root.path(), "broken", "compose.yaml", "services: [");
        std::fs::create_dir_all(root.path().join("empty")).unwrap();
        std::fs::write(root.path().join("notes.txt"), "not a server").unwrap();

        let registry = registry(root.path(), ScriptedRunner::new());
        assert_eq!(registry.all_server_names().await.unwrap(), ["alpha", "beta"]);
        assert_eq!(
            registry.all_server_compose_paths().await.unwrap(),
            [
                root.path().join("alpha/compose.yaml"),
                root.path().join("beta/docker-compose.yml")
            ]
        );

        let info = registry.all_server_info().await.unwrap();
        assert_eq!(info.len(), 2);
        assert_eq!(info[1].name, "beta");
        assert_eq!(info[1].game_port, 25566);
        assert_eq!(info[1].rcon_port, 25576);
    }

    #[tokio::test]
    async fn test_missing_root() {
        let root = tempfile::tempdir().unwrap();
        let registry = registry(&root.path().join("missing"), ScriptedRunner::new());
        let err = registry.all_server_names().await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_instances_are_cached() {
        let root = tempfile::tempdir().unwrap();
        let registry = registry(root.path(), ScriptedRunner::new());

        let first = registry.get_instance("alpha");
        assert!(Arc::ptr_eq(&first, &registry.get_instance("alpha")));
        assert!(!Arc::ptr_eq(&first, &registry.get_instance("beta")));

        registry.forget("alpha");
        assert!(!Arc::ptr_eq(&first, &registry.get_instance("alpha")));
        assert_eq!(first.name(), "alpha");
    }

    #[tokio::test]
    async fn test_running_server_names() {
        let root = tempfile::tempdir().unwrap();
        let servers = root.path().join("servers");
        let alpha = write_server(&servers, "alpha", "compose.yaml", &compose_yaml("alpha", 25565));
        let beta = write_server(&servers, "beta", "compose.yaml", &compose_yaml("beta", 25566));
        let elsewhere = write_server(
            &root.path().join("other"),
            "beta",
            "compose.yaml",
            &compose_yaml("beta", 25566),
        );

        let rows = [
            ps_row("mc-alpha", &alpha),
            // Same name, but started from another servers root.
            ps_row("mc-beta", &elsewhere),
            ps_row("mc-unknown", &beta),
            ps_row("postgres", &beta),
            serde_json::json!({"ID": "ffff", "Names": "mc-beta"}).to_string(),
        ];
        let runner = ScriptedRunner::new().on(DOCKER_PS, &rows.join("\n"));
        let registry = registry(&servers, runner);

        assert_eq!(registry.running_server_names().await.unwrap(), ["alpha"]);
    }

    #[tokio::test]
    async fn test_running_server_names_docker_failure() {
        let root = tempfile::tempdir().unwrap();
        write_server(root.path(), "alpha", "compose.yaml", &compose_yaml("alpha", 25565));
        let runner = ScriptedRunner::new().fail(DOCKER_PS, 1, "Cannot connect to the Docker daemon");
        let registry = registry(root.path(), runner);

        let err = registry.running_server_names().await.unwrap_err();
        assert!(matches!(err, Error::Docker(_)));
    }
}
