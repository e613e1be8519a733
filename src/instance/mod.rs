//! One Minecraft server: a compose project directory under the servers root.
//!
//! ```text
//! <servers_root>/<name>/compose.yaml        (or docker-compose.yml, ...)
//! <servers_root>/<name>/data/               volume-mounted server data
//! <servers_root>/<name>/data/logs/latest.log
//! ```
//!
//! [`ServerInstance`] keeps no lifecycle state of its own; every query asks docker or the
//! filesystem again. Callers must serialize lifecycle changes (`create`, `remove`, `up`,
//! ...) of one server themselves.

mod error;
mod info;
pub mod logs;
mod status;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

pub use error::{Error, Result};
pub use info::{RunningInfo, ServerInfo};
pub use logs::{LogChunk, PlayerMessage};
pub use status::{ServerStatus, StatusSnapshot};

use crate::docker::{CommandRunner, ComposeManager, DockerManager};
use crate::fsutil;
use crate::minecraft::{MC_SERVICE, McComposeFile};
use crate::telemetry::stats::{BlockIoStats, MemoryStats, NetworkStats};
use crate::telemetry::{self, CpuSampler, DiskSpaceInfo, TelemetryPaths};

/// Compose file names, in lookup order.
pub const COMPOSE_FILE_NAMES: [&str; 4] = [
    "docker-compose.yml",
    "docker-compose.yaml",
    "compose.yml",
    "compose.yaml",
];

/// Name of the compose file written by [`ServerInstance::create`].
pub const COMPOSE_FILE_NAME: &str = "compose.yaml";

pub const HEALTH_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct ServerInstance<R> {
    name: String,
    project_dir: PathBuf,
    runner: Arc<R>,
    compose: ComposeManager<R>,
    docker: DockerManager<R>,
    telemetry: TelemetryPaths,
    cpu: Mutex<CpuSampler>,
}

impl<R> std::fmt::Debug for ServerInstance<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerInstance")
            .field("name", &self.name)
            .field("project_dir", &self.project_dir)
            .finish_non_exhaustive()
    }
}

impl<R: CommandRunner> ServerInstance<R> {
    pub fn new(servers_root: &Path, name: &str, runner: Arc<R>) -> Self {
        let project_dir = servers_root.join(name);
        Self {
            name: name.to_string(),
            compose: ComposeManager::new(Arc::clone(&runner), project_dir.clone()),
            docker: DockerManager::new(Arc::clone(&runner)),
            project_dir,
            runner,
            telemetry: TelemetryPaths::default(),
            cpu: Mutex::new(CpuSampler::new()),
        }
    }

    /// Reads cgroup and procfs data below other roots.
    pub fn with_telemetry_paths(mut self, paths: TelemetryPaths) -> Self {
        self.telemetry = paths;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn data_dir(&self) -> PathBuf {
        self.project_dir.join("data")
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir().join("logs").join("latest.log")
    }

    pub fn compose_manager(&self) -> &ComposeManager<R> {
        &self.compose
    }

    fn cpu_sampler(&self) -> MutexGuard<'_, CpuSampler> {
        self.cpu.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn not_running(&self) -> Error {
        self.cpu_sampler().invalidate();
        Error::NotRunning {
            name: self.name.clone(),
        }
    }

    pub async fn compose_file_path(&self) -> Option<PathBuf> {
        let candidates: Vec<PathBuf> = COMPOSE_FILE_NAMES
            .iter()
            .map(|file| self.project_dir.join(file))
            .collect();
        fsutil::first_existing(&candidates).await
    }

    async fn require_compose_file_path(&self) -> Result<PathBuf> {
        self.compose_file_path()
            .await
            .ok_or_else(|| Error::ComposeFileNotFound {
                name: self.name.clone(),
            })
    }

    /// Validates `compose_yaml` as the definition of this server.
    pub fn verify_compose_yaml(&self, compose_yaml: &str) -> Result<McComposeFile> {
        let compose = McComposeFile::from_yaml_str(compose_yaml)?;
        self.check_name(compose)
    }

    fn check_name(&self, compose: McComposeFile) -> Result<McComposeFile> {
        if compose.get_server_name() != self.name {
            return Err(Error::NameMismatch {
                expected: self.name.clone(),
                found: compose.get_server_name().to_string(),
            });
        }
        Ok(compose)
    }

    /// The compose file exactly as stored.
    pub async fn get_compose_file(&self) -> Result<String> {
        let path = self.require_compose_file_path().await?;
        Ok(fsutil::read_to_string(&path).await?)
    }

    pub async fn get_compose_obj(&self) -> Result<McComposeFile> {
        let path = self.require_compose_file_path().await?;
        let compose = McComposeFile::async_from_file(&path).await?;
        self.check_name(compose)
    }

    /// Creates the project directory with `compose_yaml` as its compose file, plus `data/`.
    ///
    /// # Errors
    ///
    /// Fails if the document is not a valid definition of this server or if a compose file
    /// already exists.
    pub async fn create(&self, compose_yaml: &str) -> Result<()> {
        self.verify_compose_yaml(compose_yaml)?;

        fsutil::create_dir_all(&self.project_dir).await?;
        if self.compose_file_path().await.is_some() {
            return Err(Error::ComposeFileExists {
                name: self.name.clone(),
            });
        }

        fsutil::write_string(self.project_dir.join(COMPOSE_FILE_NAME), compose_yaml).await?;
        fsutil::create_dir_all(self.data_dir()).await?;
        log::info!("created server {}", self.name);
        Ok(())
    }

    /// Replaces the compose file. Only allowed while no container exists.
    pub async fn update_compose_file(&self, compose_yaml: &str) -> Result<()> {
        if self.created().await? {
            return Err(Error::StillCreated {
                name: self.name.clone(),
                action: "update",
            });
        }
        self.verify_compose_yaml(compose_yaml)?;

        let path = self.require_compose_file_path().await?;
        fsutil::write_string(&path, compose_yaml).await?;
        log::info!("updated compose file of server {}", self.name);
        Ok(())
    }

    /// Deletes the project directory. Only allowed while no container exists.
    pub async fn remove(&self) -> Result<()> {
        if self.created().await? {
            return Err(Error::StillCreated {
                name: self.name.clone(),
                action: "remove",
            });
        }
        fsutil::remove_dir_all(&self.project_dir).await?;
        log::info!("removed server {}", self.name);
        Ok(())
    }

    pub async fn up(&self) -> Result<()> {
        Ok(self.compose.up_detached().await?)
    }

    pub async fn down(&self) -> Result<()> {
        self.compose.down().await?;
        self.cpu_sampler().invalidate();
        Ok(())
    }

    pub async fn start(&self) -> Result<()> {
        Ok(self.compose.start().await?)
    }

    pub async fn stop(&self) -> Result<()> {
        self.compose.stop().await?;
        self.cpu_sampler().invalidate();
        Ok(())
    }

    pub async fn restart(&self) -> Result<()> {
        Ok(self.compose.restart().await?)
    }

    pub async fn pull(&self) -> Result<()> {
        Ok(self.compose.pull().await?)
    }

    /// Output of `docker compose logs`.
    pub async fn logs(&self, tail: u32) -> Result<String> {
        Ok(self.compose.logs(tail).await?)
    }

    /// Whether a compose file exists.
    pub async fn exists(&self) -> bool {
        self.compose_file_path().await.is_some()
    }

    /// Whether a container exists, running or not.
    pub async fn created(&self) -> Result<bool> {
        Ok(self.compose.created().await?)
    }

    pub async fn running(&self) -> Result<bool> {
        Ok(self.compose.running().await?)
    }

    pub async fn starting(&self) -> Result<bool> {
        Ok(self.compose.starting(MC_SERVICE).await?)
    }

    pub async fn healthy(&self) -> Result<bool> {
        Ok(self.compose.healthy(MC_SERVICE).await?)
    }

    /// Probes everything [`ServerStatus`] depends on. The docker probes run concurrently.
    pub async fn status_snapshot(&self) -> Result<StatusSnapshot> {
        if !self.exists().await {
            return Ok(StatusSnapshot::default());
        }
        let (created, running, starting, healthy) = tokio::try_join!(
            self.created(),
            self.running(),
            self.starting(),
            self.healthy()
        )?;
        Ok(StatusSnapshot {
            exists: true,
            created,
            running,
            starting,
            healthy,
        })
    }

    pub async fn get_status(&self) -> Result<ServerStatus> {
        let status = self.status_snapshot().await?.status();
        if !status.is_running() {
            self.cpu_sampler().invalidate();
        }
        Ok(status)
    }

    /// Polls until the health check passes. Fails at once if the server is not running.
    ///
    /// There is no timeout; wrap the call in [`tokio::time::timeout`] to bound it.
    pub async fn wait_until_healthy(&self) -> Result<()> {
        if !self.running().await? {
            return Err(self.not_running());
        }
        let mut interval = tokio::time::interval(HEALTH_POLL_INTERVAL);
        loop {
            interval.tick().await;
            if self.healthy().await? {
                return Ok(());
            }
        }
    }

    pub async fn get_log_file_end_pointer(&self) -> Result<u64> {
        Ok(logs::end_pointer(&self.log_path()).await?)
    }

    /// Reads the game log from `start`; see [`logs::resolve_start`] for how it is resolved.
    pub async fn get_logs_from_file(&self, start: i64) -> Result<LogChunk> {
        Ok(logs::read_from(&self.log_path(), start).await?)
    }

    /// Chat messages logged since `start`, with the pointer to continue from.
    pub async fn get_player_messages_from_log(&self, start: i64) -> Result<(Vec<PlayerMessage>, u64)> {
        let chunk = self.get_logs_from_file(start).await?;
        Ok((logs::parse_player_messages(&chunk.content), chunk.pointer))
    }

    async fn require_healthy(&self) -> Result<()> {
        if !self.healthy().await? {
            return Err(Error::NotHealthy {
                name: self.name.clone(),
            });
        }
        Ok(())
    }

    /// Runs a console command through `rcon-cli` and returns its reply without colour codes.
    pub async fn send_command_rcon(&self, command: &str) -> Result<String> {
        self.require_healthy().await?;
        let reply = self.compose.exec(MC_SERVICE, &["rcon-cli", command]).await?;
        Ok(logs::strip_ansi(&reply).trim().to_string())
    }

    /// Types a command into the server console.
    pub async fn send_command_stdin(&self, command: &str) -> Result<()> {
        self.require_healthy().await?;
        self.compose
            .exec(MC_SERVICE, &["mc-send-to-console", command])
            .await?;
        Ok(())
    }

    pub async fn list_players(&self) -> Result<Vec<String>> {
        let reply = self.send_command_rcon("list").await?;
        Ok(logs::parse_player_list(&reply))
    }

    pub async fn get_container_id(&self) -> Result<String> {
        if !self.running().await? {
            return Err(self.not_running());
        }
        self.compose
            .container_id(MC_SERVICE)
            .await?
            .ok_or_else(|| Error::ContainerNotFound {
                name: self.name.clone(),
            })
    }

    pub async fn get_pid(&self) -> Result<u32> {
        let container_id = self.get_container_id().await?;
        Ok(self.docker.inspect_pid(&container_id).await?)
    }

    pub async fn get_memory_usage(&self) -> Result<MemoryStats> {
        let container_id = self.get_container_id().await?;
        Ok(telemetry::read_memory_stats(&self.telemetry, &container_id).await?)
    }

    pub async fn get_disk_io(&self) -> Result<BlockIoStats> {
        let container_id = self.get_container_id().await?;
        Ok(telemetry::read_block_io_stats(&self.telemetry, &container_id).await?)
    }

    pub async fn get_network_io(&self) -> Result<NetworkStats> {
        let pid = self.get_pid().await?;
        Ok(telemetry::read_network_stats(&self.telemetry, pid).await?)
    }

    /// CPU utilisation since the previous call, `0.0` on the first call for a container.
    pub async fn get_cpu_percentage(&self) -> Result<f64> {
        let container_id = self.get_container_id().await?;
        self.sample_cpu(&container_id).await
    }

    async fn sample_cpu(&self, container_id: &str) -> Result<f64> {
        let stat = telemetry::read_cpu_stat(&self.telemetry, container_id).await?;
        let now = Instant::now();
        Ok(self.cpu_sampler().sample(container_id, stat.usage_usec, now))
    }

    /// Size of `data/` and space on the filesystem holding it.
    pub async fn get_disk_space_info(&self) -> Result<DiskSpaceInfo> {
        let data_dir = self.data_dir();
        if !fsutil::exists(&data_dir).await {
            return Err(Error::DataDirMissing {
                name: self.name.clone(),
            });
        }

        let dir = data_dir.display().to_string();
        let du_args = ["-sb".to_string(), dir.clone()];
        let df_args = ["-B1".to_string(), dir];
        let (du, df) = tokio::try_join!(
            self.runner.run("du", &du_args),
            self.runner.run("df", &df_args)
        )?;

        DiskSpaceInfo::from_command_output(&du, &df).map_err(|source| Error::DiskUsage {
            name: self.name.clone(),
            source,
        })
    }

    /// Resource usage snapshot. The individual readings are taken concurrently.
    pub async fn get_server_running_info(&self) -> Result<RunningInfo> {
        let container_id = self.get_container_id().await?;
        let pid = self.docker.inspect_pid(&container_id).await?;

        let memory = async {
            Ok::<_, Error>(telemetry::read_memory_stats(&self.telemetry, &container_id).await?)
        };
        let block_io = async {
            Ok::<_, Error>(telemetry::read_block_io_stats(&self.telemetry, &container_id).await?)
        };
        let network = async {
            Ok::<_, Error>(telemetry::read_network_stats(&self.telemetry, pid).await?)
        };
        let (memory, cpu_percentage, block_io, network, disk) = tokio::try_join!(
            memory,
            self.sample_cpu(&container_id),
            block_io,
            network,
            self.get_disk_space_info()
        )?;

        Ok(RunningInfo {
            cpu_percentage,
            memory_usage_bytes: memory.anon,
            disk_read_bytes: block_io.total_read_bytes(),
            disk_write_bytes: block_io.total_write_bytes(),
            network_receive_bytes: network.total_rx_bytes(),
            network_send_bytes: network.total_tx_bytes(),
            disk_usage_bytes: disk.used_bytes,
            disk_total_bytes: disk.total_bytes,
            disk_available_bytes: disk.available_bytes,
        })
    }

    pub async fn get_server_info(&self) -> Result<ServerInfo> {
        let compose = self.get_compose_obj().await?;
        Ok(ServerInfo {
            name: compose.get_server_name().to_string(),
            path: self.project_dir.clone(),
            java_version: compose.get_java_version(),
            max_memory_bytes: compose.get_max_memory_bytes(),
            server_type: compose.get_server_type(),
            game_version: compose.get_game_version().to_string(),
            game_port: compose.get_game_port()?,
            rcon_port: compose.get_rcon_port()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::docker::testing::ScriptedRunner;

    const NAME: &str = "survival";
    const CONTAINER_ID: &str = "0123abcd";
    const PID: u32 = 4242;

    fn compose_yaml(name: &str, game_port: u16) -> String {
        format!(
            r#"services:
  mc:
    image: itzg/minecraft-server:java17
    container_name: mc-{name}
    environment:
      EULA: "TRUE"
      VERSION: "1.20.4"
      TYPE: PAPER
      MAX_MEMORY: 4G
    ports:
      - "{game_port}:25565"
      - "25575:25575"
    volumes:
      - ./data:/data
"#
        )
    }

    struct Fixture {
        root: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                root: tempfile::tempdir().unwrap(),
            }
        }

        fn servers(&self) -> PathBuf {
            self.root.path().join("servers")
        }

        fn project(&self) -> PathBuf {
            self.servers().join(NAME)
        }

        fn compose(&self, args: &str) -> String {
            format!(
                "docker compose --project-directory {} {args}",
                self.project().display()
            )
        }

        fn ps(&self) -> String {
            self.compose("ps --no-trunc --format json")
        }

        fn write_compose(&self, file: &str, yaml: &str) {
            std::fs::create_dir_all(self.project().join("data/logs")).unwrap();
            std::fs::write(self.project().join(file), yaml).unwrap();
        }

        fn instance(&self, runner: ScriptedRunner) -> (Arc<ScriptedRunner>, ServerInstance<ScriptedRunner>) {
            let runner = Arc::new(runner);
            let paths = TelemetryPaths::new(self.root.path().join("cgroup"), self.root.path().join("proc"));
            let instance =
                ServerInstance::new(&self.servers(), NAME, Arc::clone(&runner)).with_telemetry_paths(paths);
            (runner, instance)
        }

        fn running(&self, runner: ScriptedRunner) -> ScriptedRunner {
            runner
                .on(&self.compose("ps -q"), &format!("{CONTAINER_ID}\n"))
                .on(&self.compose("ps -q mc"), &format!("{CONTAINER_ID}\n"))
                .on(
                    &format!("docker inspect --format={{{{.State.Pid}}}} {CONTAINER_ID}"),
                    &format!("{PID}\n"),
                )
        }

        fn write_telemetry(&self, usage_usec: u64) {
            let scope = self
                .root
                .path()
                .join(format!("cgroup/system.slice/docker-{CONTAINER_ID}.scope"));
            std::fs::create_dir_all(&scope).unwrap();
            std::fs::write(scope.join("memory.stat"), "anon 1000\nfile 50\n").unwrap();
            std::fs::write(
                scope.join("io.stat"),
                "8:0 rbytes=10 wbytes=20 rios=1 wios=2 dbytes=0 dios=0\n",
            )
            .unwrap();
            std::fs::write(
                scope.join("cpu.stat"),
                format!("usage_usec {usage_usec}\nuser_usec 0\nsystem_usec 0\n"),
            )
            .unwrap();

            let net = self.root.path().join(format!("proc/{PID}/net"));
            std::fs::create_dir_all(&net).unwrap();
            std::fs::write(
                net.join("dev"),
                "Inter-|   Receive\n face |bytes\n  eth0: 500 5 0 0 0 0 0 0 700 7 0 0 0 0 0 0\n",
            )
            .unwrap();
        }

        fn disk_commands(&self, runner: ScriptedRunner) -> ScriptedRunner {
            let data = self.project().join("data");
            runner
                .on(
                    &format!("du -sb {}", data.display()),
                    &format!("2048\t{}\n", data.display()),
                )
                .on(
                    &format!("df -B1 {}", data.display()),
                    "Filesystem 1B-blocks Used Available Use% Mounted on\n/dev/sda1 10000 4000 6000 40% /\n",
                )
        }
    }

    #[tokio::test]
    async fn test_create_writes_project() {
        let fx = Fixture::new();
        let (runner, instance) = fx.instance(ScriptedRunner::new());

        instance.create(&compose_yaml(NAME, 25565)).await.unwrap();
        assert!(fx.project().join("compose.yaml").is_file());
        assert!(fx.project().join("data").is_dir());
        assert!(instance.exists().await);
        assert_eq!(instance.get_compose_file().await.unwrap(), compose_yaml(NAME, 25565));
        assert!(runner.calls().is_empty());

        let err = instance.create(&compose_yaml(NAME, 25565)).await.unwrap_err();
        assert!(matches!(err, Error::ComposeFileExists { .. }));
    }

    #[tokio::test]
    async fn test_create_rejects_foreign_or_invalid_documents() {
        let fx = Fixture::new();
        let (_, instance) = fx.instance(ScriptedRunner::new());

        let err = instance.create(&compose_yaml("other", 25565)).await.unwrap_err();
        assert!(matches!(err, Error::NameMismatch { .. }));

        let err = instance.create("services: {}").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(crate::minecraft::ValidationError::MissingMcService)
        ));
        assert!(!fx.project().exists());
    }

    #[tokio::test]
    async fn test_server_info() {
        let fx = Fixture::new();
        fx.write_compose("docker-compose.yml", &compose_yaml(NAME, 30000));
        let (_, instance) = fx.instance(ScriptedRunner::new());

        let info = instance.get_server_info().await.unwrap();
        assert_eq!(info.name, NAME);
        assert_eq!(info.path, fx.project());
        assert_eq!(info.java_version, 17);
        assert_eq!(info.max_memory_bytes, 4 << 30);
        assert_eq!(info.server_type, crate::minecraft::ServerType::Paper);
        assert_eq!(info.game_version, "1.20.4");
        assert_eq!(info.game_port, 30000);
        assert_eq!(info.rcon_port, 25575);
    }

    #[tokio::test]
    async fn test_missing_compose_file() {
        let fx = Fixture::new();
        let (_, instance) = fx.instance(ScriptedRunner::new());
        let err = instance.get_compose_obj().await.unwrap_err();
        assert!(matches!(err, Error::ComposeFileNotFound { .. }));
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_and_remove_require_no_container() {
        let fx = Fixture::new();
        fx.write_compose("compose.yaml", &compose_yaml(NAME, 25565));
        let (_, instance) = fx.instance(
            ScriptedRunner::new()
                .on(&fx.compose("ps --all -q"), "0123abcd\n")
                .on(&fx.compose("ps --all -q"), ""),
        );

        let err = instance
            .update_compose_file(&compose_yaml(NAME, 30000))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Cannot update server survival while it is created");

        instance
            .update_compose_file(&compose_yaml(NAME, 30000))
            .await
            .unwrap();
        assert_eq!(instance.get_server_info().await.unwrap().game_port, 30000);

        instance.remove().await.unwrap();
        assert!(!fx.project().exists());
        assert_eq!(instance.get_status().await.unwrap(), ServerStatus::Removed);
    }

    #[tokio::test]
    async fn test_remove_refused_while_created() {
        let fx = Fixture::new();
        fx.write_compose("compose.yaml", &compose_yaml(NAME, 25565));
        let (_, instance) =
            fx.instance(ScriptedRunner::new().on(&fx.compose("ps --all -q"), "0123abcd\n"));

        let err = instance.remove().await.unwrap_err();
        assert!(matches!(err, Error::StillCreated { action: "remove", .. }));
        assert!(fx.project().exists());
    }

    #[tokio::test]
    async fn test_status_removed_without_docker() {
        let fx = Fixture::new();
        let (runner, instance) = fx.instance(ScriptedRunner::new());
        assert_eq!(instance.get_status().await.unwrap(), ServerStatus::Removed);
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_status_levels() {
        let fx = Fixture::new();
        fx.write_compose("compose.yaml", &compose_yaml(NAME, 25565));

        let (_, instance) = fx.instance(
            ScriptedRunner::new()
                .on(&fx.compose("ps --all -q"), "")
                .on(&fx.compose("ps -q"), "")
                .on(&fx.ps(), ""),
        );
        assert_eq!(instance.get_status().await.unwrap(), ServerStatus::Exists);

        let (_, instance) = fx.instance(
            ScriptedRunner::new()
                .on(&fx.compose("ps --all -q"), "0123abcd\n")
                .on(&fx.compose("ps -q"), "")
                .on(&fx.ps(), ""),
        );
        assert_eq!(instance.get_status().await.unwrap(), ServerStatus::Created);

        let (_, instance) = fx.instance(
            ScriptedRunner::new()
                .on(&fx.compose("ps --all -q"), "0123abcd\n")
                .on(&fx.compose("ps -q"), "0123abcd\n")
                .on(&fx.ps(), r#"{"Service":"mc","Health":"starting"}"#),
        );
        assert_eq!(instance.get_status().await.unwrap(), ServerStatus::Starting);

        let (_, instance) = fx.instance(
            ScriptedRunner::new()
                .on(&fx.compose("ps --all -q"), "0123abcd\n")
                .on(&fx.compose("ps -q"), "0123abcd\n")
                .on(&fx.ps(), r#"{"Service":"mc","Health":"healthy"}"#),
        );
        assert_eq!(instance.get_status().await.unwrap(), ServerStatus::Healthy);
    }

    #[tokio::test]
    async fn test_wait_until_healthy() {
        let fx = Fixture::new();
        let (_, instance) = fx.instance(ScriptedRunner::new().on(&fx.compose("ps -q"), ""));
        assert!(matches!(
            instance.wait_until_healthy().await,
            Err(Error::NotRunning { .. })
        ));

        let (runner, instance) = fx.instance(
            ScriptedRunner::new()
                .on(&fx.compose("ps -q"), "0123abcd\n")
                .on(&fx.ps(), r#"{"Service":"mc","Health":"starting"}"#)
                .on(&fx.ps(), r#"{"Service":"mc","Health":"healthy"}"#),
        );
        tokio::time::timeout(Duration::from_secs(5), instance.wait_until_healthy())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(runner.calls().iter().filter(|c| **c == fx.ps()).count(), 2);
    }

    #[tokio::test]
    async fn test_console_commands_require_health() {
        let fx = Fixture::new();
        let (_, instance) = fx.instance(ScriptedRunner::new().on(&fx.ps(), ""));
        assert!(matches!(
            instance.send_command_rcon("list").await,
            Err(Error::NotHealthy { .. })
        ));
        assert!(matches!(
            instance.send_command_stdin("say hi").await,
            Err(Error::NotHealthy { .. })
        ));
    }

    #[tokio::test]
    async fn test_console_commands() {
        let fx = Fixture::new();
        let (runner, instance) = fx.instance(
            ScriptedRunner::new()
                .on(&fx.ps(), r#"{"Service":"mc","Health":"healthy"}"#)
                .on(
                    &fx.compose("exec -T mc rcon-cli list"),
                    "\x1b[0mThere are 2 of a max of 20 players online: Alice, Bob\x1b[0m\n",
                )
                .on(&fx.compose("exec -T mc mc-send-to-console say hi"), ""),
        );

        assert_eq!(instance.list_players().await.unwrap(), ["Alice", "Bob"]);
        instance.send_command_stdin("say hi").await.unwrap();
        assert!(runner
            .calls()
            .contains(&fx.compose("exec -T mc mc-send-to-console say hi")));
    }

    #[tokio::test]
    async fn test_player_messages_from_log() {
        let fx = Fixture::new();
        fx.write_compose("compose.yaml", &compose_yaml(NAME, 25565));
        std::fs::write(
            fx.project().join("data/logs/latest.log"),
            "[12:00:00] [Server thread/INFO]: <Alice> hello\n[12:00:01] [Server thread/INFO]: Done\n",
        )
        .unwrap();
        let (_, instance) = fx.instance(ScriptedRunner::new());

        let end = instance.get_log_file_end_pointer().await.unwrap();
        let (messages, pointer) = instance.get_player_messages_from_log(0).await.unwrap();
        assert_eq!(pointer, end);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].player, "Alice");

        let (messages, _) = instance
            .get_player_messages_from_log(pointer as i64)
            .await
            .unwrap();
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn test_disk_space_requires_data_dir() {
        let fx = Fixture::new();
        let (_, instance) = fx.instance(ScriptedRunner::new());
        assert!(matches!(
            instance.get_disk_space_info().await,
            Err(Error::DataDirMissing { .. })
        ));
    }

    #[tokio::test]
    async fn test_running_info() {
        let fx = Fixture::new();
        fx.write_compose("compose.yaml", &compose_yaml(NAME, 25565));
        fx.write_telemetry(1_000_000);
        let (_, instance) = fx.instance(fx.disk_commands(fx.running(ScriptedRunner::new())));

        let info = instance.get_server_running_info().await.unwrap();
        assert_eq!(info.cpu_percentage, 0.0);
        assert_eq!(info.memory_usage_bytes, 1000);
        assert_eq!(info.disk_read_bytes, 10);
        assert_eq!(info.disk_write_bytes, 20);
        assert_eq!(info.network_receive_bytes, 500);
        assert_eq!(info.network_send_bytes, 700);
        assert_eq!(info.disk_usage_bytes, 2048);
        assert_eq!(info.disk_total_bytes, 10000);
        assert_eq!(info.disk_available_bytes, 6000);
        assert!((info.disk_usage_percentage() - 20.48).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_running_info_requires_running() {
        let fx = Fixture::new();
        let (_, instance) = fx.instance(ScriptedRunner::new().on(&fx.compose("ps -q"), ""));
        assert!(matches!(
            instance.get_server_running_info().await,
            Err(Error::NotRunning { .. })
        ));
    }

    #[tokio::test]
    async fn test_cpu_sampler_follows_container() {
        let fx = Fixture::new();
        fx.write_telemetry(1_000_000);
        let (_, instance) = fx.instance(
            fx.running(ScriptedRunner::new())
                .on(&fx.compose("ps -q"), &format!("{CONTAINER_ID}\n"))
                .on(&fx.compose("ps -q"), ""),
        );

        assert_eq!(instance.get_cpu_percentage().await.unwrap(), 0.0);
        assert_eq!(instance.cpu_sampler().container_id(), Some(CONTAINER_ID));

        fx.write_telemetry(1_000_500);
        assert!(instance.get_cpu_percentage().await.unwrap() >= 0.0);

        // The container stopped.
        assert!(matches!(
            instance.get_cpu_percentage().await,
            Err(Error::NotRunning { .. })
        ));
        assert_eq!(instance.cpu_sampler().container_id(), None);
    }
}
