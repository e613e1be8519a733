use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::models::{ComposePsEntry, parse_json_rows};
use super::{CommandRunner, Error, Result};

/// Drives `docker compose` for one project directory.
#[derive(Debug)]
pub struct ComposeManager<R> {
    runner: Arc<R>,
    project_dir: PathBuf,
}

impl<R> Clone for ComposeManager<R> {
    fn clone(&self) -> Self {
        Self {
            runner: Arc::clone(&self.runner),
            project_dir: self.project_dir.clone(),
        }
    }
}

impl<R: CommandRunner> ComposeManager<R> {
    pub fn new(runner: Arc<R>, project_dir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            project_dir: project_dir.into(),
        }
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Runs `docker compose --project-directory <dir> <args..>`.
    pub async fn run_compose_command(&self, args: &[&str]) -> Result<String> {
        let mut full = Vec::with_capacity(args.len() + 3);
        full.push("compose".to_string());
        full.push("--project-directory".to_string());
        full.push(self.project_dir.display().to_string());
        full.extend(args.iter().map(|a| a.to_string()));
        self.runner.run("docker", &full).await
    }

    pub async fn up_detached(&self) -> Result<()> {
        self.run_compose_command(&["up", "-d"]).await.map(drop)
    }

    pub async fn down(&self) -> Result<()> {
        self.run_compose_command(&["down"]).await.map(drop)
    }

    pub async fn start(&self) -> Result<()> {
        self.run_compose_command(&["start"]).await.map(drop)
    }

    pub async fn stop(&self) -> Result<()> {
        self.run_compose_command(&["stop"]).await.map(drop)
    }

    pub async fn restart(&self) -> Result<()> {
        self.run_compose_command(&["restart"]).await.map(drop)
    }

    pub async fn pull(&self) -> Result<()> {
        self.run_compose_command(&["pull"]).await.map(drop)
    }

    pub async fn logs(&self, tail: u32) -> Result<String> {
        self.run_compose_command(&["logs", "--tail", &tail.to_string()])
            .await
    }

    /// Whether any container of the project is running.
    pub async fn running(&self) -> Result<bool> {
        let out = self.run_compose_command(&["ps", "-q"]).await?;
        Ok(!out.trim().is_empty())
    }

    /// Whether any container of the project exists, stopped ones included.
    pub async fn created(&self) -> Result<bool> {
        let out = self.run_compose_command(&["ps", "--all", "-q"]).await?;
        Ok(!out.trim().is_empty())
    }

    pub async fn ps_all(&self) -> Result<Vec<ComposePsEntry>> {
        let out = self
            .run_compose_command(&["ps", "--no-trunc", "--format", "json"])
            .await?;
        parse_json_rows("docker compose ps", &out)
    }

    /// The `ps` row of `service`.
    ///
    /// # Errors
    ///
    /// [`Error::ServiceNotFound`] if no running container belongs to the service.
    pub async fn ps(&self, service: &str) -> Result<ComposePsEntry> {
        self.ps_all()
            .await?
            .into_iter()
            .find(|row| row.service == service)
            .ok_or_else(|| Error::ServiceNotFound {
                service: service.to_string(),
            })
    }

    /// Whether the health check of `service` passes. A missing service is not healthy.
    pub async fn healthy(&self, service: &str) -> Result<bool> {
        match self.ps(service).await {
            Ok(row) => Ok(row.is_healthy()),
            Err(Error::ServiceNotFound { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Whether the health check of `service` is still in its start period.
    pub async fn starting(&self, service: &str) -> Result<bool> {
        match self.ps(service).await {
            Ok(row) => Ok(row.is_starting()),
            Err(Error::ServiceNotFound { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Runs a command inside the container of `service` without a TTY.
    pub async fn exec(&self, service: &str, command: &[&str]) -> Result<String> {
        let mut args = vec!["exec", "-T", service];
        args.extend_from_slice(command);
        self.run_compose_command(&args).await
    }

    /// Container id of `service`, `None` when it has no running container.
    pub async fn container_id(&self, service: &str) -> Result<Option<String>> {
        let out = self.run_compose_command(&["ps", "-q", service]).await?;
        let id = out.trim();
        Ok((!id.is_empty()).then(|| id.to_string()))
    }

    /// Types `text` into the attached console of `service`.
    ///
    /// `docker compose attach` needs a terminal, so the input goes through `socat` with a
    /// pseudo-terminal on the attach side.
    pub async fn send_to_stdin(&self, service: &str, text: &str) -> Result<()> {
        let attach = format!(
            "EXEC:docker compose --project-directory {} attach {service},pty",
            self.project_dir.display()
        );
        let args = [attach, "STDIN".to_string()];
        self.runner
            .run_with_stdin("socat", &args, &format!("{text}\n"))
            .await
            .map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docker::testing::ScriptedRunner;

    const PROJECT: &str = "/srv/mc/survival";

    fn compose(runner: ScriptedRunner) -> (Arc<ScriptedRunner>, ComposeManager<ScriptedRunner>) {
        let runner = Arc::new(runner);
        (Arc::clone(&runner), ComposeManager::new(runner, PROJECT))
    }

    fn cmd(args: &str) -> String {
        format!("docker compose --project-directory {PROJECT} {args}")
    }

    #[tokio::test]
    async fn test_lifecycle_commands() {
        let (runner, manager) = compose(
            ScriptedRunner::new()
                .on(&cmd("up -d"), "")
                .on(&cmd("down"), "")
                .on(&cmd("start"), "")
                .on(&cmd("stop"), "")
                .on(&cmd("restart"), "")
                .on(&cmd("pull"), ""),
        );
        manager.up_detached().await.unwrap();
        manager.down().await.unwrap();
        manager.start().await.unwrap();
        manager.stop().await.unwrap();
        manager.restart().await.unwrap();
        manager.pull().await.unwrap();
        assert_eq!(
            runner.calls(),
            ["up -d", "down", "start", "stop", "restart", "pull"]
                .map(cmd)
                .to_vec()
        );
    }

    #[tokio::test]
    async fn test_running_and_created() {
        let (_, manager) = compose(
            ScriptedRunner::new()
                .on(&cmd("ps -q"), "\n")
                .on(&cmd("ps --all -q"), "0123abcd\n"),
        );
        assert!(!manager.running().await.unwrap());
        assert!(manager.created().await.unwrap());
    }

    #[tokio::test]
    async fn test_health_states() {
        let ps = cmd("ps --no-trunc --format json");
        let (_, manager) = compose(
            ScriptedRunner::new()
                .on(&ps, r#"{"Service":"mc","Health":"starting"}"#)
                .on(&ps, r#"{"Service":"mc","Health":"starting"}"#)
                .on(&ps, r#"{"Service":"mc","Health":"healthy"}"#)
                .on(&ps, ""),
        );
        assert!(manager.starting("mc").await.unwrap());
        assert!(!manager.healthy("mc").await.unwrap());
        assert!(manager.healthy("mc").await.unwrap());
        // Service gone.
        assert!(!manager.healthy("mc").await.unwrap());
        assert!(!manager.starting("mc").await.unwrap());
        assert!(matches!(
            manager.ps("mc").await,
            Err(Error::ServiceNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_command_failure_propagates() {
        let (_, manager) = compose(ScriptedRunner::new().fail(
            &cmd("ps --no-trunc --format json"),
            1,
            "no configuration file provided",
        ));
        match manager.healthy("mc").await {
            Err(Error::CommandFailed { stderr, .. }) => {
                assert_eq!(stderr, "no configuration file provided")
            }
            other => panic!("Expected CommandFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_exec_and_container_id() {
        let (runner, manager) = compose(
            ScriptedRunner::new()
                .on(&cmd("exec -T mc rcon-cli list"), "There are 0 of a max of 20 players online: \n")
                .on(&cmd("ps -q mc"), "0123abcd\n")
                .on(&cmd("logs --tail 50"), "mc-1 | Done\n"),
        );
        let out = manager.exec("mc", &["rcon-cli", "list"]).await.unwrap();
        assert!(out.starts_with("There are 0"));
        assert_eq!(manager.container_id("mc").await.unwrap().as_deref(), Some("0123abcd"));
        assert_eq!(manager.logs(50).await.unwrap(), "mc-1 | Done\n");
        assert_eq!(runner.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_send_to_stdin() {
        let attach = format!(
            "socat EXEC:docker compose --project-directory {PROJECT} attach mc,pty STDIN"
        );
        let (runner, manager) = compose(ScriptedRunner::new().on(&attach, ""));
        manager.send_to_stdin("mc", "say hello").await.unwrap();
        assert_eq!(runner.inputs(), ["say hello\n"]);
    }
}
