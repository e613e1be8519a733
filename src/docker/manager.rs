use std::sync::Arc;

use super::models::{DockerPsEntry, parse_json_rows};
use super::{CommandRunner, Error, Result};

/// Queries the docker engine directly, outside of any compose project.
#[derive(Debug)]
pub struct DockerManager<R> {
    runner: Arc<R>,
}

impl<R> Clone for DockerManager<R> {
    fn clone(&self) -> Self {
        Self {
            runner: Arc::clone(&self.runner),
        }
    }
}

impl<R: CommandRunner> DockerManager<R> {
    pub fn new(runner: Arc<R>) -> Self {
        Self { runner }
    }

    async fn docker(&self, args: &[&str]) -> Result<String> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        self.runner.run("docker", &args).await
    }

    /// All running containers.
    pub async fn ps(&self) -> Result<Vec<DockerPsEntry>> {
        let out = self.docker(&["ps", "--no-trunc", "--format", "json"]).await?;
        parse_json_rows("docker ps", &out)
    }

    /// Host PID of the main process of a running container.
    pub async fn inspect_pid(&self, container_id: &str) -> Result<u32> {
        let out = self
            .docker(&["inspect", "--format={{.State.Pid}}", container_id])
            .await?;
        let invalid = || Error::InvalidPid {
            container_id: container_id.to_string(),
            output: out.trim().to_string(),
        };
        match out.trim().parse::<u32>() {
            Ok(0) | Err(_) => Err(invalid()),
            Ok(pid) => Ok(pid),
        }
    }
}
