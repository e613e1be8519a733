use std::future::Future;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::{Error, Result};

/// Runs external programs and returns their standard output.
///
/// Implementations must report a non-zero exit as [`Error::CommandFailed`] carrying the
/// command line and the captured standard error.
pub trait CommandRunner: Send + Sync + 'static {
    fn run(&self, program: &str, args: &[String]) -> impl Future<Output = Result<String>> + Send;

    /// Like [`CommandRunner::run`], writing `input` to the program's standard input first.
    fn run_with_stdin(
        &self,
        program: &str,
        args: &[String],
        input: &str,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// Renders a command line for logs and error messages.
pub fn command_line(program: &str, args: &[String]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

/// Runs commands as child processes of this one.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    fn command(program: &str, args: &[String]) -> Command {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    fn finish(command: String, output: std::process::Output) -> Result<String> {
        if !output.status.success() {
            return Err(Error::CommandFailed {
                command,
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl CommandRunner for ProcessRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<String> {
        let command = command_line(program, args);
        log::debug!("running `{command}`");

        let output = Self::command(program, args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| Error::Spawn {
                command: command.clone(),
                source,
            })?;
        Self::finish(command, output)
    }

    async fn run_with_stdin(&self, program: &str, args: &[String], input: &str) -> Result<String> {
        let command = command_line(program, args);
        log::debug!("running `{command}` with {} bytes of input", input.len());

        let spawn_err = |source| Error::Spawn {
            command: command.clone(),
            source,
        };
        let mut child = Self::command(program, args)
            .stdin(Stdio::piped())
            .spawn()
            .map_err(spawn_err)?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(input.as_bytes()).await.map_err(spawn_err)?;
            // Closing stdin signals end of input.
            drop(stdin);
        }

        let output = child.wait_with_output().await.map_err(spawn_err)?;
        Self::finish(command, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_command_line() {
        assert_eq!(command_line("docker", &args(&["ps", "-q"])), "docker ps -q");
        assert_eq!(command_line("true", &[]), "true");
    }

    #[tokio::test]
    async fn test_process_runner_captures_stdout() {
        let out = ProcessRunner.run("echo", &args(&["hello"])).await.unwrap();
        assert_eq!(out, "hello\n");
    }

    #[tokio::test]
    async fn test_process_runner_reports_failure() {
        let err = ProcessRunner
            .run("sh", &args(&["-c", "echo oops >&2; exit 3"]))
            .await
            .unwrap_err();
        match err {
            Error::CommandFailed {
                command,
                status,
                stderr,
            } => {
                assert_eq!(command, "sh -c echo oops >&2; exit 3");
                assert_eq!(status, Some(3));
                assert_eq!(stderr, "oops");
            }
            other => panic!("Expected CommandFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_process_runner_missing_binary() {
        let err = ProcessRunner
            .run("definitely-not-a-real-binary-42", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_process_runner_writes_stdin() {
        let out = ProcessRunner
            .run_with_stdin("cat", &[], "say hi\n")
            .await
            .unwrap();
        assert_eq!(out, "say hi\n");
    }
}
