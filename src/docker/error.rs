use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to launch `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("command `{command}` failed with {}: {stderr}", exit_status(.status))]
    CommandFailed {
        command: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("failed to decode {what} output: {source}")]
    Json {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not find service {service}")]
    ServiceNotFound { service: String },

    #[error("could not retrieve PID for container {container_id}: got `{output}`")]
    InvalidPid { container_id: String, output: String },
}

fn exit_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit code {code}"),
        None => "no exit code".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, Error>;
