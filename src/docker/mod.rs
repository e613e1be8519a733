//! Thin wrappers over the `docker` and `docker compose` command line tools.
//!
//! All process execution goes through [`CommandRunner`], so everything above this module
//! can be exercised without a docker daemon.

mod compose;
mod error;
mod manager;
pub mod models;
mod runner;
#[cfg(test)]
pub(crate) mod testing;

pub use compose::ComposeManager;
pub use error::{Error, Result};
pub use manager::DockerManager;
pub use models::{ComposePsEntry, DockerPsEntry, Publisher, parse_labels};
pub use runner::{CommandRunner, ProcessRunner, command_line};

/// Label docker compose puts on containers listing the project's compose files.
pub const CONFIG_FILES_LABEL: &str = "com.docker.compose.project.config_files";
