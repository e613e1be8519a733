use std::num::ParseIntError;
use std::path::PathBuf;
use std::time::Duration;

pub const LOGGING_LEVEL_VAR: &str = "MDDW_LOGGING_LEVEL";
pub const BIND_HOST_VAR: &str = "MDDW_BIND_HOST";
pub const BIND_PORT_VAR: &str = "MDDW_BIND_PORT";
pub const DB_PATH_VAR: &str = "MDDW_DB_PATH";
pub const SERVERS_PATH_VAR: &str = "MDDW_SERVERS_PATH";
pub const POLL_INTERVAL_VAR: &str = "MDDW_POLL_INTERVAL";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("environment variable `{variable}` must be a number, got `{value}`: {source}")]
    InvalidNumber {
        variable: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
    #[error("environment variable `{variable}` must be greater than zero")]
    Zero { variable: &'static str },
}

/// Settings of the directory watcher service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// `env_logger` filter string.
    pub logging_level: String,
    pub bind_host: String,
    pub bind_port: u16,
    pub db_path: PathBuf,
    pub servers_path: PathBuf,
    pub poll_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging_level: "info".to_string(),
            bind_host: "0.0.0.0".to_string(),
            bind_port: 80,
            db_path: PathBuf::from("/data/mc-docker.db"),
            servers_path: PathBuf::from("/watch"),
            poll_interval: Duration::from_secs(5),
        }
    }
}

impl Config {
    /// Reads the `MDDW_*` environment variables, falling back to the defaults.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|variable| std::env::var(variable).ok())
    }

    /// Like [`Config::from_env`], with variables looked up through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let defaults = Self::default();

        let poll_interval_secs: u64 =
            parse_number(&lookup, POLL_INTERVAL_VAR, defaults.poll_interval.as_secs())?;
        if poll_interval_secs == 0 {
            return Err(Error::Zero {
                variable: POLL_INTERVAL_VAR,
            });
        }

        Ok(Self {
            logging_level: lookup(LOGGING_LEVEL_VAR).unwrap_or(defaults.logging_level),
            bind_host: lookup(BIND_HOST_VAR).unwrap_or(defaults.bind_host),
            bind_port: parse_number(&lookup, BIND_PORT_VAR, defaults.bind_port)?,
            db_path: lookup(DB_PATH_VAR).map_or(defaults.db_path, PathBuf::from),
            servers_path: lookup(SERVERS_PATH_VAR).map_or(defaults.servers_path, PathBuf::from),
            poll_interval: Duration::from_secs(poll_interval_secs),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.bind_port)
    }
}

fn parse_number<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    variable: &'static str,
    default: T,
) -> Result<T, Error>
where
    T: std::str::FromStr<Err = ParseIntError>,
{
    match lookup(variable) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|source| Error::InvalidNumber {
            variable,
            value,
            source,
        }),
    }
}
