/// Entry point of the Minecraft directory watcher.
///
/// Watches a directory of Minecraft compose projects, keeps their game ports in a SQLite
/// database and notifies websocket clients about changes. Configuration is read from the
/// `MDDW_*` environment variables.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the database cannot be opened or the
/// HTTP API cannot be served.
///
/// # Examples
///
/// ```bash
/// MDDW_SERVERS_PATH=/srv/minecraft MDDW_DB_PATH=./mc-docker.db MDDW_BIND_PORT=8080 cargo run
/// ```
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let config = mc_docker_manager::watcher::Config::from_env()?;
    mc_docker_manager::logging::init(&config.logging_level)?;
    mc_docker_manager::run(config).await
}
