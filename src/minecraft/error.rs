use crate::compose;

/// Why a compose document is not a usable Minecraft server definition.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Could not find services in compose file")]
    MissingServices,

    #[error("Could not find service mc in compose file")]
    MissingMcService,

    #[error("Invalid container name in compose file")]
    InvalidContainerName,

    #[error("Container name must start with 'mc-'")]
    ContainerNamePrefix,

    #[error("Service must use itzg/minecraft-server image")]
    InvalidImage,

    #[error("Invalid environment in compose file")]
    InvalidEnvironment,

    #[error("Could not find VERSION in environment")]
    MissingVersion,

    #[error("Could not find ports in compose file")]
    MissingPorts,

    #[error("Could not find game port (25565) in compose file")]
    MissingGamePort,

    #[error("Could not find rcon port (25575) in compose file")]
    MissingRconPort,

    #[error("Could not find game port in compose file")]
    GamePortNotFound,

    #[error("Could not find rcon port in compose file")]
    RconPortNotFound,

    #[error("published port `{published}` for target {target} is not a single port")]
    InvalidPublishedPort { target: u16, published: String },

    #[error(transparent)]
    Document(#[from] compose::Error),
}

pub type Result<T> = std::result::Result<T, ValidationError>;
