//! Validation of compose documents that describe a Minecraft server.
//!
//! A valid document has a service named `mc` with a container name starting with `mc-`,
//! an `itzg/minecraft-server` image, a `VERSION` environment variable, and port entries
//! targeting the game port (25565) and the RCON port (25575). [`McComposeFile`] checks all
//! of that once, at construction, so its accessors can rely on the shape afterwards.

mod error;
mod properties;

use std::path::Path;

use crate::compose::{ComposeDocument, Environment, PortMapping, ServiceSpec, VolumeMapping};

pub use error::{Result, ValidationError};
pub use properties::{
    DEFAULT_JAVA_VERSION, DEFAULT_MEMORY, ServerType, java_version_from_image, parse_memory_size,
};

pub const MC_SERVICE: &str = "mc";
pub const CONTAINER_PREFIX: &str = "mc-";
pub const SERVER_IMAGE: &str = "itzg/minecraft-server";
pub const GAME_PORT: u16 = 25565;
pub const RCON_PORT: u16 = 25575;
pub const DEFAULT_RESTART: &str = "unless-stopped";

/// A compose document known to describe a Minecraft server.
///
/// `mc` is the validated `mc` service of `document`. Neither is mutated after construction;
/// edits go through [`McComposeFile::with_document`], which validates a new copy.
#[derive(Debug, Clone, PartialEq)]
pub struct McComposeFile {
    document: ComposeDocument,
    mc: ServiceSpec,
}

impl TryFrom<ComposeDocument> for McComposeFile {
    type Error = ValidationError;

    fn try_from(document: ComposeDocument) -> Result<Self> {
        Self::new(document)
    }
}

impl McComposeFile {
    /// Validates `document`.
    ///
    /// # Errors
    ///
    /// The first [`ValidationError`] the document violates, checked in this order:
    /// services, `mc` service, container name, image, environment, `VERSION`, ports,
    /// game port, RCON port.
    pub fn new(document: ComposeDocument) -> Result<Self> {
        let mc = validate(&document)?.clone();
        Ok(Self { document, mc })
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Self::new(ComposeDocument::from_yaml_str(yaml)?)
    }

    pub async fn async_from_file(path: &Path) -> Result<Self> {
        Self::new(ComposeDocument::async_from_file(path).await?)
    }

    fn mc(&self) -> &ServiceSpec {
        &self.mc
    }

    fn environment(&self) -> Option<&Environment> {
        self.mc().environment.as_ref()
    }

    fn env_var(&self, key: &str) -> Option<&str> {
        self.environment()?.get(key).map(String::as_str)
    }

    pub fn get_server_name(&self) -> &str {
        let name = self.mc().container_name.as_deref().unwrap_or_default();
        name.strip_prefix(CONTAINER_PREFIX).unwrap_or(name)
    }

    pub fn container_name(&self) -> &str {
        self.mc().container_name.as_deref().unwrap_or_default()
    }

    pub fn get_game_version(&self) -> &str {
        self.env_var("VERSION").unwrap_or_default()
    }

    pub fn image(&self) -> &str {
        self.mc().image.as_deref().unwrap_or_default()
    }

    /// Host port of the game port mapping, or 25565 when it is not published explicitly.
    ///
    /// # Errors
    ///
    /// [`ValidationError::GamePortNotFound`] if the mapping is gone,
    /// [`ValidationError::InvalidPublishedPort`] if it publishes a range.
    pub fn get_game_port(&self) -> Result<u16> {
        self.resolve_port(GAME_PORT, ValidationError::GamePortNotFound)
    }

    /// Host port of the RCON port mapping, or 25575 when it is not published explicitly.
    pub fn get_rcon_port(&self) -> Result<u16> {
        self.resolve_port(RCON_PORT, ValidationError::RconPortNotFound)
    }

    fn resolve_port(&self, target: u16, missing: ValidationError) -> Result<u16> {
        let port = self
            .ports()
            .iter()
            .find(|p| p.targets(target))
            .ok_or(missing)?;
        match port.published.as_deref() {
            None => Ok(target),
            Some(published) => published
                .parse()
                .map_err(|_| ValidationError::InvalidPublishedPort {
                    target,
                    published: published.to_string(),
                }),
        }
    }

    pub fn ports(&self) -> &[PortMapping] {
        self.mc().ports.as_deref().unwrap_or_default()
    }

    pub fn get_java_version(&self) -> u32 {
        java_version_from_image(self.image()).unwrap_or(DEFAULT_JAVA_VERSION)
    }

    /// Heap limit in bytes, from `MAX_MEMORY`, then `MEMORY`, then the image default.
    pub fn get_max_memory_bytes(&self) -> u64 {
        let configured = self
            .env_var("MAX_MEMORY")
            .or_else(|| self.env_var("MEMORY"))
            .filter(|v| !v.is_empty());
        configured
            .and_then(|value| {
                let parsed = parse_memory_size(value);
                if parsed.is_none() {
                    log::warn!(
                        "unparsable memory size `{value}` for server {}",
                        self.get_server_name()
                    );
                }
                parsed
            })
            .or_else(|| parse_memory_size(DEFAULT_MEMORY))
            .unwrap_or(1 << 30)
    }

    pub fn get_server_type(&self) -> ServerType {
        self.env_var("TYPE")
            .filter(|v| !v.is_empty())
            .map(ServerType::parse)
            .unwrap_or_default()
    }

    pub fn stdin_open(&self) -> bool {
        self.mc().stdin_open.unwrap_or(false)
    }

    pub fn tty(&self) -> bool {
        self.mc().tty.unwrap_or(false)
    }

    pub fn restart(&self) -> &str {
        self.mc().restart.as_deref().unwrap_or(DEFAULT_RESTART)
    }

    pub fn volumes(&self) -> &[VolumeMapping] {
        self.mc().volumes.as_deref().unwrap_or_default()
    }

    pub fn document(&self) -> &ComposeDocument {
        &self.document
    }

    /// The document ready to serialize, including any copy-on-write edits.
    pub fn to_document(&self) -> ComposeDocument {
        self.document.clone()
    }

    /// Consumes the wrapper, returning the document ready to serialize.
    pub fn into_document(self) -> ComposeDocument {
        self.document
    }

    /// Returns a copy whose game port is published on `port`.
    pub fn with_game_port(&self, port: u16) -> Result<Self> {
        self.with_published_port(GAME_PORT, port)
    }

    /// Returns a copy whose RCON port is published on `port`.
    pub fn with_rcon_port(&self, port: u16) -> Result<Self> {
        self.with_published_port(RCON_PORT, port)
    }

    fn with_published_port(&self, target: u16, port: u16) -> Result<Self> {
        self.with_document(|doc| {
            let ports = doc
                .service_mut(MC_SERVICE)
                .and_then(|mc| mc.ports.as_mut())
                .into_iter()
                .flatten();
            for mapping in ports.filter(|p| p.targets(target)) {
                mapping.published = Some(port.to_string());
            }
        })
    }

    /// Applies `edit` to a copy of the document and validates the result.
    /// `self` is left untouched whether or not the edit produces a valid document.
    pub fn with_document(&self, edit: impl FnOnce(&mut ComposeDocument)) -> Result<Self> {
        let mut document = self.document.clone();
        edit(&mut document);
        Self::new(document)
    }
}

/// Checks every invariant and returns the `mc` service.
fn validate(document: &ComposeDocument) -> Result<&ServiceSpec> {
    let services = document
        .services
        .as_ref()
        .ok_or(ValidationError::MissingServices)?;
    let mc = services
        .get(MC_SERVICE)
        .ok_or(ValidationError::MissingMcService)?;

    let container_name = mc
        .container_name
        .as_deref()
        .ok_or(ValidationError::InvalidContainerName)?;
    if !container_name.starts_with(CONTAINER_PREFIX) {
        return Err(ValidationError::ContainerNamePrefix);
    }

    if !mc.image.as_deref().is_some_and(|i| i.contains(SERVER_IMAGE)) {
        return Err(ValidationError::InvalidImage);
    }

    let environment = mc
        .environment
        .as_ref()
        .ok_or(ValidationError::InvalidEnvironment)?;
    if !environment.contains_key("VERSION") {
        return Err(ValidationError::MissingVersion);
    }

    let ports = mc.ports.as_deref().ok_or(ValidationError::MissingPorts)?;
    if !ports.iter().any(|p| p.targets(GAME_PORT)) {
        return Err(ValidationError::MissingGamePort);
    }
    if !ports.iter().any(|p| p.targets(RCON_PORT)) {
        return Err(ValidationError::MissingRconPort);
    }

    Ok(mc)
}
