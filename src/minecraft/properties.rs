use std::fmt;

use serde::{Serialize, Serializer};

/// Java major version used when the image tag does not name one.
pub const DEFAULT_JAVA_VERSION: u32 = 21;

/// Heap limit the server image applies when neither `MAX_MEMORY` nor `MEMORY` is set.
pub const DEFAULT_MEMORY: &str = "1G";

/// The server distribution selected through the `TYPE` variable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ServerType {
    #[default]
    Vanilla,
    Paper,
    Spigot,
    Bukkit,
    Purpur,
    Forge,
    NeoForge,
    Fabric,
    Quilt,
    /// A type this crate has no name for, kept as written.
    Other(String),
}

impl ServerType {
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "VANILLA" => ServerType::Vanilla,
            "PAPER" => ServerType::Paper,
            "SPIGOT" => ServerType::Spigot,
            "BUKKIT" => ServerType::Bukkit,
            "PURPUR" => ServerType::Purpur,
            "FORGE" => ServerType::Forge,
            "NEOFORGE" => ServerType::NeoForge,
            "FABRIC" => ServerType::Fabric,
            "QUILT" => ServerType::Quilt,
            _ => ServerType::Other(value.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ServerType::Vanilla => "VANILLA",
            ServerType::Paper => "PAPER",
            ServerType::Spigot => "SPIGOT",
            ServerType::Bukkit => "BUKKIT",
            ServerType::Purpur => "PURPUR",
            ServerType::Forge => "FORGE",
            ServerType::NeoForge => "NEOFORGE",
            ServerType::Fabric => "FABRIC",
            ServerType::Quilt => "QUILT",
            ServerType::Other(other) => other,
        }
    }
}

impl fmt::Display for ServerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ServerType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Parses a JVM-style memory size such as `512M`, `2G` or `1073741824`.
///
/// Suffixes `K`, `M`, `G` and `T` (either case, optionally followed by `B`) are binary
/// multiples; a lone `B` means bytes. Fractional amounts like `1.5G` are accepted and rounded down to whole bytes.
pub fn parse_memory_size(value: &str) -> Option<u64> {
    let value = value.trim();
    let value = value
        .strip_suffix(['b', 'B'])
        .filter(|rest| rest.ends_with(|c: char| c.is_ascii_alphanumeric()))
        .unwrap_or(value);

    let (number, multiplier) = match value.chars().last()? {
        'k' | 'K' => (&value[..value.len() - 1], 1u64 << 10),
        'm' | 'M' => (&value[..value.len() - 1], 1 << 20),
        'g' | 'G' => (&value[..value.len() - 1], 1 << 30),
        't' | 'T' => (&value[..value.len() - 1], 1 << 40),
        _ => (value, 1),
    };

    if let Ok(whole) = number.parse::<u64>() {
        return whole.checked_mul(multiplier);
    }
    let fractional: f64 = number.parse().ok()?;
    if !fractional.is_finite() || fractional < 0.0 {
        return None;
    }
    Some((fractional * multiplier as f64) as u64)
}

/// Reads the Java major version from an image reference like
/// `itzg/minecraft-server:java21-alpine`.
pub fn java_version_from_image(image: &str) -> Option<u32> {
    let (_, tag) = image.rsplit_once(':')?;
    let (_, rest) = tag.split_once("java")?;
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}
