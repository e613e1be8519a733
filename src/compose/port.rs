//! Port mappings of a compose service.
//!
//! A port entry may be written as an object or in one of the short forms:
//!
//! ```text
//! "3000"                          target only
//! "3000-3005"                     target range
//! "8000:8000"                     published:target
//! "9090-9091:8080-8081"           published range : target range
//! "127.0.0.1:8001:8001"           host_ip:published:target
//! "6060:6060/udp"                 any of the above with a protocol suffix
//! ```
//!
//! Bare numbers are accepted too; a float is truncated to its integer part first. Floats
//! that are negative or not finite are invalid.

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use super::scalar;
use super::{Error, Result};

/// The canonical, structured form of a port entry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PortMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_ip: Option<String>,
    /// In-container port or port range.
    pub target: String,
    /// Host-side port or port range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_protocol: Option<String>,
    /// Keys kept as written, such as `x-*` extensions.
    #[serde(flatten)]
    pub extra: Mapping,
}

/// `80` or `8000-8010`.
fn is_port_or_range(s: &str) -> bool {
    let digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
    match s.split_once('-') {
        Some((lo, hi)) => digits(lo) && digits(hi),
        None => digits(s),
    }
}

impl PortMapping {
    /// Creates a mapping publishing `target` on the host as `published`.
    pub fn new(published: Option<&str>, target: &str) -> Self {
        Self {
            target: target.to_string(),
            published: published.map(str::to_string),
            ..Self::default()
        }
    }

    /// Parses one of the short string forms.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidPort`] if `spec` matches none of the accepted shapes.
    pub fn parse(spec: &str) -> Result<Self> {
        let invalid = || Error::InvalidPort(spec.to_string());

        let (rest, protocol) = match spec.split_once('/') {
            Some((_, protocol)) if protocol.is_empty() || protocol.contains('/') => {
                return Err(invalid());
            }
            Some((rest, protocol)) => (rest, Some(protocol.to_string())),
            None => (spec, None),
        };

        let parts: Vec<&str> = rest.split(':').collect();
        let (host_ip, published, target) = match parts.as_slice() {
            [target] => (None, None, *target),
            [published, target] => (None, Some(*published), *target),
            [host_ip, published, target] if !host_ip.is_empty() => {
                // `127.0.0.1::80` lets the engine pick the host port.
                let published = Some(*published).filter(|p| !p.is_empty());
                (Some(*host_ip), published, *target)
            }
            _ => return Err(invalid()),
        };

        if !is_port_or_range(target) || published.is_some_and(|p| !is_port_or_range(p)) {
            return Err(invalid());
        }

        Ok(Self {
            host_ip: host_ip.map(str::to_string),
            target: target.to_string(),
            published: published.map(str::to_string),
            protocol,
            ..Self::default()
        })
    }

    /// Resolves any accepted representation of a port entry.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidPort`] for malformed short forms or unsupported value kinds,
    /// [`Error::Yaml`] for objects missing `target`.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(spec) => Self::parse(spec),
            Value::Number(n) => {
                let port = match n.as_i64() {
                    Some(i) => i,
                    None => n
                        .as_f64()
                        .filter(|f| f.is_finite() && *f >= 0.0 && *f < i64::MAX as f64)
                        .map(|f| f.trunc() as i64)
                        .ok_or_else(|| Error::InvalidPort(n.to_string()))?,
                };
                Self::parse(&port.to_string())
            }
            Value::Mapping(map) => {
                let mut map = map.clone();
                for key in ["target", "published"] {
                    if let Some(v) = map.get_mut(key) {
                        if let Some(s) = scalar::to_string(v) {
                            *v = Value::String(s);
                        }
                    }
                }
                Ok(serde_yaml::from_value(Value::Mapping(map))?)
            }
            other => Err(Error::InvalidPort(format!("{other:?}"))),
        }
    }

    /// The published port as a number, if it is a single port rather than a range.
    pub fn published_port(&self) -> Option<u16> {
        self.published.as_deref()?.parse().ok()
    }

    /// Whether the in-container side of the mapping is exactly `port`.
    pub fn targets(&self, port: u16) -> bool {
        self.target.parse::<u16>().is_ok_and(|t| t == port)
    }
}
