use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use super::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeType {
    Bind,
    Volume,
    Tmpfs,
    Npipe,
    Cluster,
    Image,
}

/// The canonical, structured form of a volume entry.
///
/// Short forms are `source:target` and `source:target:options`. A source that looks like a
/// path (`/`, `.` or `~` prefix) is a bind mount, anything else names a volume. The `ro`
/// option makes the mount read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeMapping {
    #[serde(rename = "type")]
    pub kind: VolumeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub target: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
    /// Long-form options such as `bind` or `volume` settings, kept as written.
    #[serde(flatten)]
    pub extra: Mapping,
}

impl VolumeMapping {
    /// Parses the `source:target[:options]` short form.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidVolume`] if the entry does not have two or three non-empty parts.
    pub fn parse(spec: &str) -> Result<Self> {
        let invalid = || Error::InvalidVolume(spec.to_string());

        let (source, target, options) = match spec.split(':').collect::<Vec<_>>().as_slice() {
            [source, target] => (*source, *target, ""),
            [source, target, options] => (*source, *target, *options),
            _ => return Err(invalid()),
        };
        if source.is_empty() || target.is_empty() {
            return Err(invalid());
        }

        let kind = if source.starts_with(['/', '.', '~']) {
            VolumeType::Bind
        } else {
            VolumeType::Volume
        };

        Ok(Self {
            kind,
            source: Some(source.to_string()),
            target: target.to_string(),
            read_only: options.split(',').any(|opt| opt == "ro"),
            extra: Mapping::new(),
        })
    }

    /// Resolves a short-form string or a long-form object.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(spec) => Self::parse(spec),
            Value::Mapping(_) => Ok(serde_yaml::from_value(value.clone())?),
            other => Err(Error::InvalidVolume(format!("{other:?}"))),
        }
    }
}
