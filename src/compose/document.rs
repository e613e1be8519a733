use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use super::{Error, Result, ServiceMap, ServiceSpec, scalar};
use crate::fsutil;

/// A docker compose file.
///
/// Loading resolves every short form into its canonical shape, so writing a document out
/// and reading it back yields an equal document. Top-level keys without a dedicated field
/// survive in `extra`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ComposeDocument {
    #[serde(
        default,
        deserialize_with = "scalar::optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services: Option<ServiceMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub networks: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volumes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secrets: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configs: Option<Value>,
    #[serde(flatten)]
    pub extra: Mapping,
}

impl ComposeDocument {
    /// Builds a document from parsed YAML. An empty document is valid and has no services.
    ///
    /// # Errors
    ///
    /// Fails if the root is not a mapping, a service is malformed, or a port, volume or
    /// environment entry cannot be normalized.
    pub fn from_value(value: Value) -> Result<Self> {
        let mut root = match value {
            Value::Mapping(map) => map,
            Value::Null => Mapping::new(),
            other => {
                return Err(Error::InvalidDocument(format!(
                    "expected a mapping at the top level, got {other:?}"
                )));
            }
        };

        let services = match root.remove("services") {
            None | Some(Value::Null) => None,
            Some(Value::Mapping(raw)) => Some(
                raw.into_iter()
                    .map(|(name, service)| {
                        let name = scalar::to_string(&name).ok_or_else(|| {
                            Error::InvalidDocument(format!("invalid service name {name:?}"))
                        })?;
                        let service = ServiceSpec::from_value(&name, service)?;
                        Ok((name, service))
                    })
                    .collect::<Result<ServiceMap>>()?,
            ),
            Some(other) => {
                return Err(Error::InvalidDocument(format!(
                    "`services` must be a mapping, got {other:?}"
                )));
            }
        };

        let mut document: ComposeDocument = serde_yaml::from_value(Value::Mapping(root))?;
        document.services = services;
        Ok(document)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Self::from_value(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| {
            Error::from(fsutil::FileError {
                path: path.to_path_buf(),
                source,
            })
        })?;
        Self::from_yaml_str(&content)
    }

    pub async fn async_from_file(path: &Path) -> Result<Self> {
        let content = fsutil::read_to_string(path).await?;
        Self::from_yaml_str(&content)
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_yaml::to_value(self)?)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn to_file(&self, path: &Path) -> Result<()> {
        let yaml = self.to_yaml_string()?;
        std::fs::write(path, yaml).map_err(|source| {
            Error::from(fsutil::FileError {
                path: path.to_path_buf(),
                source,
            })
        })
    }

    pub async fn async_to_file(&self, path: &Path) -> Result<()> {
        let yaml = self.to_yaml_string()?;
        fsutil::write_string(path, &yaml).await?;
        Ok(())
    }

    pub fn service(&self, name: &str) -> Option<&ServiceSpec> {
        self.services.as_ref()?.get(name)
    }

    pub fn service_mut(&mut self, name: &str) -> Option<&mut ServiceSpec> {
        self.services.as_mut()?.get_mut(name)
    }
}
