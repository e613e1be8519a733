use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_yaml::{Mapping, Value};

use super::environment::{self, Environment};
use super::{Error, PortMapping, Result, VolumeMapping};

/// One entry of the `services` section.
///
/// Ports, volumes and environment are held in their canonical forms. Keys this model does
/// not name are kept in `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ServiceSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ports: Option<Vec<PortMapping>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volumes: Option<Vec<VolumeMapping>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdin_open: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tty: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart: Option<String>,
    #[serde(flatten)]
    pub extra: Mapping,
}

impl ServiceSpec {
    /// Builds a service from its raw YAML, resolving the short forms of ports, volumes
    /// and environment first.
    pub fn from_value(name: &str, value: Value) -> Result<Self> {
        let mut map = match value {
            Value::Mapping(map) => map,
            Value::Null => Mapping::new(),
            other => {
                return Err(Error::InvalidDocument(format!(
                    "service `{name}` must be a mapping, got {other:?}"
                )));
            }
        };

        let ports = match map.remove("ports") {
            None | Some(Value::Null) => None,
            Some(Value::Sequence(entries)) => Some(
                entries
                    .iter()
                    .map(PortMapping::from_value)
                    .collect::<Result<Vec<_>>>()?,
            ),
            Some(other) => return Err(Error::InvalidPort(format!("{other:?}"))),
        };
        let volumes = match map.remove("volumes") {
            None | Some(Value::Null) => None,
            Some(Value::Sequence(entries)) => Some(
                entries
                    .iter()
                    .map(VolumeMapping::from_value)
                    .collect::<Result<Vec<_>>>()?,
            ),
            Some(other) => return Err(Error::InvalidVolume(format!("{other:?}"))),
        };
        let environment = match map.remove("environment") {
            None | Some(Value::Null) => None,
            Some(value) => Some(environment::normalize(&value)?),
        };

        let mut service: ServiceSpec = serde_yaml::from_value(Value::Mapping(map))?;
        service.ports = ports;
        service.volumes = volumes;
        service.environment = environment;
        Ok(service)
    }
}

/// Services keyed by name, in document order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServiceMap(Vec<(String, ServiceSpec)>);

impl ServiceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&ServiceSpec> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ServiceSpec> {
        self.0.iter_mut().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Replaces the service in place if the name exists, otherwise appends it.
    pub fn insert(&mut self, name: impl Into<String>, service: ServiceSpec) -> Option<ServiceSpec> {
        let name = name.into();
        match self.get_mut(&name) {
            Some(existing) => Some(std::mem::replace(existing, service)),
            None => {
                self.0.push((name, service));
                None
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<ServiceSpec> {
        let index = self.0.iter().position(|(n, _)| n == name)?;
        Some(self.0.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ServiceSpec)> {
        self.0.iter().map(|(n, s)| (n.as_str(), s))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, ServiceSpec)> for ServiceMap {
    fn from_iter<I: IntoIterator<Item = (String, ServiceSpec)>>(iter: I) -> Self {
        let mut map = ServiceMap::new();
        for (name, service) in iter {
            map.insert(name, service);
        }
        map
    }
}

impl Serialize for ServiceMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, service) in &self.0 {
            map.serialize_entry(name, service)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ServiceMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ServiceMapVisitor;

        impl<'de> Visitor<'de> for ServiceMapVisitor {
            type Value = ServiceMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a mapping of service names to services")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
                let mut map = ServiceMap::new();
                while let Some((name, service)) = access.next_entry::<String, ServiceSpec>()? {
                    map.insert(name, service);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(ServiceMapVisitor)
    }
}
