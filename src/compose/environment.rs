use std::collections::BTreeMap;

use serde_yaml::Value;

use super::scalar;
use super::{Error, Result};

pub type Environment = BTreeMap<String, String>;

/// Normalizes either environment form into a string map.
///
/// The list form holds `KEY=VALUE` entries; only the first `=` separates, and an entry
/// without one maps the key to an empty value. In the map form scalar values are rendered
/// as strings and null becomes the empty string.
///
/// # Errors
///
/// [`Error::InvalidEnvironment`] for empty keys, nested values, or a value that is neither
/// a list nor a map.
pub fn normalize(value: &Value) -> Result<Environment> {
    match value {
        Value::Sequence(entries) => entries
            .iter()
            .map(|entry| {
                let entry = scalar::to_string(entry)
                    .ok_or_else(|| Error::InvalidEnvironment(format!("{entry:?}")))?;
                let (key, value) = entry.split_once('=').unwrap_or((entry.as_str(), ""));
                if key.is_empty() {
                    return Err(Error::InvalidEnvironment(entry.clone()));
                }
                Ok((key.to_string(), value.to_string()))
            })
            .collect(),
        Value::Mapping(map) => map
            .iter()
            .map(|(key, value)| {
                let key = scalar::to_string(key)
                    .filter(|k| !k.is_empty())
                    .ok_or_else(|| Error::InvalidEnvironment(format!("{key:?}")))?;
                let value = match value {
                    Value::Null => String::new(),
                    v => scalar::to_string(v)
                        .ok_or_else(|| Error::InvalidEnvironment(format!("{key}: {v:?}")))?,
                };
                Ok((key, value))
            })
            .collect(),
        other => Err(Error::InvalidEnvironment(format!("{other:?}"))),
    }
}
