use serde::{Deserialize, Deserializer};
use serde_yaml::Value;

/// Renders a YAML scalar as the string compose would see. `None` for null, sequences and
/// mappings.
pub(crate) fn to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => to_string(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

/// Deserializes an optional field that may be written as any scalar, e.g. `version: 3.8`.
pub(crate) fn optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => to_string(&v)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("expected a scalar, got {v:?}"))),
    }
}
