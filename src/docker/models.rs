use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use super::{Error, Result};

/// One row of `docker ps --format json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DockerPsEntry {
    pub command: String,
    pub created_at: String,
    #[serde(rename = "ID")]
    pub id: String,
    pub image: String,
    #[serde(deserialize_with = "deserialize_labels")]
    pub labels: BTreeMap<String, String>,
    pub local_volumes: String,
    pub mounts: String,
    pub names: String,
    pub networks: String,
    pub ports: String,
    pub running_for: String,
    pub size: String,
    pub state: String,
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Publisher {
    #[serde(rename = "URL")]
    pub url: String,
    pub target_port: u16,
    pub published_port: u16,
    pub protocol: String,
}

/// One row of `docker compose ps --format json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ComposePsEntry {
    #[serde(flatten)]
    pub container: DockerPsEntry,
    pub exit_code: i32,
    pub health: String,
    pub name: String,
    pub project: String,
    pub publishers: Vec<Publisher>,
    pub service: String,
}

impl ComposePsEntry {
    pub fn is_healthy(&self) -> bool {
        self.health == "healthy"
    }

    pub fn is_starting(&self) -> bool {
        self.health == "starting"
    }
}

/// Splits docker's `key=value,key=value` label rendering.
///
/// Label values may themselves contain commas (e.g. several compose config files), so a
/// segment without `=` is appended to the previous value.
pub fn parse_labels(raw: &str) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    let mut last_key: Option<String> = None;

    for segment in raw.split(',') {
        match segment.split_once('=') {
            Some((key, value)) => {
                labels.insert(key.to_string(), value.to_string());
                last_key = Some(key.to_string());
            }
            None => match last_key.as_ref().and_then(|k| labels.get_mut(k)) {
                Some(value) => {
                    value.push(',');
                    value.push_str(segment);
                }
                None if !segment.is_empty() => {
                    labels.insert(segment.to_string(), String::new());
                }
                None => {}
            },
        }
    }
    labels
}

fn deserialize_labels<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Labels {
        Joined(String),
        Map(BTreeMap<String, String>),
    }

    Ok(match Option::<Labels>::deserialize(deserializer)? {
        Some(Labels::Joined(raw)) => parse_labels(&raw),
        Some(Labels::Map(map)) => map,
        None => BTreeMap::new(),
    })
}

/// Decodes `--format json` output, which is one object per line or, in some docker
/// versions, a single JSON array.
pub fn parse_json_rows<T: DeserializeOwned>(what: &'static str, output: &str) -> Result<Vec<T>> {
    let decode = |source| Error::Json { what, source };
    let trimmed = output.trim();
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).map_err(decode);
    }
    trimmed
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(decode))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPOSE_PS_LINE: &str = r#"{"Command":"\"/start\"","CreatedAt":"2025-06-01 12:00:00 +0000 UTC","ExitCode":0,"Health":"healthy","ID":"0123abcd","Image":"itzg/minecraft-server:java21","Labels":"com.docker.compose.project=survival,com.docker.compose.service=mc","LocalVolumes":"0","Mounts":"/srv/mc/survival/data","Name":"mc-survival","Names":"mc-survival","Networks":"survival_default","Ports":"0.0.0.0:25565->25565/tcp","Project":"survival","Publishers":[{"URL":"0.0.0.0","TargetPort":25565,"PublishedPort":25565,"Protocol":"tcp"}],"RunningFor":"2 hours ago","Service":"mc","Size":"0B","State":"running","Status":"Up 2 hours (healthy)"}"#;

    #[test]
    fn test_parse_labels() {
        let labels = parse_labels("a=1,b=2");
        assert_eq!(labels.len(), 2);
        assert_eq!(labels["a"], "1");
        assert_eq!(labels["b"], "2");
        assert!(parse_labels("").is_empty());
    }

    #[test]
    fn test_parse_labels_value_with_commas() {
        let labels = parse_labels(
            "com.docker.compose.project.config_files=/srv/a/compose.yaml,/srv/a/override.yaml,com.docker.compose.service=mc",
        );
        assert_eq!(
            labels["com.docker.compose.project.config_files"],
            "/srv/a/compose.yaml,/srv/a/override.yaml"
        );
        assert_eq!(labels["com.docker.compose.service"], "mc");
    }

    #[test]
    fn test_compose_ps_entry() {
        let rows: Vec<ComposePsEntry> = parse_json_rows("compose ps", COMPOSE_PS_LINE).unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.service, "mc");
        assert!(row.is_healthy());
        assert!(!row.is_starting());
        assert_eq!(row.container.id, "0123abcd");
        assert_eq!(row.container.names, "mc-survival");
        assert_eq!(row.container.labels["com.docker.compose.project"], "survival");
        assert_eq!(row.publishers[0].published_port, 25565);
    }

    #[test]
    fn test_json_array_and_missing_fields() {
        let rows: Vec<ComposePsEntry> = parse_json_rows(
            "compose ps",
            r#"[{"Service":"mc","Health":"starting"},{"Service":"db"}]"#,
        )
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].is_starting());
        assert_eq!(rows[1].health, "");
        assert!(rows[1].container.labels.is_empty());
    }

    #[test]
    fn test_docker_ps_lines() {
        let output = concat!(
            r#"{"ID":"a","Names":"mc-one","Labels":"x=1"}"#,
            "\n\n",
            r#"{"ID":"b","Names":"web","Labels":""}"#,
            "\n"
        );
        let rows: Vec<DockerPsEntry> = parse_json_rows("docker ps", output).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].labels["x"], "1");
        assert!(rows[1].labels.is_empty());
    }

    #[test]
    fn test_empty_output() {
        let rows: Vec<DockerPsEntry> = parse_json_rows("docker ps", "\n").unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_garbage_output() {
        let err = parse_json_rows::<DockerPsEntry>("docker ps", "not json").unwrap_err();
        assert!(matches!(err, Error::Json { what: "docker ps", .. }));
    }
}
