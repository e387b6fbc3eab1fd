use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::header::HeaderValue;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

use crate::models::{Criterion, OutputFormats};

pub const DEFAULT_CONFIG_PATH: &str = "config.json";
pub const DEFAULT_CRITERIA_PATH: &str = "criteria.json";

/// Problems loading either of the two input documents. Messages are the
/// ones printed to the console before the run is aborted.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Error: No se encontró el archivo {}.", .path.display())]
    NotFound { path: PathBuf },

    #[error("Error: El archivo {} no tiene un formato JSON válido", .path.display())]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Error al leer el archivo {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Error: El archivo {} no es válido: {reason}", .path.display())]
    Invalid { path: PathBuf, reason: String },

    #[error("Error: Falta la clave UserKey en {}.", .path.display())]
    MissingApiKey { path: PathBuf },

    #[error("Error: La clave UserKey de {} contiene caracteres no válidos para una cabecera HTTP.", .path.display())]
    InvalidApiKey { path: PathBuf },

    #[error("Error: Criterio en la posición {index} inválido: {reason}")]
    InvalidCriterion { index: usize, reason: String },
}

/// Application settings from `config.json`.
///
/// Key names match the document as users write it, including the
/// `output_tittle` spelling. Every key except `UserKey` has a default;
/// `timeout_seconds` is unset unless given, so requests wait as long as
/// the server takes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(rename = "UserKey")]
    pub api_key: String,
    pub output_folder: String,
    #[serde(rename = "output_tittle")]
    pub output_title: String,
    #[serde(deserialize_with = "flag")]
    pub test_mode: bool,
    #[serde(rename = "Max_results")]
    pub max_results: u32,
    #[serde(rename = "Result_json", deserialize_with = "flag")]
    pub save_json: bool,
    #[serde(rename = "Result_csv", deserialize_with = "flag")]
    pub save_csv: bool,
    pub timeout_seconds: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            output_folder: "./resultados".to_string(),
            output_title: "Resultados_busqueda".to_string(),
            test_mode: false,
            max_results: 10,
            save_json: true,
            save_csv: true,
            timeout_seconds: None,
        }
    }
}

impl AppConfig {
    pub fn formats(&self) -> OutputFormats {
        OutputFormats {
            json: self.save_json,
            csv: self.save_csv,
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }

    fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey {
                path: path.to_path_buf(),
            });
        }
        // sent verbatim as the API-Key header on every request
        if HeaderValue::from_str(&self.api_key).is_err() {
            return Err(ConfigError::InvalidApiKey {
                path: path.to_path_buf(),
            });
        }
        if self.max_results == 0 {
            return Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                reason: "Max_results debe ser mayor que 0".to_string(),
            });
        }
        if self.timeout_seconds == Some(0) {
            return Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                reason: "timeout_seconds debe ser mayor que 0".to_string(),
            });
        }
        Ok(())
    }
}

/// 0/1 switches; JSON booleans are accepted too.
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Bool(b) => Ok(b),
        Value::Number(n) => Ok(n.as_f64().is_some_and(|f| f != 0.0)),
        other => Err(D::Error::custom(format!(
            "se esperaba 0/1 o un booleano, se obtuvo {other}"
        ))),
    }
}

/// Read and parse a JSON file, keeping the three failure modes apart.
pub fn read_json_document(path: &Path) -> Result<Value, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ConfigError::NotFound {
            path: path.to_path_buf(),
        },
        _ => ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::InvalidJson {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let doc = read_json_document(path)?;
    let config: AppConfig =
        serde_json::from_value(doc).map_err(|e| ConfigError::Invalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    config.validate(path)?;
    tracing::debug!(
        path = %path.display(),
        max_results = config.max_results,
        json = config.save_json,
        csv = config.save_csv,
        "configuration loaded"
    );
    Ok(config)
}

/// Load the `search_criteria` list. A document without that key yields an
/// empty list; every entry is checked before any request goes out.
pub fn load_criteria(path: &Path) -> Result<Vec<Criterion>, ConfigError> {
    let doc = read_json_document(path)?;
    let Value::Object(map) = doc else {
        return Err(ConfigError::Invalid {
            path: path.to_path_buf(),
            reason: "se esperaba un objeto JSON".to_string(),
        });
    };
    let items = match map.get("search_criteria") {
        None => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                reason: "search_criteria debe ser una lista".to_string(),
            });
        }
    };
    let criteria = items
        .iter()
        .enumerate()
        .map(|(index, item)| parse_criterion(index, item))
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(path = %path.display(), count = criteria.len(), "criteria loaded");
    Ok(criteria)
}

fn parse_criterion(index: usize, item: &Value) -> Result<Criterion, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidCriterion {
        index,
        reason: reason.to_string(),
    };
    let obj = item.as_object().ok_or_else(|| invalid("no es un objeto"))?;
    let kind = match obj.get("type") {
        None => return Err(invalid("falta la clave 'type'")),
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(_) => return Err(invalid("'type' debe ser un texto no vacío")),
    };
    let value = match obj.get("value") {
        None => return Err(invalid("falta la clave 'value'")),
        Some(Value::String(s)) => s.clone(),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => v.to_string(),
        Some(_) => return Err(invalid("'value' debe ser texto, número o booleano")),
    };
    Ok(Criterion::new(kind, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn json_document_round_trips() {
        let dir = tempdir().unwrap();
        let content = r#"{"UserKey":"abc","nested":{"list":[1,2,"x"]},"flag":true}"#;
        let path = write(dir.path(), "doc.json", content);
        let doc = read_json_document(&path).unwrap();
        let expected: Value = serde_json::from_str(content).unwrap();
        assert_eq!(doc, expected);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let err = read_json_document(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
        assert!(err.to_string().contains("No se encontró el archivo"));
    }

    #[test]
    fn broken_json_is_reported_separately() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "config.json", "{\"UserKey\": ");
        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidJson { .. }));
    }

    #[test]
    fn config_applies_defaults() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "config.json", r#"{"UserKey":"k"}"#);
        let cfg = load_config(&path).unwrap();
        assert_eq!(
            cfg,
            AppConfig {
                api_key: "k".into(),
                ..AppConfig::default()
            }
        );
        assert_eq!(cfg.output_folder, "./resultados");
        assert_eq!(cfg.output_title, "Resultados_busqueda");
        assert_eq!(cfg.max_results, 10);
        assert!(cfg.save_json && cfg.save_csv && !cfg.test_mode);
    }

    #[test]
    fn config_reads_all_keys_and_flag_styles() {
        let dir = tempdir().unwrap();
        let path = write(
            dir.path(),
            "config.json",
            r#"{
                "UserKey": "X",
                "output_folder": "out",
                "output_tittle": "scan",
                "test_mode": 1,
                "Max_results": 5,
                "Result_json": true,
                "Result_csv": 0,
                "ignored": "extra"
            }"#,
        );
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.api_key, "X");
        assert_eq!(cfg.output_folder, "out");
        assert_eq!(cfg.output_title, "scan");
        assert!(cfg.test_mode);
        assert_eq!(cfg.max_results, 5);
        assert_eq!(cfg.formats(), OutputFormats { json: true, csv: false });
    }

    #[test]
    fn empty_config_is_rejected() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "config.json", "{}");
        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey { .. }));
    }

    #[test]
    fn api_key_unusable_as_header_is_rejected() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "config.json", r#"{"UserKey":"abc\ndef"}"#);
        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidApiKey { .. }));
        assert!(err.to_string().contains("UserKey"));
    }

    #[test]
    fn timeout_is_unset_by_default() {
        assert_eq!(AppConfig::default().request_timeout(), None);

        let dir = tempdir().unwrap();
        let path = write(dir.path(), "config.json", r#"{"UserKey":"k"}"#);
        assert_eq!(load_config(&path).unwrap().timeout_seconds, None);

        let path = write(dir.path(), "timed.json", r#"{"UserKey":"k","timeout_seconds":45}"#);
        assert_eq!(
            load_config(&path).unwrap().request_timeout(),
            Some(Duration::from_secs(45))
        );

        let path = write(dir.path(), "zero.json", r#"{"UserKey":"k","timeout_seconds":0}"#);
        assert!(matches!(
            load_config(&path).unwrap_err(),
            ConfigError::Invalid { .. }
        ));
    }

    #[test]
    fn zero_max_results_is_rejected() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "config.json", r#"{"UserKey":"k","Max_results":0}"#);
        assert!(matches!(
            load_config(&path).unwrap_err(),
            ConfigError::Invalid { .. }
        ));
    }

    #[test]
    fn bad_flag_type_is_rejected() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "config.json", r#"{"UserKey":"k","Result_csv":"yes"}"#);
        assert!(matches!(
            load_config(&path).unwrap_err(),
            ConfigError::Invalid { .. }
        ));
    }

    #[test]
    fn criteria_keep_document_order() {
        let dir = tempdir().unwrap();
        let path = write(
            dir.path(),
            "criteria.json",
            r#"{"search_criteria":[
                {"type":"domain","value":"example.com"},
                {"type":"ip","value":"10.0.0.1"},
                {"type":"page.status","value":200},
                {"type":"task.visibility","value":"public"}
            ]}"#,
        );
        let criteria = load_criteria(&path).unwrap();
        assert_eq!(
            criteria,
            vec![
                Criterion::new("domain", "example.com"),
                Criterion::new("ip", "10.0.0.1"),
                Criterion::new("page.status", "200"),
                Criterion::new("task.visibility", "public"),
            ]
        );
    }

    #[test]
    fn criteria_key_absent_gives_empty_list() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "criteria.json", r#"{"other":[]}"#);
        assert!(load_criteria(&path).unwrap().is_empty());
    }

    #[test]
    fn criterion_without_value_names_its_position() {
        let dir = tempdir().unwrap();
        let path = write(
            dir.path(),
            "criteria.json",
            r#"{"search_criteria":[{"type":"url","value":"a"},{"type":"url"}]}"#,
        );
        match load_criteria(&path).unwrap_err() {
            ConfigError::InvalidCriterion { index, reason } => {
                assert_eq!(index, 1);
                assert!(reason.contains("value"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn criteria_document_must_be_object() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "criteria.json", "[]");
        assert!(matches!(
            load_criteria(&path).unwrap_err(),
            ConfigError::Invalid { .. }
        ));
    }
}
