//! # Document Loading
//!
//! Reads the documents the subcommands operate on. Files ending in `.yaml`
//! or `.yml` are parsed as YAML and converted to JSON values; everything
//! else is parsed as JSON.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

/// Load a JSON or YAML document as a JSON value.
pub fn load_document(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read document: {}", path.display()))?;

    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    if is_yaml {
        let yaml: serde_yaml::Value = serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse YAML: {}", path.display()))?;
        yaml_to_json_value(&yaml).map_err(|e| {
            anyhow::anyhow!("failed to convert YAML to JSON in {}: {e}", path.display())
        })
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse JSON: {}", path.display()))
    }
}

/// Convert a YAML value to JSON. Tags are dropped; scalar map keys become
/// strings.
fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::from(i))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::from(u))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("cannot represent float {f} in JSON"))
            } else {
                Err(format!("unsupported YAML number: {n:?}"))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => seq
            .iter()
            .map(yaml_to_json_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        serde_yaml::Value::Mapping(map) => {
            let mut object = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => return Err(format!("unsupported YAML map key: {other:?}")),
                };
                object.insert(key, yaml_to_json_value(v)?);
            }
            Ok(Value::Object(object))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json_value(&tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn load_json_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        std::fs::write(&path, r#"{"b": 1, "a": [true, null]}"#).unwrap();
        let value = load_document(&path).unwrap();
        assert_eq!(value, json!({"b": 1, "a": [true, null]}));
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn load_yaml_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.yml");
        std::fs::write(&path, "name: x\ncount: 3\nratio: 0.5\ntags: [a, b]\n1: one\n").unwrap();
        let value = load_document(&path).unwrap();
        assert_eq!(
            value,
            json!({"name": "x", "count": 3, "ratio": 0.5, "tags": ["a", "b"], "1": "one"})
        );
    }

    #[test]
    fn invalid_json_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = load_document(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse JSON"));
    }

    #[test]
    fn missing_document() {
        let err = load_document(Path::new("/nonexistent/doc.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read document"));
    }

    #[test]
    fn yaml_sequence_key_rejected() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("? [a, b]\n: 1\n").unwrap();
        assert!(yaml_to_json_value(&yaml).is_err());
    }
}
