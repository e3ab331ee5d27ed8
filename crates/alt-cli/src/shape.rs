//! # Shape Subcommand
//!
//! Prints a document rebuilt so that every declared part of the schema is
//! present and well-typed. Without a document, prints the default skeleton.

use std::path::PathBuf;

use alt_schema::Config;
use anyhow::Result;
use clap::Args;
use serde_json::Value;

use crate::document::load_document;
use crate::resolve_schema;

/// Arguments for the shape subcommand.
#[derive(Args, Debug)]
pub struct ShapeArgs {
    /// Schema text, or `@path` to read it from a file.
    pub schema: String,

    /// JSON or YAML document to shape. Omit to shape from nothing.
    pub document: Option<PathBuf>,

    /// Build defaults for absent optional parts instead of leaving them null.
    #[arg(long)]
    pub include_optional: bool,
}

/// Shape the document and return the result.
pub fn shape_document(args: &ShapeArgs, config: &Config) -> Result<Value> {
    let schema = resolve_schema(&args.schema)?;
    let value = match &args.document {
        Some(path) => load_document(path)?,
        None => Value::Null,
    };
    let mut options = config.shape_options();
    if args.include_optional {
        options = options.include_optional(true);
    }
    Ok(alt_schema::shape(&value, &schema, &options)?)
}

/// Execute the shape subcommand.
pub fn run_shape(args: &ShapeArgs, config: &Config) -> Result<u8> {
    let shaped = shape_document(args, config)?;
    println!("{}", serde_json::to_string_pretty(&shaped)?);
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn shape_from_yaml_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.yaml");
        std::fs::write(&path, "a: x\nextra: 1\n").unwrap();
        let args = ShapeArgs {
            schema: "{a:i:5,b:[s]}".to_string(),
            document: Some(path),
            include_optional: false,
        };
        let shaped = shape_document(&args, &Config::default()).unwrap();
        assert_eq!(shaped, json!({"a": 5, "b": [""]}));
    }

    #[test]
    fn shape_without_document() {
        let mut args = ShapeArgs {
            schema: "{a:i,b:?s}".to_string(),
            document: None,
            include_optional: false,
        };
        let config = Config::default();
        assert_eq!(shape_document(&args, &config).unwrap(), json!({"a": 0, "b": null}));
        args.include_optional = true;
        assert_eq!(shape_document(&args, &config).unwrap(), json!({"a": 0, "b": ""}));
    }

    #[test]
    fn config_types_apply() {
        let config = Config::from_yaml_str("types:\n  unit: [kg]\n").unwrap();
        let args = ShapeArgs {
            schema: "{u:unit}".to_string(),
            document: None,
            include_optional: false,
        };
        assert_eq!(shape_document(&args, &config).unwrap(), json!({"u": "kg"}));
    }
}
