//! # Verify and Check Subcommands
//!
//! `alt verify` prints every collected violation and exits non-zero when
//! there are any; `alt check` prints a bare `true`/`false`. A broken schema
//! is an error for both.

use std::path::PathBuf;

use alt_schema::{AltError, Config};
use anyhow::Result;
use clap::Args;

use crate::document::load_document;
use crate::resolve_schema;

/// Arguments shared by `verify` and `check`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Schema text, or `@path` to read it from a file.
    pub schema: String,

    /// JSON or YAML document to validate.
    pub document: PathBuf,

    /// Root segment of reported error paths. Overrides the config file.
    #[arg(long)]
    pub path_root: Option<String>,
}

fn options(args: &VerifyArgs, config: &Config) -> alt_schema::VerifyOptions {
    let options = config.verify_options();
    match &args.path_root {
        Some(root) => options.error_path_root(root.as_str()),
        None => options,
    }
}

/// Execute the verify subcommand.
pub fn run_verify(args: &VerifyArgs, config: &Config) -> Result<u8> {
    let schema = resolve_schema(&args.schema)?;
    let value = load_document(&args.document)?;

    match alt_schema::verify(&value, &schema, &options(args, config)) {
        Ok(()) => {
            println!("ok");
            Ok(0)
        }
        Err(AltError::Validation(errors)) => {
            tracing::info!(count = errors.len(), "document failed validation");
            for record in errors.records() {
                println!("{record}");
            }
            Ok(1)
        }
        Err(err @ AltError::Schema(_)) => Err(err.into()),
    }
}

/// Execute the check subcommand.
pub fn run_check(args: &VerifyArgs, config: &Config) -> Result<u8> {
    let schema = resolve_schema(&args.schema)?;
    let value = load_document(&args.document)?;

    let passed = alt_schema::check(&value, &schema, &options(args, config))?;
    println!("{passed}");
    Ok(if passed { 0 } else { 1 })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(dir: &tempfile::TempDir, schema: &str, document: &str) -> VerifyArgs {
        let path = dir.path().join("doc.json");
        std::fs::write(&path, document).unwrap();
        VerifyArgs {
            schema: schema.to_string(),
            document: path,
            path_root: None,
        }
    }

    #[test]
    fn verify_exit_codes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        assert_eq!(run_verify(&args(&dir, "{a:i}", r#"{"a": 1}"#), &config).unwrap(), 0);
        assert_eq!(run_verify(&args(&dir, "{a:i}", r#"{"a": "x"}"#), &config).unwrap(), 1);
    }

    #[test]
    fn verify_schema_error_is_err() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_verify(&args(&dir, "{a:nope}", r#"{"a": 1}"#), &Config::default())
            .unwrap_err();
        assert!(err.to_string().contains("validator 'nope' not found"));
    }

    #[test]
    fn check_exit_codes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        assert_eq!(run_check(&args(&dir, "[i]", "[1, 2]"), &config).unwrap(), 0);
        assert_eq!(run_check(&args(&dir, "[s]", "[1, 2]"), &config).unwrap(), 1);
        assert!(run_check(&args(&dir, "[s]]", "[1, 2]"), &config).is_err());
    }

    #[test]
    fn path_root_overrides_config() {
        let config = Config::from_yaml_str("error_path_root: payload").unwrap();
        let mut args = VerifyArgs {
            schema: "{}".to_string(),
            document: PathBuf::from("unused.json"),
            path_root: None,
        };
        assert_eq!(options(&args, &config).error_path_root, "payload");
        args.path_root = Some("doc".to_string());
        assert_eq!(options(&args, &config).error_path_root, "doc");
    }
}
