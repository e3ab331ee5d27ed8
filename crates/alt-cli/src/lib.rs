//! # alt-cli — Command-Line Interface for alt Schemas
//!
//! Provides the `alt` binary: a thin layer over `alt-schema` for checking
//! and normalizing JSON or YAML documents from the shell.
//!
//! ## Subcommands
//!
//! - `alt verify` / `alt check`: validate a document against a schema.
//! - `alt shape`: fill missing or invalid parts of a document.
//! - `alt infer`: derive a schema from an example document.
//! - `alt flatten` / `alt type-shape`: inspect how a schema compiles.
//! - `alt types`: list every registered type with a sample value.
//!
//! ```bash
//! alt verify '{id:i,tags:[s]}' order.json
//! alt shape @schemas/order.alt order.yaml --include-optional
//! alt infer sample.json
//! ```
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from the handlers.
//! - Handlers delegate to `alt-schema`; no schema logic lives here.

pub mod document;
pub mod inspect;
pub mod shape;
pub mod verify;

use std::path::Path;

use alt_schema::Config;
use anyhow::{Context, Result};

/// Resolve a schema argument: `@path` reads the schema text from a file,
/// anything else is the schema text itself.
pub fn resolve_schema(arg: &str) -> Result<String> {
    match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read schema file: {path}")),
        None => Ok(arg.to_string()),
    }
}

/// Load the configuration file if one was given, otherwise the defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config: {}", path.display())),
        None => Ok(Config::default()),
    }
}
