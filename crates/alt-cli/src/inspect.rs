//! # Inspection Subcommands
//!
//! `infer`, `flatten`, `type-shape` and `types`: tooling views over schemas
//! and the type registry. None of them validate anything.

use std::path::PathBuf;

use alt_schema::{Config, TypeRegistry};
use anyhow::Result;
use clap::Args;
use serde_json::Value;

use crate::document::load_document;
use crate::resolve_schema;

/// Arguments for the infer subcommand.
#[derive(Args, Debug)]
pub struct InferArgs {
    /// Example JSON or YAML document.
    pub document: PathBuf,
}

/// Arguments for subcommands that take only a schema.
#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Schema text, or `@path` to read it from a file.
    pub schema: String,
}

/// Execute the infer subcommand.
pub fn run_infer(args: &InferArgs) -> Result<u8> {
    let value = load_document(&args.document)?;
    println!("{}", alt_schema::infer_schema(&value));
    Ok(0)
}

/// Execute the flatten subcommand.
pub fn run_flatten(args: &SchemaArgs) -> Result<u8> {
    let schema = resolve_schema(&args.schema)?;
    let flat = alt_schema::flatten(&schema)?;
    println!("{}", serde_json::to_string_pretty(&flat)?);
    Ok(0)
}

/// Execute the type-shape subcommand.
pub fn run_type_shape(args: &SchemaArgs) -> Result<u8> {
    let schema = resolve_schema(&args.schema)?;
    let tree = alt_schema::type_shape(&schema)?;
    println!("{}", serde_json::to_string_pretty(&tree)?);
    Ok(0)
}

/// Every type visible under `config`, with a sample of each.
pub fn type_samples(config: &Config) -> Value {
    let registry = TypeRegistry::snapshot(&config.shape_options().types);
    Value::Object(registry.samples())
}

/// Execute the types subcommand.
pub fn run_types(config: &Config) -> Result<u8> {
    println!("{}", serde_json::to_string_pretty(&type_samples(config))?);
    Ok(0)
}
