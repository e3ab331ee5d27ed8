//! # alt CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.
//! Uses clap derive macros for argument parsing.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use alt_cli::inspect::{run_flatten, run_infer, run_type_shape, run_types, InferArgs, SchemaArgs};
use alt_cli::load_config;
use alt_cli::shape::{run_shape, ShapeArgs};
use alt_cli::verify::{run_check, run_verify, VerifyArgs};

/// Compact schemas for JSON and YAML documents.
///
/// Validates documents against terse `{}`/`[]` schemas, fills in missing or
/// invalid parts from defaults, and infers schemas from examples.
#[derive(Parser, Debug)]
#[command(name = "alt", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a document and print every violation.
    Verify(VerifyArgs),

    /// Validate a document and print true or false.
    Check(VerifyArgs),

    /// Print a document with every declared part present and well-typed.
    Shape(ShapeArgs),

    /// Print a schema inferred from an example document.
    Infer(InferArgs),

    /// Print the flattened form of a schema.
    Flatten(SchemaArgs),

    /// Print the normalized type tree of a schema.
    TypeShape(SchemaArgs),

    /// List every registered type with a sample value.
    Types,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level.
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e:#}");
            return ExitCode::from(1);
        }
    };
    config.apply_global();
    tracing::debug!(?config, "configuration loaded");

    let result = match &cli.command {
        Commands::Verify(args) => run_verify(args, &config),
        Commands::Check(args) => run_check(args, &config),
        Commands::Shape(args) => run_shape(args, &config),
        Commands::Infer(args) => run_infer(args),
        Commands::Flatten(args) => run_flatten(args),
        Commands::TypeShape(args) => run_type_shape(args),
        Commands::Types => run_types(&config),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
