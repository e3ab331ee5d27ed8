//! # Options and Configuration
//!
//! Per-call options for the engines, and a serde-backed [`Config`] that can
//! be loaded from YAML to set both the per-call defaults and the
//! process-wide state (global enum types, validation gate).
//!
//! ```yaml
//! include_optional: false
//! error_path_root: payload
//! environment: development
//! types:
//!   color: [red, green, blue]
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::gate::{set_validation_active, Activation};
use crate::registry::{register_global_type, TypeDef, TypeOverrides};

/// Root segment of every reported error path unless configured otherwise.
pub const DEFAULT_PATH_ROOT: &str = "json";

/// Options for [`shape`](crate::shape()).
#[derive(Debug, Clone, Default)]
pub struct ShapeOptions {
    /// Build defaults for optional nodes whose value is absent instead of
    /// leaving them `null`.
    pub include_optional: bool,
    /// Types usable for this call only.
    pub types: TypeOverrides,
}

impl ShapeOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set [`include_optional`](Self::include_optional).
    #[must_use]
    pub fn include_optional(mut self, include: bool) -> Self {
        self.include_optional = include;
        self
    }

    /// Add a call-scoped type.
    #[must_use]
    pub fn with_type(mut self, name: impl Into<String>, def: TypeDef) -> Self {
        self.types.insert(name, def);
        self
    }
}

/// Options for [`verify`](crate::verify) and [`check`](crate::check).
#[derive(Debug, Clone)]
pub struct VerifyOptions {
    /// First segment of every error path.
    pub error_path_root: String,
    /// Types usable for this call only.
    pub types: TypeOverrides,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            error_path_root: DEFAULT_PATH_ROOT.to_string(),
            types: TypeOverrides::default(),
        }
    }
}

impl VerifyOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set [`error_path_root`](Self::error_path_root).
    #[must_use]
    pub fn error_path_root(mut self, root: impl Into<String>) -> Self {
        self.error_path_root = root.into();
        self
    }

    /// Add a call-scoped type.
    #[must_use]
    pub fn with_type(mut self, name: impl Into<String>, def: TypeDef) -> Self {
        self.types.insert(name, def);
        self
    }
}

/// Error loading a [`Config`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read config '{path}': {source}")]
    Io {
        /// Path that failed.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The text is not a valid config document.
    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Library configuration, usually loaded from a YAML file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Default for [`ShapeOptions::include_optional`].
    pub include_optional: bool,
    /// Default for [`VerifyOptions::error_path_root`].
    pub error_path_root: String,
    /// Environment tag for the validation gate; unset leaves the gate alone.
    pub environment: Option<String>,
    /// Enumerated types by name.
    pub types: BTreeMap<String, Vec<Value>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            include_optional: false,
            error_path_root: DEFAULT_PATH_ROOT.to_string(),
            environment: None,
            types: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Parse a config from YAML (JSON is valid YAML too).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` on malformed text or unknown keys.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Read and parse a config file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read and
    /// `ConfigError::Parse` if it does not parse.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    fn overrides(&self) -> TypeOverrides {
        let mut overrides = TypeOverrides::new();
        for (name, members) in &self.types {
            overrides.insert(name.clone(), TypeDef::one_of(members.iter().cloned()));
        }
        overrides
    }

    /// Register the configured types process-wide and set the validation
    /// gate if an environment is configured.
    pub fn apply_global(&self) {
        for (name, def) in self.overrides().iter() {
            register_global_type(name, def.clone());
        }
        if let Some(environment) = &self.environment {
            set_validation_active(Activation::Environment(environment.clone()));
        }
    }

    /// Shape options carrying this config's defaults and types.
    pub fn shape_options(&self) -> ShapeOptions {
        ShapeOptions {
            include_optional: self.include_optional,
            types: self.overrides(),
        }
    }

    /// Verify options carrying this config's defaults and types.
    pub fn verify_options(&self) -> VerifyOptions {
        VerifyOptions {
            error_path_root: self.error_path_root.clone(),
            types: self.overrides(),
        }
    }
}
