//! # Validation Gate
//!
//! A process-wide switch that lets [`verify`](crate::verify) and
//! [`check`](crate::check) skip validation entirely outside a development
//! environment. Set it once at startup; it is only read afterwards.

use std::sync::OnceLock;

use parking_lot::RwLock;

/// The environment tag in which tagged validation stays on.
pub const ACTIVE_ENVIRONMENT: &str = "development";

/// Whether validation runs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Activation {
    /// Always validate.
    #[default]
    Enabled,
    /// Never validate; every call succeeds.
    Disabled,
    /// Validate only when the tag equals [`ACTIVE_ENVIRONMENT`].
    Environment(String),
}

impl Activation {
    /// Whether validation runs under this setting.
    pub fn is_active(&self) -> bool {
        match self {
            Self::Enabled => true,
            Self::Disabled => false,
            Self::Environment(tag) => tag == ACTIVE_ENVIRONMENT,
        }
    }
}

impl From<bool> for Activation {
    fn from(active: bool) -> Self {
        if active {
            Self::Enabled
        } else {
            Self::Disabled
        }
    }
}

impl From<&str> for Activation {
    fn from(tag: &str) -> Self {
        Self::Environment(tag.to_string())
    }
}

impl From<String> for Activation {
    fn from(tag: String) -> Self {
        Self::Environment(tag)
    }
}

fn gate() -> &'static RwLock<Activation> {
    static GATE: OnceLock<RwLock<Activation>> = OnceLock::new();
    GATE.get_or_init(Default::default)
}

/// Set the process-wide gate.
pub fn set_validation_active(activation: impl Into<Activation>) {
    let activation = activation.into();
    tracing::debug!(?activation, "setting validation gate");
    *gate().write() = activation;
}

/// Whether validation currently runs.
pub fn validation_active() -> bool {
    gate().read().is_active()
}
