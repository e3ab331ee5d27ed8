//! # alt-schema — Compact Schema Language for JSON Values
//!
//! A terse textual schema language for JSON-like values, plus the engines
//! that run on its compiled form.
//!
//! ```text
//! {id:i, name:s:"anonymous", tags:?[s], meta:{*:n}}
//! ```
//!
//! `{}` describes an object, `[]` an array whose parts repeat cyclically,
//! and a bare `type[:default]` token a scalar. A leading `?` makes a node
//! optional and a field named `*` covers every undeclared key.
//!
//! ## Pipeline
//!
//! - [`flatten()`]: turns schema text into a [`FlatSchema`], made of a root
//!   term, a table of group bodies (innermost first) and a table of quoted
//!   literals.
//! - [`compile()`]: resolves a flat schema into a [`CompiledSchema`] arena.
//! - [`TypeRegistry`]: per-call snapshot of builtin, globally registered and
//!   call-supplied scalar types.
//!
//! ## Engines
//!
//! - [`verify`] / [`check`]: collect every violation in one pass and report
//!   them together as [`ValidationErrors`].
//! - [`shape()`]: build a value in which every declared part is present and
//!   well-typed, filling gaps from defaults or type samples.
//! - [`infer_schema`] / [`type_shape`]: derive schema text from an example,
//!   or a documentation tree from schema text.
//!
//! ## Crate Policy
//!
//! - A broken schema is a [`SchemaError`] and is never downgraded to a
//!   validation failure, not even by [`check`].
//! - Input values are never mutated.
//! - Process-wide state is limited to the global type table
//!   ([`register_global_type`]) and the validation gate
//!   ([`set_validation_active`]); both are meant to be set at startup.

pub mod compile;
pub mod config;
pub mod error;
pub mod flatten;
pub mod gate;
pub mod introspect;
pub mod registry;
pub mod shape;
pub mod validate;

pub use compile::{compile, CompiledSchema, Node, NodeId, RawDefault, WILDCARD};
pub use config::{Config, ConfigError, ShapeOptions, VerifyOptions, DEFAULT_PATH_ROOT};
pub use error::{AltError, ErrorRecord, SchemaError, ValidationErrors, Violation};
pub use flatten::{flatten, FlatSchema};
pub use gate::{set_validation_active, validation_active, Activation, ACTIVE_ENVIRONMENT};
pub use introspect::{infer_schema, type_shape};
pub use registry::{
    register_global_type, CheckContext, CheckFn, Primitive, SampleFn, TypeDef, TypeOverrides,
    TypeRegistry,
};
pub use shape::{shape, shape_compiled, shape_default, UNDEFINED_SENTINEL};
pub use validate::{check, validate_compiled, verify};
