//! # Validation
//!
//! Checks a value against a compiled schema and collects every failure in
//! one pass. Arrays and objects never short-circuit: each child is visited
//! even after an earlier sibling failed, so the caller sees the full list.
//!
//! Schema-definition problems are different: an unregistered type name
//! anywhere in the schema fails the whole call before any value is looked at,
//! and that failure is never folded into the collected records.

use serde_json::Value;

use crate::compile::{compile, CompiledSchema, Node, NodeId};
use crate::config::VerifyOptions;
use crate::error::{AltError, ErrorRecord, SchemaError, ValidationErrors, Violation};
use crate::flatten::flatten;
use crate::gate::validation_active;
use crate::registry::{CheckContext, TypeRegistry};

struct Validator<'a> {
    schema: &'a CompiledSchema,
    registry: &'a TypeRegistry,
    root: &'a Value,
    records: Vec<ErrorRecord>,
}

impl<'a> Validator<'a> {
    fn record(&mut self, path: &str, kind: Violation) {
        tracing::trace!(%path, violation = %kind, "validation failure");
        self.records.push(ErrorRecord::new(path, kind));
    }

    fn node(
        &mut self,
        id: NodeId,
        value: Option<&'a Value>,
        path: &str,
        parent: Option<&'a Value>,
    ) -> Result<(), SchemaError> {
        let value = value.filter(|v| !v.is_null());
        let node = self.schema.node(id);
        if value.is_none() && node.is_optional() {
            return Ok(());
        }

        match node {
            Node::Scalar { type_name, .. } => {
                let Some(value) = value else {
                    self.record(path, Violation::Required);
                    return Ok(());
                };
                let ctx = CheckContext {
                    path,
                    root: self.root,
                    parent,
                };
                if !self.registry.check(type_name, value, &ctx)? {
                    self.record(path, Violation::ValidationFailed);
                }
            }

            Node::Array { parts, .. } => {
                let Some(items) = value.and_then(Value::as_array) else {
                    self.record(path, Violation::ShouldBeArray);
                    return Ok(());
                };
                for (i, item) in items.iter().enumerate() {
                    self.node(
                        parts[i % parts.len()],
                        Some(item),
                        &format!("{path}.{i}"),
                        value,
                    )?;
                }
            }

            Node::Object {
                fields, wildcard, ..
            } => {
                let Some(map) = value.and_then(Value::as_object) else {
                    self.record(path, Violation::ShouldBeObject);
                    return Ok(());
                };
                for (name, field) in fields {
                    self.node(*field, map.get(name), &format!("{path}.{name}"), value)?;
                }
                if let Some(wildcard) = wildcard {
                    for (key, item) in map {
                        if fields.iter().any(|(name, _)| name == key) {
                            continue;
                        }
                        self.node(*wildcard, Some(item), &format!("{path}.{key}"), value)?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Validate `value` against an already compiled schema, returning every
/// collected record (empty when the value conforms).
///
/// # Errors
///
/// Returns `SchemaError::UnknownType` if any scalar in the schema names a
/// type `registry` does not know, whether or not that part of the schema is
/// reached.
pub fn validate_compiled(
    value: &Value,
    schema: &CompiledSchema,
    registry: &TypeRegistry,
    base_path: &str,
) -> Result<Vec<ErrorRecord>, SchemaError> {
    schema.ensure_types_known(registry)?;
    let mut validator = Validator {
        schema,
        registry,
        root: value,
        records: Vec::new(),
    };
    validator.node(schema.root(), Some(value), base_path, None)?;
    Ok(validator.records)
}

/// Validate `value` against schema text and fail with every collected
/// record.
///
/// Succeeds unconditionally when the validation gate is off.
///
/// # Errors
///
/// Returns `AltError::Schema` for a malformed schema or unknown type, and
/// `AltError::Validation` carrying all records when the value does not
/// conform.
pub fn verify(value: &Value, schema: &str, options: &VerifyOptions) -> Result<(), AltError> {
    if !validation_active() {
        tracing::debug!("validation gate is off; skipping verify");
        return Ok(());
    }
    let compiled = compile(&flatten(schema)?)?;
    let registry = TypeRegistry::snapshot(&options.types);
    let records = validate_compiled(value, &compiled, &registry, &options.error_path_root)?;
    if records.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors::new(records).into())
    }
}

/// Like [`verify`], but reports data failures as `Ok(false)`.
///
/// # Errors
///
/// Schema-definition failures still propagate as `SchemaError`.
pub fn check(value: &Value, schema: &str, options: &VerifyOptions) -> Result<bool, SchemaError> {
    match verify(value, schema, options) {
        Ok(()) => Ok(true),
        Err(AltError::Validation(_)) => Ok(false),
        Err(AltError::Schema(err)) => Err(err),
    }
}
