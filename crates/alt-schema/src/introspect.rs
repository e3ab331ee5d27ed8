//! # Introspection
//!
//! Tooling helpers that run in the opposite direction of the engines:
//! [`infer_schema`] derives schema text from an example value, and
//! [`type_shape`] renders a schema as a tree of normalized leaf descriptors.

use serde_json::{Map, Value};

use crate::compile::{compile, CompiledSchema, Node, NodeId, WILDCARD};
use crate::error::SchemaError;
use crate::flatten::flatten;
use crate::registry::is_integer;

/// Derive schema text describing `example`.
///
/// Arrays are described by their first element, objects by every key in
/// order, and `null` by a bare optional marker.
///
/// Keys the schema language cannot spell are left out: `*`, and any key
/// holding whitespace or one of `:,"{}[]`. The inferred schema then leaves
/// those keys unchecked instead of rejecting its own example.
///
/// ```
/// use serde_json::json;
/// let schema = alt_schema::infer_schema(&json!({"a": 1, "b": [true]}));
/// assert_eq!(schema, "{a:i,b:[b]}");
/// ```
pub fn infer_schema(example: &Value) -> String {
    match example {
        Value::Null => "?".to_string(),
        Value::Bool(_) => "b".to_string(),
        Value::Number(_) if is_integer(example) => "i".to_string(),
        Value::Number(_) => "n".to_string(),
        Value::String(_) => "s".to_string(),
        Value::Array(items) => {
            format!("[{}]", items.first().map(infer_schema).unwrap_or_default())
        }
        Value::Object(map) => {
            let fields: Vec<String> = map
                .iter()
                .filter(|(key, _)| is_plain_key(key))
                .map(|(key, value)| format!("{key}:{}", infer_schema(value)))
                .collect();
            format!("{{{}}}", fields.join(","))
        }
    }
}

fn is_plain_key(key: &str) -> bool {
    key != WILDCARD
        && !key
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, ':' | ',' | '"' | '{' | '}' | '[' | ']'))
}

fn canonical_type(name: &str) -> &str {
    match name {
        "i" => "integer",
        "n" => "number",
        "b" => "boolean",
        "s" => "string",
        other => other,
    }
}

fn describe(schema: &CompiledSchema, id: NodeId) -> Value {
    match schema.node(id) {
        Node::Scalar {
            optional,
            type_name,
            default,
        } => Value::String(format!(
            "{}:{}:{}",
            if *optional { "?" } else { "" },
            canonical_type(type_name),
            default.as_ref().map_or("", |d| d.text()),
        )),
        Node::Array { parts, .. } => parts.iter().map(|part| describe(schema, *part)).collect(),
        Node::Object {
            fields, wildcard, ..
        } => {
            let mut out = Map::new();
            for (name, field) in fields {
                out.insert(name.clone(), describe(schema, *field));
            }
            if let Some(wildcard) = wildcard {
                out.insert(WILDCARD.to_string(), describe(schema, *wildcard));
            }
            Value::Object(out)
        }
    }
}

/// Render `schema` as a tree mirroring its structure, where every scalar is
/// replaced by an `optional:type:default` descriptor string.
///
/// Short type codes are expanded to their long names and quoted defaults are
/// resolved. No value is validated; unknown type names are kept as written.
///
/// # Errors
///
/// Returns a `SchemaError` if the schema text does not flatten or compile.
pub fn type_shape(schema: &str) -> Result<Value, SchemaError> {
    let compiled = compile(&flatten(schema)?)?;
    Ok(describe(&compiled, compiled.root()))
}
