//! # Shaping
//!
//! Walks a compiled schema together with a value and builds a new value in
//! which every declared part is present and well-typed: valid scalars are
//! kept, everything else is replaced by the declared default (cast to the
//! scalar type) or by a sample of the type. The input is never mutated.

use serde_json::{Map, Value};

use crate::compile::{compile, CompiledSchema, Node, NodeId};
use crate::config::{ShapeOptions, DEFAULT_PATH_ROOT};
use crate::error::SchemaError;
use crate::flatten::flatten;
use crate::registry::{CheckContext, TypeRegistry};

/// Produced for an untyped or unregistered scalar that has neither a value
/// nor a default.
pub const UNDEFINED_SENTINEL: &str = "Not defined!";

static NULL: Value = Value::Null;

struct Shaper<'a> {
    schema: &'a CompiledSchema,
    registry: &'a TypeRegistry,
    include_optional: bool,
    root: &'a Value,
}

impl<'a> Shaper<'a> {
    fn node(
        &self,
        id: NodeId,
        value: Option<&'a Value>,
        path: &str,
        parent: Option<&'a Value>,
    ) -> Value {
        let value = value.filter(|v| !v.is_null());
        let node = self.schema.node(id);
        if value.is_none() && node.is_optional() && !self.include_optional {
            return Value::Null;
        }

        match node {
            Node::Scalar {
                type_name, default, ..
            } => {
                let Some(def) = self.registry.get(type_name) else {
                    return value.cloned().unwrap_or_else(|| {
                        Value::String(
                            default
                                .as_ref()
                                .map_or(UNDEFINED_SENTINEL, |d| d.text())
                                .to_string(),
                        )
                    });
                };
                if let Some(value) = value {
                    let ctx = CheckContext {
                        path,
                        root: self.root,
                        parent,
                    };
                    if def.check(value, &ctx) {
                        return value.clone();
                    }
                }
                match default {
                    Some(default) => def.cast(default.text()),
                    None => def.sample(),
                }
            }

            Node::Array { parts, .. } => {
                let items = value.and_then(Value::as_array).map_or(&[][..], Vec::as_slice);
                let len = items.len().max(parts.len());
                (0..len)
                    .map(|i| {
                        self.node(
                            parts[i % parts.len()],
                            items.get(i),
                            &format!("{path}.{i}"),
                            value,
                        )
                    })
                    .collect()
            }

            Node::Object {
                fields, wildcard, ..
            } => {
                let map = value.and_then(Value::as_object);
                if fields.is_empty() && wildcard.is_none() {
                    return Value::Object(map.cloned().unwrap_or_default());
                }
                let mut out = Map::new();
                for (name, field) in fields {
                    let shaped = self.node(
                        *field,
                        map.and_then(|m| m.get(name)),
                        &format!("{path}.{name}"),
                        value,
                    );
                    out.insert(name.clone(), shaped);
                }
                if let (Some(wildcard), Some(map)) = (wildcard, map) {
                    for (key, item) in map {
                        if fields.iter().any(|(name, _)| name == key) {
                            continue;
                        }
                        let shaped =
                            self.node(*wildcard, Some(item), &format!("{path}.{key}"), value);
                        out.insert(key.clone(), shaped);
                    }
                }
                Value::Object(out)
            }
        }
    }
}

/// Shape `value` against an already compiled schema.
///
/// `Value::Null` at the root counts as absent.
pub fn shape_compiled(
    value: &Value,
    schema: &CompiledSchema,
    registry: &TypeRegistry,
    include_optional: bool,
) -> Value {
    let shaper = Shaper {
        schema,
        registry,
        include_optional,
        root: value,
    };
    shaper.node(schema.root(), Some(value), DEFAULT_PATH_ROOT, None)
}

/// Shape `value` against schema text.
///
/// # Errors
///
/// Returns a `SchemaError` if the schema text does not flatten or compile.
/// Unregistered type names are not an error here; see [`UNDEFINED_SENTINEL`].
pub fn shape(value: &Value, schema: &str, options: &ShapeOptions) -> Result<Value, SchemaError> {
    let compiled = compile(&flatten(schema)?)?;
    let registry = TypeRegistry::snapshot(&options.types);
    Ok(shape_compiled(
        value,
        &compiled,
        &registry,
        options.include_optional,
    ))
}

/// Shape starting from an absent value: every declared part gets its default.
///
/// # Errors
///
/// Same as [`shape`].
pub fn shape_default(schema: &str, options: &ShapeOptions) -> Result<Value, SchemaError> {
    shape(&NULL, schema, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TypeDef;
    use serde_json::json;

    fn shaped(value: Value, schema: &str) -> Value {
        shape(&value, schema, &ShapeOptions::default()).unwrap()
    }

    #[test]
    fn test_untyped_fields_pass_through() {
        assert_eq!(shaped(json!({"a": {"foo": "bar"}}), "{a}"), json!({"a": {"foo": "bar"}}));
        assert_eq!(shaped(json!({"a": [1, 2, 3]}), "{a:?}"), json!({"a": [1, 2, 3]}));
    }

    #[test]
    fn test_extends_empty_containers() {
        assert_eq!(
            shaped(json!({"a": {}, "b": []}), "{a:{a1:i,a2:s},b:[i,s]}"),
            json!({"a": {"a1": 0, "a2": ""}, "b": [0, ""]})
        );
    }

    #[test]
    fn test_invalid_scalar_replaced_by_default() {
        assert_eq!(shaped(json!({"a": "x"}), "{a:i:7}"), json!({"a": 7}));
        assert_eq!(shaped(json!({"a": "x"}), "{a:i}"), json!({"a": 0}));
        assert_eq!(shaped(json!({"a": 0}), "{a:i:7}"), json!({"a": 0}));
    }

    #[test]
    fn test_quoted_default() {
        assert_eq!(shaped(json!({}), r#"{a:s:"hello"}"#), json!({"a": "hello"}));
    }

    #[test]
    fn test_unregistered_type_fallbacks() {
        assert_eq!(shaped(json!({"a": 3}), "{a:url}"), json!({"a": 3}));
        assert_eq!(shaped(json!({}), "{a:url:home}"), json!({"a": "home"}));
        assert_eq!(shaped(json!({}), "{a:url}"), json!({"a": UNDEFINED_SENTINEL}));
        assert_eq!(shaped(json!({}), "{a}"), json!({"a": UNDEFINED_SENTINEL}));
    }

    #[test]
    fn test_optional_fields_stay_null_by_default() {
        let value = shaped(json!({"a": 1}), "{a:?,b:?i}");
        assert_eq!(value, json!({"a": 1, "b": null}));

        let options = ShapeOptions::new().include_optional(true);
        let value = shape(&json!({"a": 1}), "{a:?,b:?i}", &options).unwrap();
        assert_eq!(value, json!({"a": 1, "b": 0}));
    }

    #[test]
    fn test_custom_type_sample() {
        let url =
            TypeDef::predicate(|v, _| v.is_string()).with_sample(|| json!("http://example.com"));
        let options = ShapeOptions::new().include_optional(true).with_type("url", url);
        let value = shape(&json!({"a": 1}), "{a:url,b:?url}", &options).unwrap();
        assert_eq!(
            value,
            json!({"a": "http://example.com", "b": "http://example.com"})
        );
    }

    #[test]
    fn test_enum_default_sample() {
        let options = ShapeOptions::new().with_type("color", TypeDef::one_of(["red"]));
        let value = shape(&json!({}), "{c:color}", &options).unwrap();
        assert_eq!(value, json!({"c": "red"}));
    }

    #[test]
    fn test_array_cycles_pattern() {
        let value = shaped(json!([1, "a", "b", 2, 3]), "[i,s]");
        assert_eq!(value, json!([1, "a", 0, "", 3]));
    }

    #[test]
    fn test_non_array_treated_as_empty() {
        assert_eq!(shaped(json!({"a": "x"}), "{a:[i,b]}"), json!({"a": [0, true]}));
    }

    #[test]
    fn test_empty_array_schema_is_one_untyped_part() {
        assert_eq!(shaped(json!([1, "x"]), "[]"), json!([1, "x"]));
        assert_eq!(shaped(json!("x"), "[]"), json!([UNDEFINED_SENTINEL]));
        assert_eq!(shaped(json!([]), "[]"), json!([UNDEFINED_SENTINEL]));
    }

    #[test]
    fn test_empty_object_schema_keeps_value() {
        assert_eq!(shaped(json!({"k": 1}), "{}"), json!({"k": 1}));
        assert_eq!(shaped(json!([1]), "{}"), json!({}));
    }

    #[test]
    fn test_wildcard_with_declared_fields() {
        let value = shaped(json!({"z": "9", "a": "x", "b": 2}), "{a:s,*:i}");
        assert_eq!(value, json!({"a": "x", "z": 0, "b": 2}));
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["a", "z", "b"]);
    }

    #[test]
    fn test_input_not_mutated() {
        let input = json!({"a": "x"});
        let before = input.clone();
        let _ = shape(&input, "{a:i,b:s}", &ShapeOptions::default()).unwrap();
        assert_eq!(input, before);
    }

    #[test]
    fn test_shape_default() {
        let value = shape_default("{a:i:3,b:[s],c:?{d:b}}", &ShapeOptions::default()).unwrap();
        assert_eq!(value, json!({"a": 3, "b": [""], "c": null}));
    }

    #[test]
    fn test_schema_errors_propagate() {
        let err = shape(&json!({}), "{a:[s]}}", &ShapeOptions::default()).unwrap_err();
        assert!(matches!(err, SchemaError::UnbalancedBrackets { .. }));
    }
}
