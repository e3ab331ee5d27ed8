//! # Compiled Schema
//!
//! Resolves a [`FlatSchema`] into an arena of typed nodes so the engines
//! never re-parse schema text while walking a value.
//!
//! Nodes refer to their children by [`NodeId`]; children are always pushed
//! before their parent. A lookup body may only reference entries captured
//! before it (the invariant `flatten` produces), which rules out cycles in
//! hand-built flat schemas. Every reference to the same entry with the same
//! `?` marker shares one node, so the arena grows with the number of lookup
//! entries rather than the number of paths through them.

use std::collections::HashMap;

use crate::error::SchemaError;
use crate::flatten::{parse_reference, FlatSchema};
use crate::registry::TypeRegistry;

/// Index of a node inside a [`CompiledSchema`].
pub type NodeId = usize;

/// Name of the field that applies to every undeclared key.
pub const WILDCARD: &str = "*";

/// A declared scalar default, before casting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawDefault {
    /// A quoted literal, already resolved from the literal table.
    Literal(String),
    /// Bare text as written in the schema.
    Bare(String),
}

impl RawDefault {
    /// The default text.
    pub fn text(&self) -> &str {
        match self {
            Self::Literal(text) | Self::Bare(text) => text,
        }
    }
}

/// One compiled schema node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// `type[:default]`
    Scalar {
        /// Led by `?`.
        optional: bool,
        /// Registry name; empty means "any non-null value".
        type_name: String,
        /// Declared default, if any.
        default: Option<RawDefault>,
    },
    /// `[part, ...]`, parts applied cyclically by index.
    Array {
        /// Led by `?`.
        optional: bool,
        /// Positional pattern; never empty.
        parts: Vec<NodeId>,
    },
    /// `{name:schema, ...}`
    Object {
        /// Led by `?`.
        optional: bool,
        /// Declared fields in declaration order.
        fields: Vec<(String, NodeId)>,
        /// Schema for keys not covered by `fields`.
        wildcard: Option<NodeId>,
    },
}

impl Node {
    /// Whether the node was marked with `?`.
    pub fn is_optional(&self) -> bool {
        match self {
            Self::Scalar { optional, .. }
            | Self::Array { optional, .. }
            | Self::Object { optional, .. } => *optional,
        }
    }
}

/// A schema resolved into an arena of [`Node`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledSchema {
    nodes: Vec<Node>,
    root: NodeId,
}

impl CompiledSchema {
    /// The root node id.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The node stored at `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` did not come from this schema.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// Every node, children before parents.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Fail if any scalar names a type `registry` does not know.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::UnknownType` for the first unknown non-empty name.
    pub fn ensure_types_known(&self, registry: &TypeRegistry) -> Result<(), SchemaError> {
        for node in &self.nodes {
            if let Node::Scalar { type_name, .. } = node {
                if !type_name.is_empty() && !registry.has(type_name) {
                    return Err(SchemaError::UnknownType {
                        name: type_name.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

struct Compiler<'a> {
    flat: &'a FlatSchema,
    nodes: Vec<Node>,
    /// Compiled groups keyed by lookup index and `?` marker.
    groups: HashMap<(usize, bool), NodeId>,
}

impl Compiler<'_> {
    fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Compile one `?`-prefixed schema term. `bound` is the number of lookup
    /// entries the term may reference.
    fn term(&mut self, term: &str, bound: usize) -> Result<NodeId, SchemaError> {
        let (optional, rest) = match term.strip_prefix('?') {
            Some(rest) => (true, rest),
            None => (false, term),
        };
        if let Some(index) = parse_reference(rest) {
            return self.group(index, optional, bound);
        }

        let mut pieces = rest.splitn(3, ':');
        let type_name = pieces.next().unwrap_or_default().to_string();
        let default = pieces
            .next()
            .filter(|text| !text.is_empty())
            .map(|text| match text.strip_prefix('$').and_then(parse_reference) {
                Some(i) if i < self.flat.literals.len() => {
                    RawDefault::Literal(self.flat.literals[i].clone())
                }
                _ => RawDefault::Bare(text.to_string()),
            });
        Ok(self.push(Node::Scalar {
            optional,
            type_name,
            default,
        }))
    }

    fn group(&mut self, index: usize, optional: bool, bound: usize) -> Result<NodeId, SchemaError> {
        if index >= bound {
            return Err(SchemaError::DanglingReference { index, len: bound });
        }
        if let Some(&id) = self.groups.get(&(index, optional)) {
            return Ok(id);
        }
        let node = self.group_node(index, optional)?;
        let id = self.push(node);
        self.groups.insert((index, optional), id);
        Ok(id)
    }

    fn group_node(&mut self, index: usize, optional: bool) -> Result<Node, SchemaError> {
        let flat = self.flat;
        let body = flat.lookups[index].as_str();
        let inner = body.get(1..body.len().saturating_sub(1)).unwrap_or_default();

        if body.starts_with('[') {
            // `[]` holds one untyped part, just as `[,]` holds two.
            let mut parts = Vec::new();
            for part in inner.split(',') {
                parts.push(self.term(part, index)?);
            }
            return Ok(Node::Array { optional, parts });
        }

        let mut fields: Vec<(String, NodeId)> = Vec::new();
        let mut wildcard = None;
        for entry in inner.split(',').filter(|entry| !entry.is_empty()) {
            let (name, tail) = entry.split_once(':').unwrap_or((entry, ""));
            let id = self.term(tail, index)?;
            if name == WILDCARD {
                wildcard = Some(id);
            } else if let Some(slot) = fields.iter_mut().find(|(existing, _)| existing == name) {
                slot.1 = id;
            } else {
                fields.push((name.to_string(), id));
            }
        }
        Ok(Node::Object {
            optional,
            fields,
            wildcard,
        })
    }
}

/// Compile a flat schema into its node arena.
///
/// # Errors
///
/// Returns `SchemaError::DanglingReference` if a reference points outside the
/// entries it may see.
pub fn compile(flat: &FlatSchema) -> Result<CompiledSchema, SchemaError> {
    let mut compiler = Compiler {
        flat,
        nodes: Vec::new(),
        groups: HashMap::new(),
    };
    let root = compiler.term(&flat.flat, flat.lookups.len())?;
    tracing::debug!(nodes = compiler.nodes.len(), "compiled schema");
    Ok(CompiledSchema {
        nodes: compiler.nodes,
        root,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten;

    fn compiled(text: &str) -> CompiledSchema {
        compile(&flatten(text).unwrap()).unwrap()
    }

    fn root(schema: &CompiledSchema) -> &Node {
        schema.node(schema.root())
    }

    #[test]
    fn test_scalar_with_default() {
        let schema = compiled("?i:5");
        assert_eq!(
            root(&schema),
            &Node::Scalar {
                optional: true,
                type_name: "i".to_string(),
                default: Some(RawDefault::Bare("5".to_string())),
            }
        );
    }

    #[test]
    fn test_literal_default_is_resolved() {
        let schema = compiled(r#"s:"hello world""#);
        match root(&schema) {
            Node::Scalar { default, .. } => {
                assert_eq!(default, &Some(RawDefault::Literal("hello world".to_string())));
            }
            other => panic!("Expected scalar, got: {other:?}"),
        }
    }

    #[test]
    fn test_object_fields_and_wildcard() {
        let schema = compiled("{a:i,b:?s:x,*:n}");
        let Node::Object {
            optional,
            fields,
            wildcard,
        } = root(&schema)
        else {
            panic!("Expected object");
        };
        assert!(!optional);
        let names: Vec<&str> = fields.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(schema.node(fields[1].1).is_optional());
        let wildcard = wildcard.expect("wildcard");
        assert!(matches!(
            schema.node(wildcard),
            Node::Scalar { type_name, .. } if type_name == "n"
        ));
    }

    #[test]
    fn test_bare_field_is_untyped() {
        let schema = compiled("{a,b:?}");
        let Node::Object { fields, .. } = root(&schema) else {
            panic!("Expected object");
        };
        assert_eq!(
            schema.node(fields[0].1),
            &Node::Scalar {
                optional: false,
                type_name: String::new(),
                default: None,
            }
        );
        assert!(schema.node(fields[1].1).is_optional());
    }

    #[test]
    fn test_optional_nested_group() {
        let schema = compiled("{a:?{b:i}}");
        let Node::Object { fields, .. } = root(&schema) else {
            panic!("Expected object");
        };
        let nested = schema.node(fields[0].1);
        assert!(nested.is_optional());
        assert!(matches!(nested, Node::Object { .. }));
    }

    #[test]
    fn test_array_parts() {
        let schema = compiled("[i,s:x,{a}]");
        let Node::Array { parts, .. } = root(&schema) else {
            panic!("Expected array");
        };
        assert_eq!(parts.len(), 3);
        assert!(matches!(schema.node(parts[2]), Node::Object { .. }));
    }

    #[test]
    fn test_empty_groups() {
        let schema = compiled("[]");
        let Node::Array { parts, .. } = root(&schema) else {
            panic!("Expected array");
        };
        assert_eq!(parts.len(), 1);
        assert_eq!(
            schema.node(parts[0]),
            &Node::Scalar {
                optional: false,
                type_name: String::new(),
                default: None,
            }
        );
        assert!(matches!(
            root(&compiled("?{}")),
            Node::Object { optional: true, fields, wildcard: None } if fields.is_empty()
        ));
    }

    #[test]
    fn test_duplicate_field_keeps_position() {
        let schema = compiled("{a:i,b:s,a:n}");
        let Node::Object { fields, .. } = root(&schema) else {
            panic!("Expected object");
        };
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].0, "a");
        assert!(matches!(
            schema.node(fields[0].1),
            Node::Scalar { type_name, .. } if type_name == "n"
        ));
    }

    #[test]
    fn test_forward_reference_rejected() {
        let flat = FlatSchema {
            flat: "0".to_string(),
            lookups: vec!["{a:0}".to_string()],
            literals: Vec::new(),
        };
        assert_eq!(
            compile(&flat).unwrap_err(),
            SchemaError::DanglingReference { index: 0, len: 0 }
        );
    }

    #[test]
    fn test_repeated_references_share_nodes() {
        let mut lookups = vec!["[i]".to_string()];
        for level in 0..29 {
            lookups.push(format!("[{level},{level}]"));
        }
        let flat = FlatSchema {
            flat: "29".to_string(),
            lookups,
            literals: Vec::new(),
        };
        let schema = compile(&flat).unwrap();
        // One scalar plus one array per lookup entry.
        assert_eq!(schema.nodes().len(), 31);
        let Node::Array { parts, .. } = root(&schema) else {
            panic!("Expected array");
        };
        assert_eq!(parts[0], parts[1]);
    }

    #[test]
    fn test_optional_marker_splits_shared_nodes() {
        let schema = compiled("{a:{b:i},c:?{b:i}}");
        let Node::Object { fields, .. } = root(&schema) else {
            panic!("Expected object");
        };
        assert!(!schema.node(fields[0].1).is_optional());
        assert!(schema.node(fields[1].1).is_optional());
    }

    #[test]
    fn test_unknown_types_detected() {
        let schema = compiled("{a:i,b:[nope]}");
        let err = schema.ensure_types_known(&TypeRegistry::builtin()).unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownType {
                name: "nope".to_string()
            }
        );
        assert!(compiled("{a,b:?}")
            .ensure_types_known(&TypeRegistry::builtin())
            .is_ok());
    }
}
