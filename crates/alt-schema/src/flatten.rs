//! # Schema Flattening
//!
//! Turns raw schema text into its canonical flat form:
//!
//! - every double-quoted literal is moved into the literal table and replaced
//!   by a `$<n>` placeholder,
//! - whitespace outside literals is dropped,
//! - every bracket/brace group is moved into the lookup table, innermost
//!   first, and replaced by its decimal index.
//!
//! The text is scanned once. Open groups live on a stack; a group is recorded
//! when its closing character is reached, so children always land in the
//! table before their parent and the parent body already holds their indices.
//! Groups are numbered in order of their closing character, which is the
//! same order as repeatedly reducing the left-most innermost group.

use serde::Serialize;

use crate::error::SchemaError;

/// The canonical flat form of a schema.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FlatSchema {
    /// Empty, a bare scalar term (`?i:0`), or a single lookup index (`3`,
    /// `?3`).
    pub flat: String,
    /// Raw `{...}` / `[...]` bodies, nested groups already replaced by indices.
    pub lookups: Vec<String>,
    /// Quoted literals in first-seen order, referenced as `$<n>`.
    pub literals: Vec<String>,
}

impl FlatSchema {
    /// The lookup index the root refers to, if the root is a group.
    pub fn root_reference(&self) -> Option<usize> {
        let root = self.flat.strip_prefix('?').unwrap_or(&self.flat);
        parse_reference(root)
    }

    /// Resolve a `$<n>` placeholder against the literal table.
    ///
    /// Text that is not a placeholder, or that points past the table, is
    /// returned unchanged.
    pub fn resolve_literal<'a>(&'a self, text: &'a str) -> &'a str {
        text.strip_prefix('$')
            .and_then(parse_reference)
            .and_then(|index| self.literals.get(index))
            .map_or(text, String::as_str)
    }
}

/// Parse a decimal lookup reference. Only ASCII digits qualify.
pub(crate) fn parse_reference(text: &str) -> Option<usize> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

struct OpenGroup {
    open: char,
    position: usize,
    body: String,
}

fn closer_for(open: char) -> char {
    if open == '[' {
        ']'
    } else {
        '}'
    }
}

/// Append to the innermost open group, or to the root when none is open.
fn emit(stack: &mut [OpenGroup], root: &mut String, piece: &str) {
    match stack.last_mut() {
        Some(group) => group.body.push_str(piece),
        None => root.push_str(piece),
    }
}

/// Compile schema text into its flat form.
///
/// # Errors
///
/// Returns `SchemaError::MissingClosingQuote` for an unterminated literal and
/// `SchemaError::UnbalancedBrackets` for any unmatched or mismatched bracket
/// or brace. A quote error wins when both are present, since literals are
/// extracted before any structure is considered.
pub fn flatten(text: &str) -> Result<FlatSchema, SchemaError> {
    let mut schema = FlatSchema::default();
    let mut stack: Vec<OpenGroup> = Vec::new();
    let mut unbalanced: Option<usize> = None;

    let mut chars = text.char_indices();
    while let Some((position, c)) = chars.next() {
        match c {
            '"' => {
                let mut literal = String::new();
                let mut closed = false;
                for (_, next) in chars.by_ref() {
                    if next == '"' {
                        closed = true;
                        break;
                    }
                    literal.push(next);
                }
                if !closed {
                    return Err(SchemaError::MissingClosingQuote { position });
                }
                let placeholder = format!("${}", schema.literals.len());
                schema.literals.push(literal);
                emit(&mut stack, &mut schema.flat, &placeholder);
            }
            c if c.is_whitespace() => {}
            _ if unbalanced.is_some() => {}
            '[' | '{' => stack.push(OpenGroup {
                open: c,
                position,
                body: c.to_string(),
            }),
            ']' | '}' => match stack.pop() {
                Some(mut group) if closer_for(group.open) == c => {
                    group.body.push(c);
                    let index = schema.lookups.len().to_string();
                    schema.lookups.push(group.body);
                    emit(&mut stack, &mut schema.flat, &index);
                }
                _ => unbalanced = Some(position),
            },
            _ => {
                let mut buf = [0u8; 4];
                emit(&mut stack, &mut schema.flat, c.encode_utf8(&mut buf));
            }
        }
    }

    if let Some(position) = unbalanced.or_else(|| stack.first().map(|g| g.position)) {
        return Err(SchemaError::UnbalancedBrackets { position });
    }

    tracing::debug!(
        lookups = schema.lookups.len(),
        literals = schema.literals.len(),
        "flattened schema"
    );
    Ok(schema)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Strategy for balanced schema text built from scalars, arrays and objects.
    fn schema_text() -> impl Strategy<Value = String> {
        let leaf = "[?]?[a-z]{0,6}(:[a-z]{1,4})?";
        leaf.prop_recursive(4, 48, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..5)
                    .prop_map(|parts| format!("[{}]", parts.join(","))),
                prop::collection::vec(("[a-z]{1,6}", inner), 0..5).prop_map(|fields| {
                    let body: Vec<String> =
                        fields.into_iter().map(|(k, v)| format!("{k}:{v}")).collect();
                    format!("{{{}}}", body.join(","))
                }),
            ]
        })
    }

    proptest! {
        /// Text without brackets or quotes comes back unchanged.
        #[test]
        fn bracket_free_text_is_unchanged(text in "[?a-z0-9:,$]{0,40}") {
            let schema = flatten(&text).unwrap();
            prop_assert_eq!(schema.flat, text);
            prop_assert!(schema.lookups.is_empty());
            prop_assert!(schema.literals.is_empty());
        }

        /// Balanced text always flattens; no bracket survives in the root and
        /// every lookup body is a single self-contained group.
        #[test]
        fn balanced_text_flattens(text in schema_text()) {
            let schema = flatten(&text).unwrap();
            prop_assert!(!schema.flat.contains(['[', ']', '{', '}']), "flat contains bracket chars: {}", schema.flat);
            for body in &schema.lookups {
                let inner = &body[1..body.len() - 1];
                prop_assert!(!inner.contains(['[', ']', '{', '}']), "nested group in {}", body);
                for part in inner.split([',', ':']) {
                    if let Some(index) = parse_reference(part.trim_start_matches('?')) {
                        prop_assert!(index < schema.lookups.len());
                    }
                }
            }
        }

        /// One stray bracket anywhere makes the text fail.
        #[test]
        fn stray_bracket_always_fails(
            text in schema_text(),
            stray in prop::sample::select(vec!['[', ']', '{', '}']),
            at in any::<prop::sample::Index>(),
        ) {
            let mut chars: Vec<char> = text.chars().collect();
            let at = at.index(chars.len() + 1);
            chars.insert(at, stray);
            let broken: String = chars.into_iter().collect();
            let is_unbalanced =
                matches!(flatten(&broken), Err(SchemaError::UnbalancedBrackets { .. }));
            prop_assert!(is_unbalanced);
        }
    }
}
