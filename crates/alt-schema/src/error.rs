//! # Error Types
//!
//! Two disjoint error kinds flow out of this crate:
//!
//! - [`SchemaError`]: the schema text itself is broken (unbalanced brackets,
//!   an unterminated quoted literal, a reference to an unregistered type).
//!   Always fatal, raised at the point of compilation or first use, never
//!   accumulated and never silenced by [`check`](crate::check).
//! - [`ValidationErrors`]: one or more [`ErrorRecord`]s collected while
//!   walking a value against a structurally valid schema. Always accumulated
//!   across the whole traversal and surfaced as a single aggregated failure.
//!
//! [`AltError`] unifies both for entry points that can fail either way.

use std::fmt;

use thiserror::Error;

/// The schema text or compiled schema is not usable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A `"` opened a literal that never closes.
    #[error("Schema error: missing closing quote (opened at offset {position})")]
    MissingClosingQuote {
        /// Byte offset of the opening quote in the schema text.
        position: usize,
    },

    /// A bracket or brace has no matching partner.
    #[error("Schema error: malformed schema: unbalanced brackets (at offset {position})")]
    UnbalancedBrackets {
        /// Byte offset of the offending character in the schema text.
        position: usize,
    },

    /// A scalar names a type the registry does not know.
    #[error("Schema error: validator '{name}' not found")]
    UnknownType {
        /// The unregistered type name.
        name: String,
    },

    /// A lookup reference points past the end of the lookup table.
    #[error("Schema error: lookup reference {index} out of range (table has {len} entries)")]
    DanglingReference {
        /// The referenced index.
        index: usize,
        /// Length of the lookup table.
        len: usize,
    },
}

/// What went wrong at a single path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Violation {
    /// A required value is missing or null.
    Required,
    /// The type predicate rejected the value.
    ValidationFailed,
    /// An array schema met a non-array value.
    ShouldBeArray,
    /// An object schema met a non-object value.
    ShouldBeObject,
}

impl Violation {
    /// The message text reported after the path.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Required => "is required",
            Self::ValidationFailed => "validation failed",
            Self::ShouldBeArray => "should be array",
            Self::ShouldBeObject => "should be object",
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single path-qualified data-validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    /// Dotted path from the configured root, e.g. `json.b.d.2.e`.
    pub path: String,
    /// The failure at that path.
    pub kind: Violation,
}

impl ErrorRecord {
    pub(crate) fn new(path: impl Into<String>, kind: Violation) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// The message half of the record.
    pub fn message(&self) -> &'static str {
        self.kind.as_str()
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.kind)
    }
}

/// The aggregated result of a failed validation pass.
///
/// Never empty: the validation engine only builds one when at least one
/// record was collected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    records: Vec<ErrorRecord>,
}

impl ValidationErrors {
    pub(crate) fn new(records: Vec<ErrorRecord>) -> Self {
        Self { records }
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if there are no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns a slice of all records in traversal order.
    pub fn records(&self) -> &[ErrorRecord] {
        &self.records
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_inner(self) -> Vec<ErrorRecord> {
        self.records
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let [only] = self.records.as_slice() {
            return write!(f, "{only}");
        }
        write!(f, "Validation failed: {} errors found (", self.records.len())?;
        for (i, record) in self.records.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{record}")?;
        }
        f.write_str(")")
    }
}

/// Top-level error for entry points that can fail either way.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AltError {
    /// The schema is malformed or names an unknown type.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The value does not conform to the schema.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
}

impl AltError {
    /// True for schema-definition failures, which `check` re-raises.
    pub fn is_schema_error(&self) -> bool {
        matches!(self, Self::Schema(_))
    }

    /// The collected records, if this is a data-validation failure.
    pub fn records(&self) -> Option<&[ErrorRecord]> {
        match self {
            Self::Validation(errors) => Some(errors.records()),
            Self::Schema(_) => None,
        }
    }
}
