//! # Type Registry
//!
//! Maps scalar type names to a check predicate and a sample generator.
//!
//! A [`TypeRegistry`] is an immutable snapshot built once per call from three
//! layers, later layers winning on name collision:
//!
//! 1. the builtin primitives (`string`/`s`, `number`/`n`, `boolean`/`b`,
//!    `integer`/`i`, `function`/`f`),
//! 2. the process-wide extension table ([`register_global_type`]),
//! 3. the call-supplied [`TypeOverrides`].
//!
//! Building a snapshot never mutates layers 1 or 2, so concurrent calls with
//! different overrides do not interfere.
//!
//! ## Global registration
//!
//! [`register_global_type`] is a setup step. Call it during process startup,
//! not while validations are running on other threads: a snapshot taken
//! mid-registration sees either the old or the new table, never a mix within
//! one entry, but which one is unspecified.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use rand::seq::SliceRandom;
use serde_json::{Map, Number, Value};

use crate::error::SchemaError;

/// Context handed to custom predicates so they can make relational checks.
#[derive(Debug, Clone, Copy)]
pub struct CheckContext<'a> {
    /// Dotted path of the value being checked.
    pub path: &'a str,
    /// The whole value the call started from.
    pub root: &'a Value,
    /// The array or object directly containing the value, if any.
    pub parent: Option<&'a Value>,
}

/// A custom check predicate.
pub type CheckFn = Arc<dyn Fn(&Value, &CheckContext<'_>) -> bool + Send + Sync>;

/// A custom sample generator.
pub type SampleFn = Arc<dyn Fn() -> Value + Send + Sync>;

/// The builtin scalar kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// `string` / `s`
    String,
    /// `number` / `n`
    Number,
    /// `boolean` / `b`
    Boolean,
    /// `integer` / `i`
    Integer,
    /// `function` / `f`. JSON carries no callables, so nothing passes the
    /// check and the sample is `null`.
    Function,
}

impl Primitive {
    /// All builtins with their long and short names.
    pub const ALL: [(Primitive, &'static str, &'static str); 5] = [
        (Primitive::String, "string", "s"),
        (Primitive::Number, "number", "n"),
        (Primitive::Boolean, "boolean", "b"),
        (Primitive::Integer, "integer", "i"),
        (Primitive::Function, "function", "f"),
    ];

    /// Whether `value` is of this kind.
    pub fn check(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Integer => is_integer(value),
            Self::Function => false,
        }
    }

    /// The zero value of this kind.
    pub fn sample(self) -> Value {
        match self {
            Self::String => Value::String(String::new()),
            Self::Number | Self::Integer => Value::from(0),
            Self::Boolean => Value::Bool(true),
            Self::Function => Value::Null,
        }
    }

    /// Convert a textual default into this kind's native representation.
    ///
    /// Unparseable numbers become `null`.
    pub fn cast(self, text: &str) -> Value {
        match self {
            Self::Integer => parse_int_prefix(text).unwrap_or(Value::Null),
            Self::Number => parse_float_prefix(text).unwrap_or(Value::Null),
            // Every declared boolean default casts to `true`, whatever the
            // token says. Left as-is until the intended token set is settled.
            Self::Boolean => Value::Bool(true),
            Self::String | Self::Function => Value::String(text.to_string()),
        }
    }
}

/// What a registered type name resolves to.
#[derive(Clone)]
pub enum TypeDef {
    /// One of the builtin kinds.
    Primitive(Primitive),
    /// An enumerated type. Strings must be members; any non-string value is
    /// accepted. Samples pick a member uniformly at random.
    Enum(Vec<Value>),
    /// A caller-supplied predicate, with an optional sample generator
    /// (`null` is sampled when absent).
    Custom {
        /// The check predicate.
        check: CheckFn,
        /// The sample generator.
        sample: Option<SampleFn>,
    },
}

impl TypeDef {
    /// A custom type from a predicate alone.
    pub fn predicate<F>(check: F) -> Self
    where
        F: Fn(&Value, &CheckContext<'_>) -> bool + Send + Sync + 'static,
    {
        Self::Custom {
            check: Arc::new(check),
            sample: None,
        }
    }

    /// An enumerated type from its members.
    pub fn one_of<I, V>(members: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::Enum(members.into_iter().map(Into::into).collect())
    }

    /// Attach a sample generator. Only custom types carry one; builtins and
    /// enums already know how to sample and are returned unchanged.
    #[must_use]
    pub fn with_sample<F>(self, sample: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        match self {
            Self::Custom { check, .. } => Self::Custom {
                check,
                sample: Some(Arc::new(sample)),
            },
            other => other,
        }
    }

    /// Run the check half of the entry.
    pub fn check(&self, value: &Value, ctx: &CheckContext<'_>) -> bool {
        match self {
            Self::Primitive(kind) => kind.check(value),
            // Only strings are held to membership.
            Self::Enum(members) => !value.is_string() || members.contains(value),
            Self::Custom { check, .. } => check(value, ctx),
        }
    }

    /// Run the sample half of the entry.
    pub fn sample(&self) -> Value {
        match self {
            Self::Primitive(kind) => kind.sample(),
            Self::Enum(members) => members
                .choose(&mut rand::thread_rng())
                .cloned()
                .unwrap_or(Value::Null),
            Self::Custom { sample, .. } => sample.as_ref().map_or(Value::Null, |f| f()),
        }
    }

    /// Convert a textual default. Only builtins convert; everything else
    /// keeps the text.
    pub fn cast(&self, text: &str) -> Value {
        match self {
            Self::Primitive(kind) => kind.cast(text),
            Self::Enum(_) | Self::Custom { .. } => Value::String(text.to_string()),
        }
    }
}

impl fmt::Debug for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(kind) => f.debug_tuple("Primitive").field(kind).finish(),
            Self::Enum(members) => f.debug_tuple("Enum").field(members).finish(),
            Self::Custom { sample, .. } => f
                .debug_struct("Custom")
                .field("has_sample", &sample.is_some())
                .finish_non_exhaustive(),
        }
    }
}

/// Ad-hoc types supplied for a single call.
#[derive(Debug, Clone, Default)]
pub struct TypeOverrides {
    types: HashMap<String, TypeDef>,
}

impl TypeOverrides {
    /// An empty set of overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a type, replacing any earlier one with the same name.
    pub fn insert(&mut self, name: impl Into<String>, def: TypeDef) {
        self.types.insert(name.into(), def);
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, def: TypeDef) -> Self {
        self.insert(name, def);
        self
    }

    /// Returns true if no overrides are set.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterate over the overrides in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypeDef)> {
        self.types.iter().map(|(name, def)| (name.as_str(), def))
    }
}

fn global_types() -> &'static RwLock<HashMap<String, TypeDef>> {
    static GLOBAL: OnceLock<RwLock<HashMap<String, TypeDef>>> = OnceLock::new();
    GLOBAL.get_or_init(Default::default)
}

/// Add a type to the process-wide extension table.
///
/// Every snapshot built afterwards sees it unless a call-supplied override
/// shadows the name. Not meant to race with active validations.
pub fn register_global_type(name: impl Into<String>, def: TypeDef) {
    let name = name.into();
    tracing::debug!(type_name = %name, "registering global type");
    global_types().write().insert(name, def);
}

/// An immutable name → type table for one call.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: HashMap<String, TypeDef>,
}

impl TypeRegistry {
    /// Only the builtin primitives.
    pub fn builtin() -> Self {
        let mut types = HashMap::new();
        for (kind, long, short) in Primitive::ALL {
            types.insert(long.to_string(), TypeDef::Primitive(kind));
            types.insert(short.to_string(), TypeDef::Primitive(kind));
        }
        Self { types }
    }

    /// Builtins, then the process-wide table, then `overrides`.
    pub fn snapshot(overrides: &TypeOverrides) -> Self {
        let mut registry = Self::builtin();
        {
            let global = global_types().read();
            for (name, def) in global.iter() {
                registry.types.insert(name.clone(), def.clone());
            }
        }
        for (name, def) in overrides.iter() {
            registry.types.insert(name.to_string(), def.clone());
        }
        registry
    }

    /// Look up an entry.
    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    /// Whether `name` is registered.
    pub fn has(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Check `value` against the named type.
    ///
    /// An empty name always passes.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::UnknownType` for a non-empty unregistered name.
    pub fn check(
        &self,
        name: &str,
        value: &Value,
        ctx: &CheckContext<'_>,
    ) -> Result<bool, SchemaError> {
        if name.is_empty() {
            return Ok(true);
        }
        self.get(name)
            .map(|def| def.check(value, ctx))
            .ok_or_else(|| SchemaError::UnknownType {
                name: name.to_string(),
            })
    }

    /// A sample of the named type, or `None` if it is not registered.
    pub fn sample(&self, name: &str) -> Option<Value> {
        self.get(name).map(TypeDef::sample)
    }

    /// Cast a textual default to the named type, or `None` if it is not
    /// registered.
    pub fn cast(&self, name: &str, text: &str) -> Option<Value> {
        self.get(name).map(|def| def.cast(text))
    }

    /// Every registered name, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// A fresh sample of every registered type, keyed by name in sorted order.
    pub fn samples(&self) -> Map<String, Value> {
        let sorted: BTreeMap<&str, Value> = self
            .types
            .iter()
            .map(|(name, def)| (name.as_str(), def.sample()))
            .collect();
        sorted
            .into_iter()
            .map(|(name, sample)| (name.to_string(), sample))
            .collect()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Integers are finite numbers without a fractional part, whatever their
/// JSON spelling.
pub(crate) fn is_integer(value: &Value) -> bool {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => true,
        Value::Number(n) => n.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0),
        _ => false,
    }
}

/// Leading integer of `text`, ignoring leading whitespace and anything after
/// the digits.
fn parse_int_prefix(text: &str) -> Option<Value> {
    let text = text.trim_start();
    let sign_len = usize::from(text.starts_with(['+', '-']));
    let digits = text[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits == 0 {
        return None;
    }
    let prefix = &text[..sign_len + digits];
    match prefix.parse::<i64>() {
        Ok(n) => Some(Value::from(n)),
        Err(_) => prefix.parse::<f64>().ok().and_then(float_value),
    }
}

/// Leading decimal number of `text` (sign, digits, fraction, exponent).
fn parse_float_prefix(text: &str) -> Option<Value> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = usize::from(text.starts_with(['+', '-']));
    let int_digits = bytes[end..].iter().take_while(|b| b.is_ascii_digit()).count();
    end += int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = bytes[end + 1..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if int_digits + frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits + frac_digits == 0 {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = bytes[exp_end.min(bytes.len())..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }
    text[..end].parse::<f64>().ok().and_then(float_value)
}

/// Integral floats come back as JSON integers so `2` casts to `2`, not `2.0`.
fn float_value(f: f64) -> Option<Value> {
    if f.fract() == 0.0 && f.abs() < 9.0e15 {
        return Some(Value::from(f as i64));
    }
    Number::from_f64(f).map(Value::Number)
}
