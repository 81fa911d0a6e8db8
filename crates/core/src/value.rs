//! Field values and field maps.
//!
//! A [`FieldMap`] is the name → value representation of one logical record,
//! the shape directory callers hand to `create_entry` and receive back from
//! reads. Values are a closed set of scalars plus a list-of-strings; the
//! codec decides which of them can reach the store.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name → value mapping for one record.
pub type FieldMap = BTreeMap<String, FieldValue>;

/// A single field's value.
///
/// `Null` stands for an absent value and is dropped at encode time. `Float`
/// has no store representation and fails encoding; it exists because callers
/// hand directories loosely-typed data and the codec is where the line is
/// drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// Absent value; never persisted.
    Null,
    /// UTF-8 string.
    Str(String),
    /// 32-bit integer.
    Int(i32),
    /// 64-bit integer.
    Long(i64),
    /// Boolean.
    Bool(bool),
    /// UTC timestamp.
    Date(DateTime<Utc>),
    /// List of strings.
    StrList(Vec<String>),
    /// 64-bit float; not representable in the store.
    Float(f64),
}

impl FieldValue {
    /// Type name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Str(_) => "string",
            FieldValue::Int(_) => "integer",
            FieldValue::Long(_) => "long",
            FieldValue::Bool(_) => "boolean",
            FieldValue::Date(_) => "date",
            FieldValue::StrList(_) => "string list",
            FieldValue::Float(_) => "float",
        }
    }

    /// Whether this value is `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Borrow the string contents, if this is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// String form of the value, regardless of its type.
    ///
    /// This is the coercion used for identifier keys and projections; it is
    /// not type-preserving and lists render comma-separated.
    pub fn to_string_key(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Str(s) => s.clone(),
            FieldValue::Int(i) => i.to_string(),
            FieldValue::Long(l) => l.to_string(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Date(d) => d.to_rfc3339(),
            FieldValue::StrList(l) => l.join(","),
            FieldValue::Float(f) => f.to_string(),
        }
    }

    /// Ordering used by client-side sorts.
    ///
    /// Same-type values compare natively; mixed types fall back to their
    /// string forms. Floats never reach sorted entries (they cannot be
    /// stored), so total ordering on the rest is enough.
    pub fn compare(&self, other: &FieldValue) -> std::cmp::Ordering {
        use FieldValue::*;
        match (self, other) {
            (Str(a), Str(b)) => a.cmp(b),
            (Int(a), Int(b)) => a.cmp(b),
            (Long(a), Long(b)) => a.cmp(b),
            (Int(a), Long(b)) => i64::from(*a).cmp(b),
            (Long(a), Int(b)) => a.cmp(&i64::from(*b)),
            (Bool(a), Bool(b)) => a.cmp(b),
            (Date(a), Date(b)) => a.cmp(b),
            _ => self.to_string_key().cmp(&other.to_string_key()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Str(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Str(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Long(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(v: DateTime<Utc>) -> Self {
        FieldValue::Date(v)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(v: Vec<String>) -> Self {
        FieldValue::StrList(v)
    }
}
