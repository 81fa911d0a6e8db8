//! Store documents and store-native values.
//!
//! A [`Document`] is the persisted form of a record: an ordered map of field
//! name → [`StoreValue`]. The reserved `_id` field carries the store-assigned
//! object id (or an explicit key, for sequence records) and is what insert
//! uniqueness is enforced on.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reserved document key holding the store identifier.
pub const ID_FIELD: &str = "_id";

/// A value as the store represents it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StoreValue {
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
    /// Homogeneous or mixed array.
    Array(Vec<StoreValue>),
    /// Store-assigned object id.
    ObjectId(Uuid),
}

impl StoreValue {
    /// Borrow the string contents, if this is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            StoreValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integer contents widened to `i64`, if numeric.
    pub fn as_long(&self) -> Option<i64> {
        match self {
            StoreValue::Int(i) => Some(i64::from(*i)),
            StoreValue::Long(l) => Some(*l),
            _ => None,
        }
    }

    /// String form used when a caller projects a typed field to text.
    pub fn to_display_string(&self) -> String {
        match self {
            StoreValue::Str(s) => s.clone(),
            StoreValue::Int(i) => i.to_string(),
            StoreValue::Long(l) => l.to_string(),
            StoreValue::Bool(b) => b.to_string(),
            StoreValue::Date(d) => d.to_rfc3339(),
            StoreValue::Array(items) => items
                .iter()
                .map(StoreValue::to_display_string)
                .collect::<Vec<_>>()
                .join(","),
            StoreValue::ObjectId(id) => id.to_string(),
        }
    }
}

/// One persisted record: an ordered field name → value map.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document(BTreeMap<String, StoreValue>);

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Document(BTreeMap::new())
    }

    /// Insert a field, replacing any previous value.
    pub fn insert(&mut self, field: impl Into<String>, value: StoreValue) -> Option<StoreValue> {
        self.0.insert(field.into(), value)
    }

    /// Look up a field.
    pub fn get(&self, field: &str) -> Option<&StoreValue> {
        self.0.get(field)
    }

    /// Look up a string field.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(StoreValue::as_str)
    }

    /// Remove a field, returning its value.
    pub fn remove(&mut self, field: &str) -> Option<StoreValue> {
        self.0.remove(field)
    }

    /// Whether a field is present.
    pub fn contains_field(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// The store identifier, if assigned.
    pub fn id(&self) -> Option<&StoreValue> {
        self.get(ID_FIELD)
    }

    /// Set the store identifier.
    pub fn set_id(&mut self, id: StoreValue) {
        self.insert(ID_FIELD, id);
    }

    /// Number of fields, `_id` included.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the document holds no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &StoreValue)> {
        self.0.iter()
    }

    /// Copy every field of `other` into this document ($set semantics).
    pub fn apply_set(&mut self, other: &Document) {
        for (field, value) in other.iter() {
            self.0.insert(field.clone(), value.clone());
        }
    }
}

impl FromIterator<(String, StoreValue)> for Document {
    fn from_iter<T: IntoIterator<Item = (String, StoreValue)>>(iter: T) -> Self {
        Document(iter.into_iter().collect())
    }
}
