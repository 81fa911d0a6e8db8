//! Serialization codec between field maps and store documents.
//!
//! Encoding is pure: no side effects, no store access. The round-trip law
//! `decode(encode(m)) == m` holds for every field map whose values are of
//! the supported scalar/list types; `Null` entries are dropped rather than
//! persisted as null-valued fields, which is what makes partial updates
//! send only the fields they mean to touch.

use crate::document::{Document, StoreValue, ID_FIELD};
use crate::error::{DirectoryError, Result};
use crate::value::{FieldMap, FieldValue};

/// Encode one field map into a store document.
///
/// `Null` entries are omitted. A value with no store representation fails
/// with [`DirectoryError::UnsupportedValueType`] and nothing is emitted.
pub fn encode(field_map: &FieldMap) -> Result<Document> {
    let mut doc = Document::new();
    for (field, value) in field_map {
        if let Some(encoded) = encode_value(field, value)? {
            doc.insert(field.clone(), encoded);
        }
    }
    Ok(doc)
}

/// Encode one scalar or list value.
///
/// Returns `Ok(None)` for `Null` (the field is dropped), an error when the
/// value cannot be represented. `field` is only used in the error.
pub fn encode_value(field: &str, value: &FieldValue) -> Result<Option<StoreValue>> {
    let encoded = match value {
        FieldValue::Null => return Ok(None),
        FieldValue::Str(s) => StoreValue::Str(s.clone()),
        FieldValue::Int(i) => StoreValue::Int(*i),
        FieldValue::Long(l) => StoreValue::Long(*l),
        FieldValue::Bool(b) => StoreValue::Bool(*b),
        FieldValue::Date(d) => StoreValue::Date(*d),
        FieldValue::StrList(items) => {
            StoreValue::Array(items.iter().cloned().map(StoreValue::Str).collect())
        }
        FieldValue::Float(_) => {
            return Err(DirectoryError::UnsupportedValueType {
                field: field.to_string(),
                kind: value.kind(),
            })
        }
    };
    Ok(Some(encoded))
}

/// Decode a store document back into a field map.
///
/// The store identifier `_id` is not part of the logical record and is
/// dropped. Decoding is total: every store value has a field-map reading,
/// with arrays flattened to their elements' string forms and object ids
/// rendered as strings.
pub fn decode(document: &Document) -> FieldMap {
    document
        .iter()
        .filter(|(field, _)| field.as_str() != ID_FIELD)
        .map(|(field, value)| (field.clone(), decode_value(value)))
        .collect()
}

fn decode_value(value: &StoreValue) -> FieldValue {
    match value {
        StoreValue::Str(s) => FieldValue::Str(s.clone()),
        StoreValue::Int(i) => FieldValue::Int(*i),
        StoreValue::Long(l) => FieldValue::Long(*l),
        StoreValue::Bool(b) => FieldValue::Bool(*b),
        StoreValue::Date(d) => FieldValue::Date(*d),
        StoreValue::Array(items) => FieldValue::StrList(
            items
                .iter()
                .map(|item| match item {
                    StoreValue::Str(s) => s.clone(),
                    other => other.to_display_string(),
                })
                .collect(),
        ),
        StoreValue::ObjectId(id) => FieldValue::Str(id.to_string()),
    }
}
