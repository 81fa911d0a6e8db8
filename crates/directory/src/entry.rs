//! The in-memory, schema-bound view of one record.
//!
//! An [`Entry`] is created on read or after a write, never persisted as-is:
//! the store document is the persisted form. Mutations go through [`set`],
//! which records the field as modified; `update_entry` sends modified
//! fields only, so an entry round-tripped without changes produces an empty
//! delta.
//!
//! [`set`]: Entry::set

use std::collections::BTreeSet;
use std::sync::Arc;

use rolodex_core::{FieldMap, FieldValue, Result};

use crate::schema::SchemaDescriptor;

/// One record, bound to its schema and identifier.
#[derive(Debug, Clone)]
pub struct Entry {
    id: String,
    schema: Arc<SchemaDescriptor>,
    values: FieldMap,
    modified: BTreeSet<String>,
}

impl Entry {
    /// Materialize an entry from a decoded field map. No field is marked
    /// modified.
    pub fn new(id: impl Into<String>, schema: Arc<SchemaDescriptor>, values: FieldMap) -> Self {
        Entry {
            id: id.into(),
            schema,
            values,
            modified: BTreeSet::new(),
        }
    }

    /// The record identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The schema this entry is bound to.
    pub fn schema(&self) -> &Arc<SchemaDescriptor> {
        &self.schema
    }

    /// All current field values.
    pub fn values(&self) -> &FieldMap {
        &self.values
    }

    /// One field's value.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(field)
    }

    /// Set a declared field and mark it modified.
    pub fn set(&mut self, field: impl Into<String>, value: FieldValue) -> Result<()> {
        let field = field.into();
        self.schema.check_fields(std::iter::once((&field, &value)))?;
        self.values.insert(field.clone(), value);
        self.modified.insert(field);
        Ok(())
    }

    /// Whether any field has been modified since materialization.
    pub fn is_modified(&self) -> bool {
        !self.modified.is_empty()
    }

    /// The modified subset of the field map, i.e. the update delta.
    pub fn modified_fields(&self) -> FieldMap {
        self.modified
            .iter()
            .filter_map(|field| {
                self.values
                    .get(field)
                    .map(|value| (field.clone(), value.clone()))
            })
            .collect()
    }

    /// Forget modification marks, e.g. after a successful update.
    pub fn clear_modified(&mut self) {
        self.modified.clear();
    }

    /// Set a field without marking it modified.
    ///
    /// Used when reference-backed fields are populated on fetch; those
    /// values describe the link store, not a pending write.
    pub(crate) fn set_fetched(&mut self, field: String, value: FieldValue) {
        self.values.insert(field, value);
    }
}
