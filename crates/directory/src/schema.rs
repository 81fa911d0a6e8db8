//! Schema descriptors and the registry they are resolved from.
//!
//! A session binds to one schema for its whole lifetime: the descriptor is
//! resolved from the registry at open time and shared immutably (`Arc`)
//! afterwards. Field order is the declaration order.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use rolodex_core::{DirectoryError, FieldValue, Result};
use serde::{Deserialize, Serialize};

/// Declared type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// UTF-8 string.
    String,
    /// 32-bit integer.
    Integer,
    /// 64-bit integer.
    Long,
    /// Boolean.
    Boolean,
    /// UTC timestamp.
    Date,
    /// List of strings.
    StringList,
}

/// One declared field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field name.
    pub name: String,
    /// Declared type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl FieldDescriptor {
    /// A field named `name` of the given type.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        FieldDescriptor {
            name: name.into(),
            field_type,
        }
    }
}

/// A named, ordered list of field declarations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl SchemaDescriptor {
    /// A schema named `name` with the given fields, in declaration order.
    pub fn new(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        SchemaDescriptor {
            name: name.into(),
            fields,
        }
    }

    /// The schema name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Look up a declared field.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whether `name` is declared.
    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Error unless every key of `values` is a declared field.
    ///
    /// Value types are trusted from the codec; only membership is checked.
    pub fn check_fields<'a>(
        &self,
        mut names: impl Iterator<Item = (&'a String, &'a FieldValue)>,
    ) -> Result<()> {
        match names.find(|(name, _)| !self.has_field(name)) {
            Some((name, _)) => Err(DirectoryError::InvalidSchema {
                reason: format!("field `{name}` is not declared by schema `{}`", self.name),
            }),
            None => Ok(()),
        }
    }
}

/// Registry the directories resolve schemas from at session open.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: RwLock<HashMap<String, Arc<SchemaDescriptor>>>,
}

impl SchemaRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        SchemaRegistry::default()
    }

    /// Register a schema under its own name, replacing any previous one.
    pub fn register(&self, schema: SchemaDescriptor) {
        self.schemas
            .write()
            .insert(schema.name().to_string(), Arc::new(schema));
    }

    /// Resolve a schema by name.
    pub fn get(&self, name: &str) -> Option<Arc<SchemaDescriptor>> {
        self.schemas.read().get(name).cloned()
    }

    /// Resolve a schema by name, or fail with `InvalidSchema`.
    pub fn resolve(&self, name: &str) -> Result<Arc<SchemaDescriptor>> {
        self.get(name).ok_or_else(|| DirectoryError::InvalidSchema {
            reason: format!("`{name}` is not a registered schema"),
        })
    }
}
