//! Directory and reference configuration.

use rolodex_core::SubstringMatchType;
use serde::{Deserialize, Serialize};

fn default_id_field() -> String {
    "id".to_string()
}

fn default_password_field() -> String {
    "password".to_string()
}

/// Static configuration of one directory.
///
/// The directory name doubles as its backing collection name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryDescriptor {
    /// Directory (and collection) name.
    pub name: String,
    /// Schema resolved at session open.
    pub schema: String,
    /// Field holding the record identifier.
    #[serde(default = "default_id_field")]
    pub id_field: String,
    /// Field holding the stored password hash.
    #[serde(default = "default_password_field")]
    pub password_field: String,
    /// How fulltext filter values are compiled.
    #[serde(default)]
    pub substring_match_type: SubstringMatchType,
    /// Whether sessions refuse writes.
    #[serde(default)]
    pub read_only: bool,
}

impl DirectoryDescriptor {
    /// Descriptor with default id/password fields and `subinitial` matching.
    pub fn new(name: impl Into<String>, schema: impl Into<String>) -> Self {
        DirectoryDescriptor {
            name: name.into(),
            schema: schema.into(),
            id_field: default_id_field(),
            password_field: default_password_field(),
            substring_match_type: SubstringMatchType::default(),
            read_only: false,
        }
    }

    /// Override the identifier field.
    pub fn id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    /// Override the password field.
    pub fn password_field(mut self, field: impl Into<String>) -> Self {
        self.password_field = field.into();
        self
    }

    /// Override the substring match policy.
    pub fn substring_match_type(mut self, match_type: SubstringMatchType) -> Self {
        self.substring_match_type = match_type;
        self
    }

    /// Mark the directory read-only.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}

/// Static configuration of one many-to-many reference.
///
/// `field` names the entry field the reference populates on fetch;
/// `collection` is the join collection holding one `{source, target}` row
/// per link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceDescriptor {
    /// Entry field populated with counterpart ids.
    pub field: String,
    /// Join collection name.
    pub collection: String,
    /// Field of the join row holding the source id.
    pub source_field: String,
    /// Field of the join row holding the target id.
    pub target_field: String,
}

impl ReferenceDescriptor {
    /// Descriptor for a join collection with the given endpoint fields.
    pub fn new(
        field: impl Into<String>,
        collection: impl Into<String>,
        source_field: impl Into<String>,
        target_field: impl Into<String>,
    ) -> Self {
        ReferenceDescriptor {
            field: field.into(),
            collection: collection.into(),
            source_field: source_field.into(),
            target_field: target_field.into(),
        }
    }
}
