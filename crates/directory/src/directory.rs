//! The directory capability and its document-store implementation.
//!
//! A [`Directory`] can describe itself and open sessions. The one concrete
//! variant here binds a descriptor to a store client and a schema
//! registry; the schema is resolved at every session open, so registering
//! a schema after constructing the directory is fine, and an unregistered
//! name fails the open, not the construction.

use std::collections::BTreeMap;
use std::sync::Arc;

use rolodex_core::Result;
use rolodex_store::StoreClient;
use tracing::debug;

use crate::auth::{PasswordVerifier, PlainTextVerifier};
use crate::config::{DirectoryDescriptor, ReferenceDescriptor};
use crate::reference::Reference;
use crate::schema::SchemaRegistry;
use crate::session::{DeleteConstraint, DirectorySession, SessionGrants};

/// Capability set of a directory backend: describe itself, open sessions.
pub trait Directory {
    /// The directory name.
    fn name(&self) -> &str;

    /// The static configuration.
    fn descriptor(&self) -> &DirectoryDescriptor;

    /// Open a session with full grants.
    fn open_session(&self) -> Result<DirectorySession>;
}

/// Directory backed by one document-store collection.
pub struct DocumentDirectory {
    descriptor: DirectoryDescriptor,
    registry: Arc<SchemaRegistry>,
    client: Arc<StoreClient>,
    references: Vec<ReferenceDescriptor>,
    verifier: Arc<dyn PasswordVerifier>,
    delete_constraints: Vec<Arc<dyn DeleteConstraint>>,
}

impl DocumentDirectory {
    /// Bind a descriptor to a store client and schema registry.
    pub fn new(
        descriptor: DirectoryDescriptor,
        registry: Arc<SchemaRegistry>,
        client: Arc<StoreClient>,
    ) -> Self {
        DocumentDirectory {
            descriptor,
            registry,
            client,
            references: Vec::new(),
            verifier: Arc::new(PlainTextVerifier),
            delete_constraints: Vec::new(),
        }
    }

    /// Attach a reference; its field is populated when sessions fetch
    /// references, and [`reference`](Self::reference) manages its links.
    pub fn with_reference(mut self, descriptor: ReferenceDescriptor) -> Self {
        self.references.push(descriptor);
        self
    }

    /// Replace the password verifier.
    pub fn with_verifier(mut self, verifier: Arc<dyn PasswordVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    /// Add a check run before sessions delete an entry.
    pub fn with_delete_constraint(mut self, constraint: Arc<dyn DeleteConstraint>) -> Self {
        self.delete_constraints.push(constraint);
        self
    }

    /// Link store for the reference populated into `field`.
    pub fn reference(&self, field: &str) -> Option<Reference> {
        self.references
            .iter()
            .find(|r| r.field == field)
            .map(|r| Reference::new(r.clone(), &self.client))
    }

    /// Open a session carrying explicit grants.
    ///
    /// A read-only directory never hands out the write grant, whatever the
    /// caller asks for.
    pub fn open_session_with_grants(&self, mut grants: SessionGrants) -> Result<DirectorySession> {
        grants.write = grants.write && !self.descriptor.read_only;
        let schema = self.registry.resolve(&self.descriptor.schema)?;
        let collection = self.client.collection(&self.descriptor.name);
        let references: BTreeMap<String, Reference> = self
            .references
            .iter()
            .map(|r| (r.field.clone(), Reference::new(r.clone(), &self.client)))
            .collect();
        debug!(directory = %self.descriptor.name, schema = schema.name(), "session opened");
        Ok(DirectorySession::new(
            self.descriptor.clone(),
            schema,
            collection,
            references,
            Arc::clone(&self.verifier),
            self.delete_constraints.clone(),
            grants,
        ))
    }

    /// Run `f` with a session, closing it on every exit path.
    ///
    /// The session closes when it drops, error or not, so scoped use never
    /// leaks an open handle.
    pub fn with_session<T>(&self, f: impl FnOnce(&DirectorySession) -> Result<T>) -> Result<T> {
        let session = self.open_session()?;
        f(&session)
    }
}

impl Directory for DocumentDirectory {
    fn name(&self) -> &str {
        &self.descriptor.name
    }

    fn descriptor(&self) -> &DirectoryDescriptor {
        &self.descriptor
    }

    fn open_session(&self) -> Result<DirectorySession> {
        self.open_session_with_grants(SessionGrants::default())
    }
}

impl std::fmt::Debug for DocumentDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentDirectory")
            .field("descriptor", &self.descriptor)
            .field("references", &self.references)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDescriptor, FieldType, SchemaDescriptor};
    use rolodex_core::DirectoryError;
    use rolodex_store::StoreConfig;

    fn registry_with_user_schema() -> Arc<SchemaRegistry> {
        let registry = SchemaRegistry::new();
        registry.register(SchemaDescriptor::new(
            "user",
            vec![FieldDescriptor::new("id", FieldType::String)],
        ));
        Arc::new(registry)
    }

    #[test]
    fn test_open_session_resolves_schema() {
        let client = Arc::new(StoreClient::open(StoreConfig::new("db")));
        let dir = DocumentDirectory::new(
            DirectoryDescriptor::new("users", "user"),
            registry_with_user_schema(),
            client,
        );
        let session = dir.open_session().unwrap();
        assert_eq!(session.schema().name(), "user");
        assert_eq!(session.directory_name(), "users");
    }

    #[test]
    fn test_open_session_unregistered_schema_fails() {
        let client = Arc::new(StoreClient::open(StoreConfig::new("db")));
        let dir = DocumentDirectory::new(
            DirectoryDescriptor::new("users", "ghost"),
            registry_with_user_schema(),
            client,
        );
        let err = dir.open_session().unwrap_err();
        assert!(matches!(err, DirectoryError::InvalidSchema { .. }));
    }

    #[test]
    fn test_read_only_directory_revokes_write_grant() {
        let client = Arc::new(StoreClient::open(StoreConfig::new("db")));
        let dir = DocumentDirectory::new(
            DirectoryDescriptor::new("users", "user").read_only(),
            registry_with_user_schema(),
            client,
        );
        let session = dir.open_session().unwrap();
        let mut map = rolodex_core::FieldMap::new();
        map.insert("id".to_string(), rolodex_core::FieldValue::Str("u".into()));
        let err = session.create_entry(map).unwrap_err();
        assert!(matches!(err, DirectoryError::PermissionDenied { .. }));
    }

    #[test]
    fn test_with_session_closes_on_error() {
        let client = Arc::new(StoreClient::open(StoreConfig::new("db")));
        let dir = DocumentDirectory::new(
            DirectoryDescriptor::new("users", "user"),
            registry_with_user_schema(),
            client,
        );
        let result: Result<()> = dir.with_session(|session| {
            assert!(!session.is_closed());
            Err(DirectoryError::SessionClosed)
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_sessions_share_collection() {
        let client = Arc::new(StoreClient::open(StoreConfig::new("db")));
        let dir = DocumentDirectory::new(
            DirectoryDescriptor::new("users", "user"),
            registry_with_user_schema(),
            client,
        );
        let a = dir.open_session().unwrap();
        let mut map = rolodex_core::FieldMap::new();
        map.insert("id".to_string(), rolodex_core::FieldValue::Str("u".into()));
        a.create_entry(map).unwrap();

        let b = dir.open_session().unwrap();
        assert!(b.has_entry("u").unwrap());
    }
}
