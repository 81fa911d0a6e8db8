//! CRUD, query and authentication against one directory collection.
//!
//! A session is Open from construction until [`close`]; every operation on
//! a closed session fails with `SessionClosed`. There are no other states.
//! Sessions are meant for single-logical-operation use; the collection
//! behind them is shared, and only per-call document operations are atomic.
//!
//! Reads are gated on the read grant and come back empty for callers
//! without it; writes without the write grant are an error. Query-style
//! reads prefer empty sequences over errors.
//!
//! [`close`]: DirectorySession::close

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rolodex_core::{codec, DirectoryError, FieldMap, FieldValue, Result, StoreValue};
use rolodex_store::{Collection, Filter, FindOptions, SubstringPattern};
use tracing::debug;

use crate::auth::PasswordVerifier;
use crate::config::DirectoryDescriptor;
use crate::entry::Entry;
use crate::reference::Reference;
use crate::schema::SchemaDescriptor;

/// Read/write grants attached to a session at open time.
#[derive(Debug, Clone, Copy)]
pub struct SessionGrants {
    /// Whether reads return data.
    pub read: bool,
    /// Whether writes are allowed.
    pub write: bool,
}

impl Default for SessionGrants {
    fn default() -> Self {
        SessionGrants {
            read: true,
            write: true,
        }
    }
}

/// One client-side sort key.
#[derive(Debug, Clone)]
pub struct OrderBy {
    /// Field to compare.
    pub field: String,
    /// Ascending when true.
    pub ascending: bool,
}

impl OrderBy {
    /// Ascending sort on `field`.
    pub fn asc(field: impl Into<String>) -> Self {
        OrderBy {
            field: field.into(),
            ascending: true,
        }
    }

    /// Descending sort on `field`.
    pub fn desc(field: impl Into<String>) -> Self {
        OrderBy {
            field: field.into(),
            ascending: false,
        }
    }
}

/// Options shaping a [`DirectorySession::query_with`] call.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Fields whose filter values compile to substring patterns.
    pub fulltext: BTreeSet<String>,
    /// Client-side sort keys, applied after materializing results.
    pub order_by: Vec<OrderBy>,
    /// Whether reference-backed fields are populated on each entry.
    pub fetch_references: bool,
    /// Cap on returned entries; `None` or zero is unbounded.
    pub limit: Option<usize>,
    /// Matching entries to skip, applied at the store.
    pub offset: usize,
}

impl QueryOptions {
    /// Default options: exact matching, no sort, no pagination.
    pub fn new() -> Self {
        QueryOptions::default()
    }

    /// Treat `field` as fulltext in this query.
    pub fn fulltext_field(mut self, field: impl Into<String>) -> Self {
        self.fulltext.insert(field.into());
        self
    }

    /// Add a sort key.
    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    /// Populate reference-backed fields on each returned entry.
    pub fn fetch_references(mut self) -> Self {
        self.fetch_references = true;
        self
    }

    /// Return at most `limit` entries.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip the first `offset` matching entries.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }
}

/// Referential check run before an entry is physically deleted.
pub trait DeleteConstraint: Send + Sync {
    /// Error to veto deletion of `id`.
    fn check(&self, id: &str) -> Result<()>;
}

/// A bound, closeable handle onto one directory's collection.
pub struct DirectorySession {
    descriptor: DirectoryDescriptor,
    schema: Arc<SchemaDescriptor>,
    collection: Arc<Collection>,
    references: BTreeMap<String, Reference>,
    verifier: Arc<dyn PasswordVerifier>,
    delete_constraints: Vec<Arc<dyn DeleteConstraint>>,
    grants: SessionGrants,
    closed: AtomicBool,
}

impl DirectorySession {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        descriptor: DirectoryDescriptor,
        schema: Arc<SchemaDescriptor>,
        collection: Arc<Collection>,
        references: BTreeMap<String, Reference>,
        verifier: Arc<dyn PasswordVerifier>,
        delete_constraints: Vec<Arc<dyn DeleteConstraint>>,
        grants: SessionGrants,
    ) -> Self {
        DirectorySession {
            descriptor,
            schema,
            collection,
            references,
            verifier,
            delete_constraints,
            grants,
            closed: AtomicBool::new(false),
        }
    }

    /// The directory this session is bound to.
    pub fn directory_name(&self) -> &str {
        &self.descriptor.name
    }

    /// The schema resolved at open time.
    pub fn schema(&self) -> &Arc<SchemaDescriptor> {
        &self.schema
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Close the session. Idempotent; afterwards every operation fails
    /// with `SessionClosed`.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!(directory = %self.descriptor.name, "session closed");
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(DirectoryError::SessionClosed);
        }
        Ok(())
    }

    fn check_write(&self) -> Result<()> {
        if !self.grants.write {
            return Err(DirectoryError::PermissionDenied {
                permission: "write",
            });
        }
        Ok(())
    }

    fn id_filter(&self, id: &str) -> Filter {
        Filter::new().eq(
            self.descriptor.id_field.clone(),
            StoreValue::Str(id.to_string()),
        )
    }

    /// Look up one entry by identifier.
    ///
    /// Returns `None` for a missing entry and, deliberately, for a caller
    /// without the read grant.
    pub fn get_entry(&self, id: &str, fetch_references: bool) -> Result<Option<Entry>> {
        self.ensure_open()?;
        if !self.grants.read {
            return Ok(None);
        }
        let document = match self.collection.find_one(&self.id_filter(id)) {
            Some(doc) => doc,
            None => return Ok(None),
        };
        let mut entry = Entry::new(id, Arc::clone(&self.schema), codec::decode(&document));
        if fetch_references {
            self.populate_references(&mut entry)?;
        }
        Ok(Some(entry))
    }

    /// All entries of the directory, unfiltered.
    pub fn get_entries(&self) -> Result<Vec<Entry>> {
        self.query(&FieldMap::new())
    }

    /// Create one entry from a field map.
    ///
    /// The identifier field must be present and non-null; an existing
    /// entry under the same identifier is `DuplicateId` (checked before
    /// the insert, not left to the store's uniqueness feedback). The
    /// returned entry reflects exactly the fields supplied.
    pub fn create_entry(&self, field_map: FieldMap) -> Result<Entry> {
        self.ensure_open()?;
        self.check_write()?;
        self.schema.check_fields(field_map.iter())?;

        let id = match field_map.get(&self.descriptor.id_field) {
            Some(value) if !value.is_null() => value.to_string_key(),
            _ => {
                return Err(DirectoryError::InvalidSchema {
                    reason: format!(
                        "identifier field `{}` is missing from the field map",
                        self.descriptor.id_field
                    ),
                })
            }
        };
        if self.has_entry(&id)? {
            return Err(DirectoryError::DuplicateId { id });
        }

        let document = codec::encode(&field_map)?;
        self.collection.insert_one(document)?;
        debug!(directory = %self.descriptor.name, id, "entry created");
        Ok(Entry::new(id, Arc::clone(&self.schema), field_map))
    }

    /// Apply an entry's modified fields as a partial update.
    ///
    /// Unmodified fields are never sent. `WriteNotAcknowledged` means the
    /// store declined the write; `NoSuchEntry` means the write was fine
    /// but nothing matched the identifier (the entry vanished
    /// concurrently or never existed). Modification marks are cleared on
    /// success.
    pub fn update_entry(&self, entry: &mut Entry) -> Result<()> {
        self.ensure_open()?;
        self.check_write()?;

        let delta = entry.modified_fields();
        let set = codec::encode(&delta)?;
        let result = self.collection.update_one(&self.id_filter(entry.id()), &set);
        if !result.acknowledged {
            return Err(DirectoryError::WriteNotAcknowledged {
                operation: "entry update",
            });
        }
        if result.matched_count == 0 {
            return Err(DirectoryError::NoSuchEntry {
                id: entry.id().to_string(),
            });
        }
        debug!(directory = %self.descriptor.name, id = entry.id(), "entry updated");
        entry.clear_modified();
        Ok(())
    }

    /// Delete one entry by identifier.
    ///
    /// Delete constraints run before the physical delete. Deleting an
    /// identifier with no entry succeeds silently; callers needing
    /// referential integrity check existence first.
    pub fn delete_entry(&self, id: &str) -> Result<()> {
        self.ensure_open()?;
        self.check_write()?;
        for constraint in &self.delete_constraints {
            constraint.check(id)?;
        }
        let result = self.collection.delete_one(&self.id_filter(id));
        if !result.acknowledged {
            return Err(DirectoryError::WriteNotAcknowledged {
                operation: "entry delete",
            });
        }
        debug!(directory = %self.descriptor.name, id, "entry deleted");
        Ok(())
    }

    /// Whether an entry with this identifier exists.
    pub fn has_entry(&self, id: &str) -> Result<bool> {
        self.ensure_open()?;
        Ok(self.collection.count(&self.id_filter(id)) > 0)
    }

    /// Query with default options (exact matching, no pagination).
    pub fn query(&self, filter: &FieldMap) -> Result<Vec<Entry>> {
        self.query_with(filter, &QueryOptions::new())
    }

    /// Query the directory.
    ///
    /// Per filter field: an exact-match clause, or, when the field is in
    /// the options' fulltext set, a case-insensitive substring pattern
    /// compiled under the directory's match type. Null-valued filter
    /// fields are omitted entirely. Skip and limit run at the store, in
    /// insertion order; sort keys are applied afterwards, client-side. No
    /// match is an empty vec, never an error.
    pub fn query_with(&self, filter: &FieldMap, options: &QueryOptions) -> Result<Vec<Entry>> {
        self.ensure_open()?;
        if !self.grants.read {
            return Ok(Vec::new());
        }

        let store_filter = self.build_filter(filter, &options.fulltext)?;
        let mut find = FindOptions::new().skip(options.offset);
        if let Some(limit) = options.limit {
            if limit > 0 {
                find = find.limit(limit);
            }
        }

        let mut entries = Vec::new();
        for document in self.collection.find(&store_filter, find) {
            let values = codec::decode(&document);
            let id = values
                .get(&self.descriptor.id_field)
                .map(FieldValue::to_string_key)
                .unwrap_or_default();
            let mut entry = Entry::new(id, Arc::clone(&self.schema), values);
            if options.fetch_references {
                self.populate_references(&mut entry)?;
            }
            entries.push(entry);
        }

        if !options.order_by.is_empty() {
            order_entries(&mut entries, &options.order_by);
        }
        Ok(entries)
    }

    /// One column of a query's results, coerced to strings.
    ///
    /// Values lose their types here; an entry missing the column yields an
    /// empty string.
    pub fn get_projection(
        &self,
        filter: &FieldMap,
        fulltext: &BTreeSet<String>,
        column: &str,
    ) -> Result<Vec<String>> {
        let options = QueryOptions {
            fulltext: fulltext.clone(),
            ..QueryOptions::new()
        };
        let entries = self.query_with(filter, &options)?;
        Ok(entries
            .iter()
            .map(|entry| {
                entry
                    .get(column)
                    .map(FieldValue::to_string_key)
                    .unwrap_or_default()
            })
            .collect())
    }

    /// Locate the entry named by `username` and delegate password
    /// verification.
    ///
    /// A missing user, or one without a string password field, is `false`,
    /// never an error.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<bool> {
        self.ensure_open()?;
        let document = match self.collection.find_one(&self.id_filter(username)) {
            Some(doc) => doc,
            None => {
                debug!(directory = %self.descriptor.name, username, "unknown user");
                return Ok(false);
            }
        };
        let stored = match document.get_str(&self.descriptor.password_field) {
            Some(stored) => stored,
            None => return Ok(false),
        };
        Ok(self.verifier.verify(password, stored))
    }

    fn build_filter(&self, field_map: &FieldMap, fulltext: &BTreeSet<String>) -> Result<Filter> {
        let mut filter = Filter::new();
        for (field, value) in field_map {
            if value.is_null() {
                continue;
            }
            if fulltext.contains(field) {
                let pattern = SubstringPattern::compile(
                    &value.to_string_key(),
                    self.descriptor.substring_match_type,
                );
                filter = filter.pattern(field.clone(), pattern);
            } else if let Some(encoded) = codec::encode_value(field, value)? {
                filter = filter.eq(field.clone(), encoded);
            }
        }
        Ok(filter)
    }

    fn populate_references(&self, entry: &mut Entry) -> Result<()> {
        for (field, reference) in &self.references {
            let ids = reference.target_ids_for_source(entry.id())?;
            entry.set_fetched(field.clone(), FieldValue::StrList(ids));
        }
        Ok(())
    }
}

impl Drop for DirectorySession {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for DirectorySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectorySession")
            .field("directory", &self.descriptor.name)
            .field("schema", &self.schema.name())
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn order_entries(entries: &mut [Entry], order_by: &[OrderBy]) {
    entries.sort_by(|a, b| {
        for key in order_by {
            let av = a.get(&key.field);
            let bv = b.get(&key.field);
            let ordering = match (av, bv) {
                (Some(av), Some(bv)) => av.compare(bv),
                (Some(_), None) => std::cmp::Ordering::Greater,
                (None, Some(_)) => std::cmp::Ordering::Less,
                (None, None) => std::cmp::Ordering::Equal,
            };
            let ordering = if key.ascending {
                ordering
            } else {
                ordering.reverse()
            };
            if ordering != std::cmp::Ordering::Equal {
                return ordering;
            }
        }
        std::cmp::Ordering::Equal
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReferenceDescriptor;
    use crate::directory::{Directory, DocumentDirectory};
    use crate::schema::{FieldDescriptor, FieldType, SchemaDescriptor, SchemaRegistry};
    use rolodex_core::SubstringMatchType;
    use rolodex_store::{StoreClient, StoreConfig};

    fn user_registry() -> Arc<SchemaRegistry> {
        let registry = SchemaRegistry::new();
        registry.register(SchemaDescriptor::new(
            "user",
            vec![
                FieldDescriptor::new("username", FieldType::String),
                FieldDescriptor::new("password", FieldType::String),
                FieldDescriptor::new("name", FieldType::String),
                FieldDescriptor::new("age", FieldType::Integer),
                FieldDescriptor::new("groups", FieldType::StringList),
            ],
        ));
        Arc::new(registry)
    }

    fn directory_with(match_type: SubstringMatchType) -> DocumentDirectory {
        let client = Arc::new(StoreClient::open(StoreConfig::new("db")));
        let descriptor = crate::config::DirectoryDescriptor::new("users", "user")
            .id_field("username")
            .substring_match_type(match_type);
        DocumentDirectory::new(descriptor, user_registry(), client)
    }

    fn directory() -> DocumentDirectory {
        directory_with(SubstringMatchType::Subinitial)
    }

    fn user(username: &str, name: &str, age: i32) -> FieldMap {
        let mut map = FieldMap::new();
        map.insert("username".to_string(), FieldValue::Str(username.into()));
        map.insert("name".to_string(), FieldValue::Str(name.into()));
        map.insert("age".to_string(), FieldValue::Int(age));
        map
    }

    #[test]
    fn test_create_then_get_returns_exact_fields() {
        let dir = directory();
        let session = dir.open_session().unwrap();
        let map = user("alice", "Alice", 30);

        let created = session.create_entry(map.clone()).unwrap();
        assert_eq!(created.id(), "alice");
        assert_eq!(created.values(), &map);

        let fetched = session.get_entry("alice", false).unwrap().unwrap();
        assert_eq!(fetched.values(), &map);
    }

    #[test]
    fn test_get_missing_entry_is_none() {
        let dir = directory();
        let session = dir.open_session().unwrap();
        assert!(session.get_entry("ghost", false).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_create_preserves_first_entry() {
        let dir = directory();
        let session = dir.open_session().unwrap();
        session.create_entry(user("alice", "Alice", 30)).unwrap();

        let err = session.create_entry(user("alice", "Impostor", 99)).unwrap_err();
        assert!(matches!(err, DirectoryError::DuplicateId { ref id } if id == "alice"));

        let kept = session.get_entry("alice", false).unwrap().unwrap();
        assert_eq!(kept.get("name"), Some(&FieldValue::Str("Alice".into())));
    }

    #[test]
    fn test_create_without_identifier_fails() {
        let dir = directory();
        let session = dir.open_session().unwrap();
        let mut map = FieldMap::new();
        map.insert("name".to_string(), FieldValue::Str("No Id".into()));
        let err = session.create_entry(map).unwrap_err();
        assert!(matches!(err, DirectoryError::InvalidSchema { .. }));
    }

    #[test]
    fn test_create_undeclared_field_fails() {
        let dir = directory();
        let session = dir.open_session().unwrap();
        let mut map = user("alice", "Alice", 30);
        map.insert("shoe_size".to_string(), FieldValue::Int(42));
        let err = session.create_entry(map).unwrap_err();
        assert!(matches!(err, DirectoryError::InvalidSchema { .. }));
    }

    #[test]
    fn test_update_sends_modified_fields_only() {
        let dir = directory();
        let session = dir.open_session().unwrap();
        session.create_entry(user("alice", "Alice", 30)).unwrap();

        // A second writer touches `name` between our read and our write.
        let mut ours = session.get_entry("alice", false).unwrap().unwrap();
        let other = dir.open_session().unwrap();
        let mut theirs = other.get_entry("alice", false).unwrap().unwrap();
        theirs.set("name", FieldValue::Str("Alicia".into())).unwrap();
        other.update_entry(&mut theirs).unwrap();

        ours.set("age", FieldValue::Int(31)).unwrap();
        session.update_entry(&mut ours).unwrap();
        assert!(!ours.is_modified());

        // Only `age` was in our delta, so the concurrent rename survives.
        let stored = session.get_entry("alice", false).unwrap().unwrap();
        assert_eq!(stored.get("age"), Some(&FieldValue::Int(31)));
        assert_eq!(stored.get("name"), Some(&FieldValue::Str("Alicia".into())));
    }

    #[test]
    fn test_update_missing_entry_is_no_such_entry() {
        let dir = directory();
        let session = dir.open_session().unwrap();
        let schema = session.schema().clone();

        let mut values = FieldMap::new();
        values.insert("username".to_string(), FieldValue::Str("ghost".into()));
        let mut entry = crate::entry::Entry::new("ghost", schema, values);
        entry.set("age", FieldValue::Int(1)).unwrap();

        let err = session.update_entry(&mut entry).unwrap_err();
        assert!(matches!(err, DirectoryError::NoSuchEntry { ref id } if id == "ghost"));
        assert!(!session.has_entry("ghost").unwrap());
    }

    #[test]
    fn test_delete_entry_and_idempotence() {
        let dir = directory();
        let session = dir.open_session().unwrap();
        session.create_entry(user("alice", "Alice", 30)).unwrap();

        session.delete_entry("alice").unwrap();
        assert!(!session.has_entry("alice").unwrap());

        // Deleting again is not an error and changes nothing.
        session.delete_entry("alice").unwrap();
        assert!(session.get_entries().unwrap().is_empty());
    }

    struct VetoAlice;

    impl DeleteConstraint for VetoAlice {
        fn check(&self, id: &str) -> Result<()> {
            if id == "alice" {
                return Err(DirectoryError::PermissionDenied {
                    permission: "delete",
                });
            }
            Ok(())
        }
    }

    #[test]
    fn test_delete_constraint_runs_before_delete() {
        let client = Arc::new(StoreClient::open(StoreConfig::new("db")));
        let descriptor =
            crate::config::DirectoryDescriptor::new("users", "user").id_field("username");
        let dir = DocumentDirectory::new(descriptor, user_registry(), client)
            .with_delete_constraint(Arc::new(VetoAlice));
        let session = dir.open_session().unwrap();
        session.create_entry(user("alice", "Alice", 30)).unwrap();

        assert!(session.delete_entry("alice").is_err());
        assert!(session.has_entry("alice").unwrap());
    }

    #[test]
    fn test_query_exact_match_and_empty_result() {
        let dir = directory();
        let session = dir.open_session().unwrap();
        session.create_entry(user("alice", "Alice", 30)).unwrap();
        session.create_entry(user("bob", "Bob", 40)).unwrap();

        let mut filter = FieldMap::new();
        filter.insert("age".to_string(), FieldValue::Int(40));
        let hits = session.query(&filter).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id(), "bob");

        filter.insert("age".to_string(), FieldValue::Int(99));
        assert!(session.query(&filter).unwrap().is_empty());
    }

    #[test]
    fn test_query_null_filter_fields_are_omitted() {
        let dir = directory();
        let session = dir.open_session().unwrap();
        session.create_entry(user("alice", "Alice", 30)).unwrap();
        session.create_entry(user("bob", "Bob", 40)).unwrap();

        let mut filter = FieldMap::new();
        filter.insert("age".to_string(), FieldValue::Null);
        assert_eq!(session.query(&filter).unwrap().len(), 2);
    }

    fn region_entries(session: &DirectorySession, names: &[&str]) {
        for name in names {
            let mut map = FieldMap::new();
            map.insert("username".to_string(), FieldValue::Str(name.to_string()));
            map.insert("name".to_string(), FieldValue::Str(name.to_string()));
            session.create_entry(map).unwrap();
        }
    }

    fn fulltext_name_query(session: &DirectorySession, value: &str) -> Vec<String> {
        let mut filter = FieldMap::new();
        filter.insert("name".to_string(), FieldValue::Str(value.into()));
        let options = QueryOptions::new().fulltext_field("name");
        session
            .query_with(&filter, &options)
            .unwrap()
            .iter()
            .map(|e| e.id().to_string())
            .collect()
    }

    #[test]
    fn test_subinitial_matches_prefix_only() {
        let dir = directory_with(SubstringMatchType::Subinitial);
        let session = dir.open_session().unwrap();
        region_entries(&session, &["Europe", "Eastern Europe"]);
        assert_eq!(fulltext_name_query(&session, "europe"), ["Europe"]);
    }

    #[test]
    fn test_subany_matches_anywhere() {
        let dir = directory_with(SubstringMatchType::Subany);
        let session = dir.open_session().unwrap();
        region_entries(&session, &["Europe", "Eastern Europe"]);
        assert_eq!(
            fulltext_name_query(&session, "europe"),
            ["Europe", "Eastern Europe"]
        );
    }

    #[test]
    fn test_subfinal_matches_suffix_only() {
        let dir = directory_with(SubstringMatchType::Subfinal);
        let session = dir.open_session().unwrap();
        region_entries(&session, &["Europe", "Eastern Europe", "xEurope"]);
        assert_eq!(
            fulltext_name_query(&session, "europe"),
            ["Europe", "xEurope"]
        );
    }

    #[test]
    fn test_non_fulltext_field_stays_exact() {
        let dir = directory_with(SubstringMatchType::Subany);
        let session = dir.open_session().unwrap();
        region_entries(&session, &["Europe", "Eastern Europe"]);

        let mut filter = FieldMap::new();
        filter.insert("name".to_string(), FieldValue::Str("Europe".into()));
        let hits = session.query(&filter).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id(), "Europe");
    }

    #[test]
    fn test_pagination_returns_ranks_two_and_three() {
        let dir = directory();
        let session = dir.open_session().unwrap();
        for i in 1..=5 {
            session.create_entry(user(&format!("u{i}"), "Same", 7)).unwrap();
        }

        let mut filter = FieldMap::new();
        filter.insert("name".to_string(), FieldValue::Str("Same".into()));
        let options = QueryOptions::new().limit(2).offset(1);
        let page = session.query_with(&filter, &options).unwrap();
        let ids: Vec<_> = page.iter().map(|e| e.id()).collect();
        assert_eq!(ids, ["u2", "u3"]);
    }

    #[test]
    fn test_zero_limit_is_unbounded() {
        let dir = directory();
        let session = dir.open_session().unwrap();
        for i in 1..=3 {
            session.create_entry(user(&format!("u{i}"), "Same", 7)).unwrap();
        }
        let options = QueryOptions::new().limit(0);
        assert_eq!(session.query_with(&FieldMap::new(), &options).unwrap().len(), 3);
    }

    #[test]
    fn test_order_by_sorts_after_materializing() {
        let dir = directory();
        let session = dir.open_session().unwrap();
        session.create_entry(user("alice", "Alice", 40)).unwrap();
        session.create_entry(user("bob", "Bob", 30)).unwrap();
        session.create_entry(user("carol", "Carol", 50)).unwrap();

        let options = QueryOptions::new().order_by(OrderBy::asc("age"));
        let entries = session.query_with(&FieldMap::new(), &options).unwrap();
        let ids: Vec<_> = entries.iter().map(|e| e.id()).collect();
        assert_eq!(ids, ["bob", "alice", "carol"]);

        let options = QueryOptions::new().order_by(OrderBy::desc("age"));
        let entries = session.query_with(&FieldMap::new(), &options).unwrap();
        let ids: Vec<_> = entries.iter().map(|e| e.id()).collect();
        assert_eq!(ids, ["carol", "alice", "bob"]);
    }

    #[test]
    fn test_projection_coerces_values_to_strings() {
        let dir = directory();
        let session = dir.open_session().unwrap();
        session.create_entry(user("alice", "Alice", 30)).unwrap();
        session.create_entry(user("bob", "Bob", 40)).unwrap();

        let ages = session
            .get_projection(&FieldMap::new(), &BTreeSet::new(), "age")
            .unwrap();
        assert_eq!(ages, ["30", "40"]);

        // A column absent from an entry projects as the empty string.
        let missing = session
            .get_projection(&FieldMap::new(), &BTreeSet::new(), "groups")
            .unwrap();
        assert_eq!(missing, ["", ""]);
    }

    #[test]
    fn test_authenticate() {
        let dir = directory();
        let session = dir.open_session().unwrap();
        let mut map = user("alice", "Alice", 30);
        map.insert("password".to_string(), FieldValue::Str("s3cret".into()));
        session.create_entry(map).unwrap();

        assert!(session.authenticate("alice", "s3cret").unwrap());
        assert!(!session.authenticate("alice", "wrong").unwrap());
        // Missing users are a rejection, not an error.
        assert!(!session.authenticate("ghost", "s3cret").unwrap());
        // So are entries without a stored password.
        session.create_entry(user("bob", "Bob", 40)).unwrap();
        assert!(!session.authenticate("bob", "anything").unwrap());
    }

    #[test]
    fn test_closed_session_rejects_everything() {
        let dir = directory();
        let session = dir.open_session().unwrap();
        session.close();
        session.close(); // idempotent

        assert!(matches!(
            session.get_entry("x", false).unwrap_err(),
            DirectoryError::SessionClosed
        ));
        assert!(matches!(
            session.create_entry(user("x", "X", 1)).unwrap_err(),
            DirectoryError::SessionClosed
        ));
        assert!(matches!(
            session.delete_entry("x").unwrap_err(),
            DirectoryError::SessionClosed
        ));
        assert!(matches!(
            session.query(&FieldMap::new()).unwrap_err(),
            DirectoryError::SessionClosed
        ));
        assert!(matches!(
            session.has_entry("x").unwrap_err(),
            DirectoryError::SessionClosed
        ));
        assert!(matches!(
            session.authenticate("x", "y").unwrap_err(),
            DirectoryError::SessionClosed
        ));
    }

    #[test]
    fn test_read_grant_gates_reads_as_empty() {
        let dir = directory();
        let writer = dir.open_session().unwrap();
        writer.create_entry(user("alice", "Alice", 30)).unwrap();

        let session = dir
            .open_session_with_grants(SessionGrants {
                read: false,
                write: true,
            })
            .unwrap();
        // Reads come back empty rather than erroring.
        assert!(session.get_entry("alice", false).unwrap().is_none());
        assert!(session.query(&FieldMap::new()).unwrap().is_empty());
        assert!(session.get_entries().unwrap().is_empty());
    }

    #[test]
    fn test_fetch_references_populates_field() {
        let client = Arc::new(StoreClient::open(StoreConfig::new("db")));
        let descriptor =
            crate::config::DirectoryDescriptor::new("users", "user").id_field("username");
        let dir = DocumentDirectory::new(descriptor, user_registry(), Arc::clone(&client))
            .with_reference(ReferenceDescriptor::new(
                "groups",
                "user2group",
                "userId",
                "groupId",
            ));

        let links = dir.reference("groups").unwrap();
        links
            .add_links("alice", &["admins".to_string(), "users".to_string()])
            .unwrap();

        let session = dir.open_session().unwrap();
        session.create_entry(user("alice", "Alice", 30)).unwrap();

        let plain = session.get_entry("alice", false).unwrap().unwrap();
        assert!(plain.get("groups").is_none());

        let fetched = session.get_entry("alice", true).unwrap().unwrap();
        match fetched.get("groups").unwrap() {
            FieldValue::StrList(groups) => {
                let mut sorted = groups.clone();
                sorted.sort();
                assert_eq!(sorted, ["admins", "users"]);
            }
            other => panic!("expected StrList, got {other:?}"),
        }
        // Fetched reference fields are not a pending write.
        assert!(!fetched.is_modified());
    }

    #[test]
    fn test_unsupported_filter_value_fails() {
        let dir = directory();
        let session = dir.open_session().unwrap();
        let mut filter = FieldMap::new();
        filter.insert("age".to_string(), FieldValue::Float(1.5));
        let err = session.query(&filter).unwrap_err();
        assert!(matches!(err, DirectoryError::UnsupportedValueType { .. }));
    }
}
