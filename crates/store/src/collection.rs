//! A single document collection.
//!
//! Rows live in insertion order behind one `parking_lot::RwLock`, which is
//! what makes every single-document operation here atomic and linearizable:
//! a write takes the lock, observes, mutates, releases. Multi-call flows
//! built on top (read-then-write reconciliation, query + client-side sort)
//! get no such guarantee.
//!
//! Result shapes mirror what a remote document store reports: writes carry
//! an acknowledgement flag, updates a matched count, deletes a deleted
//! count. The in-process engine always acknowledges; callers are written
//! against the flag, not the engine.

use parking_lot::RwLock;
use rolodex_core::{Document, StoreError, StoreValue};
use uuid::Uuid;

use crate::filter::Filter;

/// Result of an insert.
#[derive(Debug, Clone, Copy)]
pub struct InsertResult {
    /// Whether the store confirmed the write.
    pub acknowledged: bool,
}

/// Result of an update.
#[derive(Debug, Clone, Copy)]
pub struct UpdateResult {
    /// Whether the store confirmed the write.
    pub acknowledged: bool,
    /// Number of documents the filter matched.
    pub matched_count: u64,
}

/// Result of a delete.
#[derive(Debug, Clone, Copy)]
pub struct DeleteResult {
    /// Whether the store confirmed the write.
    pub acknowledged: bool,
    /// Number of documents removed.
    pub deleted_count: u64,
}

/// Pagination window for `find`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FindOptions {
    /// Matching documents to skip.
    pub skip: usize,
    /// Cap on returned documents; `None` is unbounded.
    pub limit: Option<usize>,
}

impl FindOptions {
    /// Unbounded, from the first match.
    pub fn new() -> Self {
        FindOptions::default()
    }

    /// Skip the first `skip` matches.
    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    /// Return at most `limit` documents.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Mutation applied by [`Collection::find_one_and_update`].
///
/// Combines field increments with fields set only when the update inserts
/// (the upsert path), the two pieces an atomic counter needs.
#[derive(Debug, Clone, Default)]
pub struct Update {
    increments: Vec<(String, i64)>,
    set_on_insert: Document,
}

impl Update {
    /// An empty update.
    pub fn new() -> Self {
        Update::default()
    }

    /// Increment `field` by `by`; a missing field starts from zero.
    pub fn inc(mut self, field: impl Into<String>, by: i64) -> Self {
        self.increments.push((field.into(), by));
        self
    }

    /// Set `field` to `value` only when the update inserts a new document.
    pub fn set_on_insert(mut self, field: impl Into<String>, value: StoreValue) -> Self {
        self.set_on_insert.insert(field, value);
        self
    }
}

/// An insertion-ordered set of documents with unique `_id`s.
#[derive(Debug)]
pub struct Collection {
    name: String,
    rows: RwLock<Vec<Document>>,
}

impl Collection {
    /// Create an empty collection.
    pub fn new(name: impl Into<String>) -> Self {
        Collection {
            name: name.into(),
            rows: RwLock::new(Vec::new()),
        }
    }

    /// The collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert one document.
    ///
    /// A document without `_id` is assigned a fresh object id. Inserting a
    /// duplicate `_id` fails with [`StoreError::DuplicateKey`].
    pub fn insert_one(&self, mut document: Document) -> Result<InsertResult, StoreError> {
        let mut rows = self.rows.write();
        let id = match document.id() {
            Some(id) => id.clone(),
            None => {
                let id = StoreValue::ObjectId(Uuid::new_v4());
                document.set_id(id.clone());
                id
            }
        };
        if rows.iter().any(|row| row.id() == Some(&id)) {
            return Err(StoreError::DuplicateKey {
                key: id.to_display_string(),
                collection: self.name.clone(),
            });
        }
        rows.push(document);
        Ok(InsertResult { acknowledged: true })
    }

    /// Find matching documents in insertion order, honoring skip/limit.
    pub fn find(&self, filter: &Filter, options: FindOptions) -> Vec<Document> {
        let rows = self.rows.read();
        let matches = rows.iter().filter(|row| filter.matches(row)).skip(options.skip);
        match options.limit {
            Some(limit) => matches.take(limit).cloned().collect(),
            None => matches.cloned().collect(),
        }
    }

    /// First matching document, if any.
    pub fn find_one(&self, filter: &Filter) -> Option<Document> {
        self.find(filter, FindOptions::new().limit(1)).into_iter().next()
    }

    /// Number of matching documents.
    pub fn count(&self, filter: &Filter) -> u64 {
        let rows = self.rows.read();
        rows.iter().filter(|row| filter.matches(row)).count() as u64
    }

    /// Apply `set` to the first matching document.
    pub fn update_one(&self, filter: &Filter, set: &Document) -> UpdateResult {
        let mut rows = self.rows.write();
        match rows.iter_mut().find(|row| filter.matches(row)) {
            Some(row) => {
                row.apply_set(set);
                UpdateResult {
                    acknowledged: true,
                    matched_count: 1,
                }
            }
            None => UpdateResult {
                acknowledged: true,
                matched_count: 0,
            },
        }
    }

    /// Remove the first matching document.
    pub fn delete_one(&self, filter: &Filter) -> DeleteResult {
        let mut rows = self.rows.write();
        match rows.iter().position(|row| filter.matches(row)) {
            Some(index) => {
                rows.remove(index);
                DeleteResult {
                    acknowledged: true,
                    deleted_count: 1,
                }
            }
            None => DeleteResult {
                acknowledged: true,
                deleted_count: 0,
            },
        }
    }

    /// Remove every matching document.
    pub fn delete_many(&self, filter: &Filter) -> DeleteResult {
        let mut rows = self.rows.write();
        let before = rows.len();
        rows.retain(|row| !filter.matches(row));
        DeleteResult {
            acknowledged: true,
            deleted_count: (before - rows.len()) as u64,
        }
    }

    /// Atomically find, mutate and return the pre-update document.
    ///
    /// With `upsert`, a missing match inserts a fresh document built from
    /// the update's `set_on_insert` fields plus increments applied from
    /// zero, and `None` is returned; the caller reads `None` as "the
    /// record was just created". The whole step holds the write lock, so
    /// exactly one concurrent caller observes any given pre-image.
    pub fn find_one_and_update(
        &self,
        filter: &Filter,
        update: &Update,
        upsert: bool,
    ) -> Result<Option<Document>, StoreError> {
        let mut rows = self.rows.write();
        if let Some(row) = rows.iter_mut().find(|row| filter.matches(row)) {
            let previous = row.clone();
            for (field, by) in &update.increments {
                let current = row.get(field).and_then(StoreValue::as_long).unwrap_or(0);
                row.insert(field.clone(), StoreValue::Long(current + by));
            }
            return Ok(Some(previous));
        }
        if upsert {
            let mut fresh = update.set_on_insert.clone();
            for (field, by) in &update.increments {
                fresh.insert(field.clone(), StoreValue::Long(*by));
            }
            let id = match fresh.id() {
                Some(id) => id.clone(),
                None => {
                    let id = StoreValue::ObjectId(Uuid::new_v4());
                    fresh.set_id(id.clone());
                    id
                }
            };
            if rows.iter().any(|row| row.id() == Some(&id)) {
                return Err(StoreError::DuplicateKey {
                    key: id.to_display_string(),
                    collection: self.name.clone(),
                });
            }
            rows.push(fresh);
        }
        Ok(None)
    }

    /// Number of documents held.
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    /// Whether the collection holds no documents.
    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}
