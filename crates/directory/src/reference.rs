//! Many-to-many links between two directories through a join collection.
//!
//! Each link is one row `{source_field: id, target_field: id}`; the rows
//! belong to the join collection, not to either endpoint directory.
//!
//! Reconciliation (`set_target_ids_for_source` and its inverse) is a read
//! of the existing link set followed by independent deletes and inserts.
//! It runs in no transaction: a concurrent mutator of the same anchor can
//! interleave between the read and the writes, and the last writers win
//! row by row. Callers needing stronger guarantees must serialize
//! externally.

use std::collections::BTreeSet;
use std::sync::Arc;

use rolodex_core::{Document, Result, StoreValue};
use rolodex_store::{Collection, Filter, StoreClient};
use tracing::debug;

use crate::config::ReferenceDescriptor;

/// Link store for one configured reference.
#[derive(Debug, Clone)]
pub struct Reference {
    descriptor: ReferenceDescriptor,
    collection: Arc<Collection>,
}

impl Reference {
    /// Bind the descriptor to its join collection on `client`.
    pub fn new(descriptor: ReferenceDescriptor, client: &StoreClient) -> Self {
        let collection = client.collection(&descriptor.collection);
        Reference {
            descriptor,
            collection,
        }
    }

    /// The reference configuration.
    pub fn descriptor(&self) -> &ReferenceDescriptor {
        &self.descriptor
    }

    /// Link `source_id` to every id in `target_ids`.
    ///
    /// Existing pairs are left alone, so repeated calls are idempotent.
    pub fn add_links(&self, source_id: &str, target_ids: &[String]) -> Result<()> {
        for target_id in target_ids {
            self.add_link(source_id, target_id)?;
        }
        Ok(())
    }

    /// Link every id in `source_ids` to `target_id`.
    pub fn add_links_for_target(&self, source_ids: &[String], target_id: &str) -> Result<()> {
        for source_id in source_ids {
            self.add_link(source_id, target_id)?;
        }
        Ok(())
    }

    fn add_link(&self, source_id: &str, target_id: &str) -> Result<()> {
        let filter = Filter::new()
            .eq(
                self.descriptor.source_field.clone(),
                StoreValue::Str(source_id.to_string()),
            )
            .eq(
                self.descriptor.target_field.clone(),
                StoreValue::Str(target_id.to_string()),
            );
        if self.collection.count(&filter) > 0 {
            return Ok(());
        }
        let mut row = Document::new();
        row.insert(
            self.descriptor.source_field.clone(),
            StoreValue::Str(source_id.to_string()),
        );
        row.insert(
            self.descriptor.target_field.clone(),
            StoreValue::Str(target_id.to_string()),
        );
        self.collection.insert_one(row)?;
        Ok(())
    }

    /// Remove every link whose source is `source_id`.
    pub fn remove_links_for_source(&self, source_id: &str) -> Result<()> {
        self.remove_links_for(&self.descriptor.source_field, source_id)
    }

    /// Remove every link whose target is `target_id`.
    pub fn remove_links_for_target(&self, target_id: &str) -> Result<()> {
        self.remove_links_for(&self.descriptor.target_field, target_id)
    }

    fn remove_links_for(&self, field: &str, value: &str) -> Result<()> {
        let filter = Filter::new().eq(field.to_string(), StoreValue::Str(value.to_string()));
        let result = self.collection.delete_many(&filter);
        if !result.acknowledged {
            return Err(rolodex_core::DirectoryError::WriteNotAcknowledged {
                operation: "reference link delete",
            });
        }
        Ok(())
    }

    /// Target ids linked from `source_id`.
    pub fn target_ids_for_source(&self, source_id: &str) -> Result<Vec<String>> {
        Ok(self.ids_for(
            &self.descriptor.source_field,
            source_id,
            &self.descriptor.target_field,
        ))
    }

    /// Source ids linked to `target_id`.
    pub fn source_ids_for_target(&self, target_id: &str) -> Result<Vec<String>> {
        Ok(self.ids_for(
            &self.descriptor.target_field,
            target_id,
            &self.descriptor.source_field,
        ))
    }

    fn ids_for(&self, query_field: &str, value: &str, result_field: &str) -> Vec<String> {
        let filter =
            Filter::new().eq(query_field.to_string(), StoreValue::Str(value.to_string()));
        self.collection
            .find(&filter, rolodex_store::FindOptions::new())
            .iter()
            .filter_map(|row| row.get(result_field).map(StoreValue::to_display_string))
            .collect()
    }

    /// Converge the target set of `source_id` to exactly `target_ids`.
    pub fn set_target_ids_for_source(&self, source_id: &str, target_ids: &[String]) -> Result<()> {
        self.set_ids(
            &self.descriptor.source_field,
            source_id,
            &self.descriptor.target_field,
            target_ids,
        )
    }

    /// Converge the source set of `target_id` to exactly `source_ids`.
    pub fn set_source_ids_for_target(&self, target_id: &str, source_ids: &[String]) -> Result<()> {
        self.set_ids(
            &self.descriptor.target_field,
            target_id,
            &self.descriptor.source_field,
            source_ids,
        )
    }

    /// Reconcile the stored link set for one anchor to `desired`.
    ///
    /// Duplicate desired ids collapse to one link. Deletions go first and
    /// are keyed by the counterpart field value; insertions reuse the
    /// idempotent add path, so replaying the same desired set is a no-op.
    fn set_ids(
        &self,
        anchor_field: &str,
        anchor_id: &str,
        counterpart_field: &str,
        desired: &[String],
    ) -> Result<()> {
        let mut to_add: BTreeSet<String> = desired.iter().cloned().collect();
        let mut to_delete: Vec<String> = Vec::new();

        let existing = self.ids_for(anchor_field, anchor_id, counterpart_field);
        for id in existing {
            if !to_add.remove(&id) {
                to_delete.push(id);
            }
        }

        debug!(
            collection = %self.descriptor.collection,
            anchor = anchor_id,
            adding = to_add.len(),
            deleting = to_delete.len(),
            "reconciling links"
        );

        for id in &to_delete {
            self.remove_links_for(counterpart_field, id)?;
        }

        let anchor_is_source = anchor_field == self.descriptor.source_field;
        for id in &to_add {
            if anchor_is_source {
                self.add_link(anchor_id, id)?;
            } else {
                self.add_link(id, anchor_id)?;
            }
        }
        Ok(())
    }
}
