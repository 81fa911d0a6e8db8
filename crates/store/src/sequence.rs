//! Per-key monotonically increasing integer allocation.
//!
//! One document per key in a dedicated collection, `{_id: key, sequence: n}`.
//! Allocation is a single atomic find-and-update with upsert: the store
//! increments and hands back the pre-update document, so two concurrent
//! callers for one key always observe distinct pre-images and therefore
//! receive distinct, consecutive values. No locking is added here.

use std::sync::Arc;

use rolodex_core::{StoreError, StoreValue, ID_FIELD};
use tracing::debug;

use crate::client::StoreClient;
use crate::collection::{Collection, Update};
use crate::filter::Filter;

/// Default name of the sequence collection.
pub const DEFAULT_SEQUENCE_COLLECTION: &str = "sequence";

/// Field holding the current counter value.
const SEQUENCE_VALUE_FIELD: &str = "sequence";

/// Strictly increasing per-key integer allocator.
#[derive(Debug, Clone)]
pub struct Sequencer {
    collection: Arc<Collection>,
}

impl Sequencer {
    /// Allocator over the client's default sequence collection.
    pub fn new(client: &StoreClient) -> Self {
        Sequencer::with_collection(client.collection(DEFAULT_SEQUENCE_COLLECTION))
    }

    /// Allocator over an explicit collection.
    pub fn with_collection(collection: Arc<Collection>) -> Self {
        Sequencer { collection }
    }

    /// Next value for `key`.
    ///
    /// The first allocation for a key creates its record and returns 1;
    /// afterwards the previous value plus one. Values for one key are
    /// strictly increasing across all callers; which caller gets which
    /// value under contention is unspecified.
    pub fn next(&self, key: &str) -> Result<i64, StoreError> {
        let filter = Filter::new().eq(ID_FIELD, StoreValue::Str(key.to_string()));
        let update = Update::new()
            .inc(SEQUENCE_VALUE_FIELD, 1)
            .set_on_insert(ID_FIELD, StoreValue::Str(key.to_string()));
        let previous = self.collection.find_one_and_update(&filter, &update, true)?;
        let value = match previous {
            // No pre-image: the record was created by this call.
            None => 1,
            // The pre-image predates our increment; add it back.
            Some(doc) => {
                doc.get(SEQUENCE_VALUE_FIELD)
                    .and_then(StoreValue::as_long)
                    .unwrap_or(0)
                    + 1
            }
        };
        debug!(key, value, "sequence allocated");
        Ok(value)
    }
}
