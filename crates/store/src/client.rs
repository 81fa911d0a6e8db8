//! Store client and process-wide connection state.
//!
//! A [`StoreClient`] owns the named collections of one logical database.
//! Collections are created on first use and shared via `Arc`, so every
//! session opened against the same directory name observes the same rows.
//!
//! The process-wide slot follows an explicit lifecycle: [`connect`] once at
//! startup, [`global`] everywhere a handle is needed, [`shutdown`] at
//! teardown. Using [`global`] outside that window is
//! [`StoreError::NotConnected`], never a silently spawned client.

use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rolodex_core::StoreError;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::collection::Collection;

/// Connection configuration for the document store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Logical database name.
    pub database: String,
}

impl StoreConfig {
    /// Configuration for the named database.
    pub fn new(database: impl Into<String>) -> Self {
        StoreConfig {
            database: database.into(),
        }
    }
}

/// Handle to one logical database and its named collections.
#[derive(Debug)]
pub struct StoreClient {
    config: StoreConfig,
    collections: DashMap<String, Arc<Collection>>,
}

impl StoreClient {
    /// Open a standalone client (tests, embedded use).
    pub fn open(config: StoreConfig) -> Self {
        StoreClient {
            config,
            collections: DashMap::new(),
        }
    }

    /// The database name this client serves.
    pub fn database(&self) -> &str {
        &self.config.database
    }

    /// The named collection, created empty on first use.
    pub fn collection(&self, name: &str) -> Arc<Collection> {
        self.collections
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Collection::new(name)))
            .clone()
    }

    /// Whether the named collection has been created.
    pub fn has_collection(&self, name: &str) -> bool {
        self.collections.contains_key(name)
    }

    /// Drop the named collection and all its documents.
    pub fn drop_collection(&self, name: &str) {
        self.collections.remove(name);
    }

    /// Names of all created collections.
    pub fn collection_names(&self) -> Vec<String> {
        self.collections.iter().map(|e| e.key().clone()).collect()
    }
}

static GLOBAL: Lazy<RwLock<Option<Arc<StoreClient>>>> = Lazy::new(|| RwLock::new(None));

/// Initialize the process-wide client.
///
/// Reconnecting replaces the previous client; handles already cloned out
/// keep their old collections alive until dropped.
pub fn connect(config: StoreConfig) -> Arc<StoreClient> {
    let client = Arc::new(StoreClient::open(config));
    info!(database = client.database(), "document store connected");
    *GLOBAL.write() = Some(Arc::clone(&client));
    client
}

/// The process-wide client.
pub fn global() -> Result<Arc<StoreClient>, StoreError> {
    GLOBAL.read().clone().ok_or(StoreError::NotConnected)
}

/// Tear down the process-wide client.
pub fn shutdown() {
    if GLOBAL.write().take().is_some() {
        info!("document store shut down");
    }
}
