//! Error taxonomy shared across the workspace.
//!
//! Directory operations surface a typed [`DirectoryError`]; failures coming
//! out of the backing document store are wrapped in
//! [`DirectoryError::Store`] and re-raised, never retried here. Retry policy
//! belongs to the caller.

use thiserror::Error;

/// Result alias for directory operations.
pub type Result<T> = std::result::Result<T, DirectoryError>;

/// Errors raised by the document store primitives.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// An insert collided with an existing `_id`.
    #[error("duplicate key `{key}` in collection `{collection}`")]
    DuplicateKey {
        /// String form of the colliding `_id`.
        key: String,
        /// Collection the insert targeted.
        collection: String,
    },

    /// The process-wide client was used before `connect` or after `shutdown`.
    #[error("document store is not connected; call connect() first")]
    NotConnected,
}

/// Errors raised by directory sessions, references and the codec.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// `create_entry` was given an identifier that already exists.
    #[error("entry with id `{id}` already exists")]
    DuplicateId {
        /// The colliding identifier.
        id: String,
    },

    /// An update matched zero documents: the entry vanished concurrently or
    /// never existed.
    #[error("no entry found with id `{id}`")]
    NoSuchEntry {
        /// The identifier the update was keyed on.
        id: String,
    },

    /// The store declined to confirm a write.
    #[error("{operation} was not acknowledged by the store")]
    WriteNotAcknowledged {
        /// The operation that went unacknowledged.
        operation: &'static str,
    },

    /// The codec cannot represent a value in the store.
    #[error("field `{field}` holds an unsupported value type {kind}")]
    UnsupportedValueType {
        /// Field the value was mapped under.
        field: String,
        /// Type name of the offending value.
        kind: &'static str,
    },

    /// Operation on a session after `close`.
    #[error("session is closed")]
    SessionClosed,

    /// A write was attempted without the required grant.
    #[error("permission denied: {permission} not granted")]
    PermissionDenied {
        /// The missing grant.
        permission: &'static str,
    },

    /// A requested schema is not registered, or a field map names a field
    /// the schema does not declare.
    #[error("invalid schema: {reason}")]
    InvalidSchema {
        /// What made the schema unusable.
        reason: String,
    },

    /// A store-driver failure, wrapped and re-raised.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
