//! Rolodex: schema-described, identifier-keyed record directories backed by
//! a document store.
//!
//! This facade re-exports the public surface of the workspace crates with a
//! clean single import path. Typical use: connect the store, register
//! schemas, bind a [`DocumentDirectory`], then open sessions for CRUD and
//! queries. References and the sequence allocator sit alongside.

#![warn(missing_docs)]

pub use rolodex_core::{
    codec, DirectoryError, Document, FieldMap, FieldValue, Result, StoreError, StoreValue,
    SubstringMatchType, ID_FIELD,
};
pub use rolodex_directory::{
    DeleteConstraint, Directory, DirectoryDescriptor, DirectorySession, DocumentDirectory,
    Entry, FieldDescriptor, FieldType, OrderBy, PasswordVerifier, PlainTextVerifier,
    QueryOptions, Reference, ReferenceDescriptor, SchemaDescriptor, SchemaRegistry,
    SessionGrants,
};
pub use rolodex_store::{
    connect, global, shutdown, Collection, Filter, FindOptions, Sequencer, StoreClient,
    StoreConfig, SubstringPattern, DEFAULT_SEQUENCE_COLLECTION,
};
