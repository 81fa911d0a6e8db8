//! Core types for the rolodex directory stack.
//!
//! This crate is the leaf of the workspace: field values and field maps
//! (the caller-facing record shape), store documents (the persisted shape),
//! the serialization codec between them, the substring-match policy, and the
//! shared error taxonomy. It knows nothing about collections, sessions or
//! the store engine.

#![warn(missing_docs)]

pub mod codec;
pub mod document;
pub mod error;
pub mod matching;
pub mod value;

pub use document::{Document, StoreValue, ID_FIELD};
pub use error::{DirectoryError, Result, StoreError};
pub use matching::SubstringMatchType;
pub use value::{FieldMap, FieldValue};
