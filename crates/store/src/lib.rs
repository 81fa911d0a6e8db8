//! In-process document store backing the rolodex directories.
//!
//! This crate supplies exactly the store primitives the directory layer
//! consumes: single-document insert with uniqueness feedback, acknowledged
//! deletes, partial updates with matched-count feedback, filtered find with
//! skip/limit, count probes, and atomic find-and-update-with-upsert
//! returning the pre-update document. Single-document operations are atomic
//! and linearizable; anything stitched together from several calls is not.
//!
//! Layout is one [`Collection`] per directory (named after it), one join
//! collection per reference, and one shared collection for sequence
//! records.

#![warn(missing_docs)]

pub mod client;
pub mod collection;
pub mod filter;
pub mod sequence;

pub use client::{connect, global, shutdown, StoreClient, StoreConfig};
pub use collection::{
    Collection, DeleteResult, FindOptions, InsertResult, Update, UpdateResult,
};
pub use filter::{Filter, Matcher, SubstringPattern};
pub use sequence::{Sequencer, DEFAULT_SEQUENCE_COLLECTION};
