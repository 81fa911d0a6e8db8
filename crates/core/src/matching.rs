//! Substring match policy for fulltext query fields.

use serde::{Deserialize, Serialize};

/// How a fulltext filter value is compiled into a pattern.
///
/// Configured per directory; applies to every field named in a query's
/// fulltext set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubstringMatchType {
    /// Value may appear anywhere.
    Subany,
    /// Value must be a prefix.
    #[default]
    Subinitial,
    /// Value must be a suffix.
    Subfinal,
}
