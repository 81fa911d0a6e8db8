//! Filter documents sent to collections.
//!
//! A filter is a flat field → matcher map combined with AND semantics: a
//! document matches when every named field is present and satisfies its
//! matcher. The empty filter matches every document. Matchers are either
//! exact values or case-insensitive substring patterns compiled from a
//! literal filter value and a [`SubstringMatchType`].

use regex::{Regex, RegexBuilder};
use rolodex_core::{Document, StoreValue, SubstringMatchType};
use std::collections::BTreeMap;

/// Case-insensitive substring pattern over string-valued fields.
///
/// The filter value is taken literally (regex metacharacters escaped), then
/// anchored according to the match type. Non-string fields never match a
/// pattern.
#[derive(Debug, Clone)]
pub struct SubstringPattern {
    regex: Regex,
}

impl SubstringPattern {
    /// Compile `value` under the given match policy.
    pub fn compile(value: &str, match_type: SubstringMatchType) -> Self {
        let literal = regex::escape(value);
        let pattern = match match_type {
            SubstringMatchType::Subany => literal,
            SubstringMatchType::Subinitial => format!("^{literal}"),
            SubstringMatchType::Subfinal => format!("{literal}$"),
        };
        // Escaped literals always compile.
        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
            .expect("escaped literal pattern");
        SubstringPattern { regex }
    }

    /// Whether the pattern matches the given text.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// One field's match condition.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Exact store-value equality.
    Eq(StoreValue),
    /// Case-insensitive substring pattern (string fields only).
    Pattern(SubstringPattern),
}

impl Matcher {
    fn matches(&self, value: &StoreValue) -> bool {
        match self {
            Matcher::Eq(expected) => value == expected,
            Matcher::Pattern(pattern) => {
                value.as_str().is_some_and(|text| pattern.is_match(text))
            }
        }
    }
}

/// A flat conjunction of per-field match conditions.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    fields: BTreeMap<String, Matcher>,
}

impl Filter {
    /// The empty filter; matches every document.
    pub fn new() -> Self {
        Filter::default()
    }

    /// Add an exact-match condition.
    pub fn eq(mut self, field: impl Into<String>, value: StoreValue) -> Self {
        self.fields.insert(field.into(), Matcher::Eq(value));
        self
    }

    /// Add a substring-pattern condition.
    pub fn pattern(mut self, field: impl Into<String>, pattern: SubstringPattern) -> Self {
        self.fields.insert(field.into(), Matcher::Pattern(pattern));
        self
    }

    /// Whether no conditions are present.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether `document` satisfies every condition.
    pub fn matches(&self, document: &Document) -> bool {
        self.fields.iter().all(|(field, matcher)| {
            document
                .get(field)
                .map(|value| matcher.matches(value))
                .unwrap_or(false)
        })
    }
}
