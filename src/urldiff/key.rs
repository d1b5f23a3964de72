// src/urldiff/key.rs
// =============================================================================
// Field keys and field values: the vocabulary shared by the diff engine,
// the composer and the pagination recognizer.
//
// A URL is compared field by field:
// - a path segment is identified by its position (0, 1, 2, ...)
// - a query parameter is identified by its name ("page", "q", ...)
//
// Ordering matters when a URL is rebuilt: all path indices sort before all
// query names, so iterating a BTreeMap<FieldKey, _> yields the path segments
// first, in order, followed by the query parameters.
// =============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one comparable part of a URL
///
/// The derived `Ord` compares the variant first (in declaration order) and the
/// payload second, which gives exactly "path indices by number, then query
/// names lexicographically".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldKey {
    /// Positional index into the path segments (0-based)
    PathIndex(usize),
    /// Name of a query-string parameter
    QueryName(String),
}

impl FieldKey {
    /// Shorthand for `FieldKey::QueryName(name.into())`
    pub fn query(name: impl Into<String>) -> Self {
        FieldKey::QueryName(name.into())
    }

    /// Builds a value of the right shape for this key
    ///
    /// Path segments hold exactly one string, query parameters hold a list.
    /// Used to build composition overrides such as "set the page field to 5".
    pub fn value_of(&self, text: impl Into<String>) -> FieldValue {
        match self {
            FieldKey::PathIndex(_) => FieldValue::Segment(text.into()),
            FieldKey::QueryName(_) => FieldValue::Params(vec![text.into()]),
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKey::PathIndex(index) => write!(f, "#{}", index),
            FieldKey::QueryName(name) => write!(f, "{}", name),
        }
    }
}

/// The value stored under a field key
///
/// Equality is sequence equality: `["a", "b"] != ["b", "a"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// A single path segment
    Segment(String),
    /// Every value a query parameter carries, in query-string order
    Params(Vec<String>),
}

impl FieldValue {
    /// All values as a slice (a segment is a one-element slice)
    pub fn values(&self) -> &[String] {
        match self {
            FieldValue::Segment(segment) => std::slice::from_ref(segment),
            FieldValue::Params(values) => values,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(segment: &str) -> Self {
        FieldValue::Segment(segment.to_string())
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(values: Vec<String>) -> Self {
        FieldValue::Params(values)
    }
}
