// src/urldiff/mod.rs
// =============================================================================
// URL structural model, structural diff engine and URL composition.
//
// Submodules:
// - key: FieldKey (path index or query name) and FieldValue
// - parts: splits a URL into scheme/authority/segments/query/fragment
// - diff: four-bucket comparison of two URLs
// - compose: rebuilds a URL from a diff, with overrides
// =============================================================================

mod compose;
mod diff;
mod key;
mod parts;

pub use compose::{compose_url, self_diff, UrlDiff};
pub use diff::{build_diff, diff_mapping, diff_parts, diff_path, diff_query, Bucket, DiffPartition, UrlPartition};
pub use key::{FieldKey, FieldValue};
pub use parts::{encode_query, parse_query, raw_pairs, split_path, QueryMap, RawPair, UrlParts, PATH_SEPARATOR};
