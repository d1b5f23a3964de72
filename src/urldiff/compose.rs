// src/urldiff/compose.rs
// =============================================================================
// Rebuilds a URL from a diff, optionally overriding fields.
//
// The basis URL is the "current" side of the diff, so its fields live in the
// equal, not_equal and minus buckets. The plus bucket only describes the
// other URL and is never used here.
//
// Typical use: having recognized that query parameter "page" is the page
// number, compose the URL of page 5 with the override { page: ["5"] }.
// =============================================================================

use std::collections::BTreeMap;

use super::diff::{build_diff, diff_parts, Bucket, UrlPartition};
use super::key::{FieldKey, FieldValue};
use super::parts::UrlParts;
use crate::error::{PagerError, Result};

/// A URL diffed against another one, ready to be recomposed
///
/// The first URL passed to `new` is the basis: `compose` and `unparse`
/// rebuild it, and `get` reads its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct UrlDiff {
    basis: UrlParts,
    partition: UrlPartition,
}

impl UrlDiff {
    pub fn new(current: &str, other: &str) -> Self {
        let basis = UrlParts::parse(current);
        let partition = diff_parts(&basis, &UrlParts::parse(other));
        UrlDiff { basis, partition }
    }

    pub fn basis(&self) -> &UrlParts {
        &self.basis
    }

    pub fn partition(&self) -> &UrlPartition {
        &self.partition
    }

    /// The non-empty change buckets (plus, minus, not_equal)
    pub fn differences(&self) -> Vec<(Bucket, &BTreeMap<FieldKey, FieldValue>)> {
        Bucket::DIFFERENCES
            .into_iter()
            .map(|bucket| (bucket, self.partition.bucket(bucket)))
            .filter(|(_, fields)| !fields.is_empty())
            .collect()
    }

    /// Value of a field in the basis URL
    pub fn get(&self, key: &FieldKey) -> Option<&FieldValue> {
        [Bucket::Equal, Bucket::NotEqual, Bucket::Minus]
            .into_iter()
            .find_map(|bucket| self.partition.bucket(bucket).get(key))
    }

    /// Returns the (path, query) pair of the basis URL with `overrides` applied
    pub fn compose(&self, overrides: &BTreeMap<FieldKey, FieldValue>) -> Result<(String, String)> {
        compose_parts(&self.basis, &self.partition, overrides)
    }

    /// Returns the full basis URL with `overrides` applied
    pub fn unparse(&self, overrides: &BTreeMap<FieldKey, FieldValue>) -> Result<String> {
        let (path, query) = self.compose(overrides)?;
        Ok(self.basis.assemble(&path, &query))
    }
}

/// Composes a URL string from `basis_url`'s scheme, authority and fragment
/// and the fields recorded in `diff`, with `overrides` applied last
pub fn compose_url(
    basis_url: &str,
    diff: &UrlPartition,
    overrides: &BTreeMap<FieldKey, FieldValue>,
) -> Result<String> {
    let basis = UrlParts::parse(basis_url);
    let (path, query) = compose_parts(&basis, diff, overrides)?;
    Ok(basis.assemble(&path, &query))
}

fn compose_parts(
    basis: &UrlParts,
    diff: &UrlPartition,
    overrides: &BTreeMap<FieldKey, FieldValue>,
) -> Result<(String, String)> {
    let mut fields: BTreeMap<FieldKey, FieldValue> = BTreeMap::new();
    for bucket in [Bucket::Equal, Bucket::NotEqual, Bucket::Minus] {
        for (key, value) in diff.bucket(bucket) {
            fields.insert(key.clone(), value.clone());
        }
    }
    for (key, value) in overrides {
        fields.insert(key.clone(), value.clone());
    }

    // Path indices sort first, so they come out of the map in order
    let mut segments = Vec::new();
    for (key, value) in &fields {
        let FieldKey::PathIndex(index) = key else {
            break;
        };
        if *index != segments.len() {
            return Err(PagerError::Sequencing {
                index: *index,
                expected: segments.len(),
            });
        }
        segments.push(segment_text(*index, value)?);
    }

    // Query parameters keep the basis URL's order and text, new names go last
    let mut names: Vec<&str> = basis
        .query
        .iter()
        .map(|(name, _)| name.as_str())
        .filter(|name| fields.contains_key(&FieldKey::query(*name)))
        .collect();
    for key in fields.keys() {
        if let FieldKey::QueryName(name) = key {
            if !names.contains(&name.as_str()) {
                names.push(name);
            }
        }
    }

    let params = names.into_iter().filter_map(|name| {
        fields
            .get(&FieldKey::query(name))
            .map(|value| (name, value.values()))
    });
    let query = basis.query_string(params);

    Ok((basis.join_path(&segments), query))
}

fn segment_text(index: usize, value: &FieldValue) -> Result<String> {
    match value.values() {
        [single] => Ok(single.clone()),
        values => Err(PagerError::Structural(format!(
            "path segment #{} needs exactly one value, got {}",
            index,
            values.len()
        ))),
    }
}

/// Diff of a URL against itself, the identity input for `compose_url`
pub fn self_diff(url: &str) -> UrlPartition {
    build_diff(url, url)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CURRENT: &str =
        "https://test.blog.lan/some/url/path/?page=1&next_val=nextval&dbl_val=one&dbl_val=two";
    const OTHER: &str =
        "https://test.blog.lan/some/url/path?dbl_val=one&dbl_val=two&page=2&with=&next_val=nextval_dif_val";

    #[test]
    fn test_compose_without_overrides_rebuilds_basis() {
        let diff = UrlDiff::new(CURRENT, OTHER);
        assert_eq!(diff.unparse(&BTreeMap::new()).unwrap(), CURRENT);
    }

    #[test]
    fn test_compose_with_overrides() {
        let diff = UrlDiff::new(CURRENT, OTHER);
        let overrides = BTreeMap::from([
            (FieldKey::query("page"), FieldKey::query("page").value_of("24")),
            (FieldKey::PathIndex(1), FieldValue::from("url_modified")),
        ]);
        assert_eq!(
            diff.unparse(&overrides).unwrap(),
            "https://test.blog.lan/some/url_modified/path/?page=24&next_val=nextval&dbl_val=one&dbl_val=two"
        );
    }

    #[test]
    fn test_self_diff_round_trip() {
        for url in [
            "https://test.blog.lan/",
            "https://test.blog.lan/?page=2",
            "https://test.blog.lan/some/url/path?page=2&with=&extra=extraval&some=1",
            "http://site.com/path/name#section",
            "https://h/login?next=/a/b",
            "https://h/search?q=a%20b",
            "https://h/list?a=1&b=2&a=3",
            "https://h/list?flag",
        ] {
            assert_eq!(compose_url(url, &self_diff(url), &BTreeMap::new()).unwrap(), url);
        }
    }

    #[test]
    fn test_plus_bucket_is_ignored() {
        let diff = build_diff("https://h/a", "https://h/a/b?extra=1");
        assert_eq!(
            compose_url("https://h/a", &diff, &BTreeMap::new()).unwrap(),
            "https://h/a"
        );
    }

    #[test]
    fn test_minus_bucket_fields_are_kept() {
        let diff = build_diff("https://h/a/b/c?page=2&sort=asc", "https://h/a?page=3");
        assert!(diff.bucket(Bucket::Minus).contains_key(&FieldKey::PathIndex(2)));
        assert!(diff.bucket(Bucket::Minus).contains_key(&FieldKey::query("sort")));
        assert_eq!(
            compose_url("https://h/a/b/c?page=2&sort=asc", &diff, &BTreeMap::new()).unwrap(),
            "https://h/a/b/c?page=2&sort=asc"
        );

        let overrides = BTreeMap::from([(FieldKey::query("page"), FieldKey::query("page").value_of("4"))]);
        assert_eq!(
            compose_url("https://h/a/b/c?page=2&sort=asc", &diff, &overrides).unwrap(),
            "https://h/a/b/c?page=4&sort=asc"
        );
    }

    #[test]
    fn test_gap_in_path_fails() {
        let diff = UrlDiff::new("https://h/a/b", "https://h/a/b");
        let overrides = BTreeMap::from([(FieldKey::PathIndex(5), FieldValue::from("x"))]);
        match diff.unparse(&overrides) {
            Err(PagerError::Sequencing { index, expected }) => {
                assert_eq!(index, 5);
                assert_eq!(expected, 2);
            }
            other => panic!("expected a sequencing error, got {:?}", other),
        }
    }

    #[test]
    fn test_override_appends_path_segment() {
        let diff = UrlDiff::new("https://h/some/", "https://h/some/");
        let overrides = BTreeMap::from([(FieldKey::PathIndex(1), FieldValue::from("3"))]);
        assert_eq!(diff.unparse(&overrides).unwrap(), "https://h/some/3/");
    }

    #[test]
    fn test_multi_value_path_override_is_structural_error() {
        let diff = UrlDiff::new("https://h/a", "https://h/a");
        let overrides = BTreeMap::from([(
            FieldKey::PathIndex(0),
            FieldValue::Params(vec!["x".into(), "y".into()]),
        )]);
        assert!(matches!(diff.unparse(&overrides), Err(PagerError::Structural(_))));
    }

    #[test]
    fn test_new_query_param_goes_last() {
        let diff = UrlDiff::new("https://h/list?z=1&a=2", "https://h/list?z=1&a=2");
        let overrides = BTreeMap::from([(FieldKey::query("page"), FieldKey::query("page").value_of("3"))]);
        assert_eq!(diff.unparse(&overrides).unwrap(), "https://h/list?z=1&a=2&page=3");
    }

    #[test]
    fn test_get_reads_basis_fields() {
        let diff = UrlDiff::new(CURRENT, OTHER);
        assert_eq!(diff.get(&FieldKey::PathIndex(0)), Some(&FieldValue::from("some")));
        assert_eq!(
            diff.get(&FieldKey::query("page")),
            Some(&FieldValue::Params(vec!["1".into()]))
        );
        // only the other URL has "with"
        assert_eq!(diff.get(&FieldKey::query("with")), None);
    }

    #[test]
    fn test_differences_skip_empty_and_equal() {
        let diff = UrlDiff::new(CURRENT, OTHER);
        let buckets: Vec<Bucket> = diff.differences().into_iter().map(|(b, _)| b).collect();
        assert_eq!(buckets, vec![Bucket::Plus, Bucket::NotEqual]);
    }
}
