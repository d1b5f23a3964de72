// src/urldiff/diff.rs
// =============================================================================
// The structural diff engine.
//
// Two URLs are compared field by field and every field lands in exactly one
// of four buckets:
//
//   minus      present only in the current URL
//   plus       present only in the other URL
//   not_equal  present in both, with different values (current value kept)
//   equal      present in both, with identical values
//
// Path segments are compared purely by position: inserting one segment
// shifts every following comparison. There is no alignment step.
// =============================================================================

use serde::Serialize;
use std::collections::BTreeMap;

use super::key::{FieldKey, FieldValue};
use super::parts::{parse_query, split_path, UrlParts};

/// Names of the four buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Minus,
    Plus,
    NotEqual,
    Equal,
}

impl Bucket {
    /// Buckets that describe a change between the two URLs
    pub const DIFFERENCES: [Bucket; 3] = [Bucket::Plus, Bucket::Minus, Bucket::NotEqual];
}

/// Four-way partition of the union of two mappings' keys
///
/// Empty buckets are empty maps, never absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffPartition<K: Ord, V> {
    pub minus: BTreeMap<K, V>,
    pub plus: BTreeMap<K, V>,
    pub not_equal: BTreeMap<K, V>,
    pub equal: BTreeMap<K, V>,
}

impl<K: Ord, V> Default for DiffPartition<K, V> {
    fn default() -> Self {
        DiffPartition {
            minus: BTreeMap::new(),
            plus: BTreeMap::new(),
            not_equal: BTreeMap::new(),
            equal: BTreeMap::new(),
        }
    }
}

impl<K: Ord, V> DiffPartition<K, V> {
    pub fn bucket(&self, bucket: Bucket) -> &BTreeMap<K, V> {
        match bucket {
            Bucket::Minus => &self.minus,
            Bucket::Plus => &self.plus,
            Bucket::NotEqual => &self.not_equal,
            Bucket::Equal => &self.equal,
        }
    }

    fn bucket_mut(&mut self, bucket: Bucket) -> &mut BTreeMap<K, V> {
        match bucket {
            Bucket::Minus => &mut self.minus,
            Bucket::Plus => &mut self.plus,
            Bucket::NotEqual => &mut self.not_equal,
            Bucket::Equal => &mut self.equal,
        }
    }

    /// True when nothing differs (every key is in `equal`)
    pub fn is_identical(&self) -> bool {
        self.minus.is_empty() && self.plus.is_empty() && self.not_equal.is_empty()
    }

    /// Which bucket a key landed in, if any
    pub fn locate(&self, key: &K) -> Option<Bucket> {
        [Bucket::Minus, Bucket::Plus, Bucket::NotEqual, Bucket::Equal]
            .into_iter()
            .find(|bucket| self.bucket(*bucket).contains_key(key))
    }
}

/// The merged partition of a whole URL, keyed by path index and query name
pub type UrlPartition = DiffPartition<FieldKey, FieldValue>;

/// Compares two key -> value mappings
///
/// Values are compared with `==`, so sequence values are order and length
/// sensitive. `not_equal` and `equal` keep the current mapping's value.
pub fn diff_mapping<K, V>(current: &BTreeMap<K, V>, other: &BTreeMap<K, V>) -> DiffPartition<K, V>
where
    K: Ord + Clone,
    V: PartialEq + Clone,
{
    let mut partition = DiffPartition::default();

    for (key, value) in current {
        let bucket = match other.get(key) {
            None => Bucket::Minus,
            Some(other_value) if other_value != value => Bucket::NotEqual,
            Some(_) => Bucket::Equal,
        };
        partition.bucket_mut(bucket).insert(key.clone(), value.clone());
    }

    for (key, value) in other {
        if !current.contains_key(key) {
            partition.plus.insert(key.clone(), value.clone());
        }
    }

    partition
}

/// Positional comparison of two paths
pub fn diff_path(current: &str, other: &str) -> DiffPartition<usize, String> {
    let positional = |path: &str| -> BTreeMap<usize, String> {
        split_path(path).into_iter().enumerate().collect()
    };
    diff_mapping(&positional(current), &positional(other))
}

/// Comparison of two raw query strings as multimaps
pub fn diff_query(current: &str, other: &str) -> DiffPartition<String, Vec<String>> {
    let multimap = |query: &str| -> BTreeMap<String, Vec<String>> {
        parse_query(query).into_iter().collect()
    };
    diff_mapping(&multimap(current), &multimap(other))
}

/// Diffs two parsed URLs and merges path and query results bucket-wise
pub fn diff_parts(current: &UrlParts, other: &UrlParts) -> UrlPartition {
    let path = diff_mapping(&current.path_map(), &other.path_map());
    let query = diff_mapping(&current.query_map(), &other.query_map());

    let mut merged = UrlPartition::default();
    for bucket in [Bucket::Minus, Bucket::Plus, Bucket::NotEqual, Bucket::Equal] {
        let target = merged.bucket_mut(bucket);
        for (index, segment) in path.bucket(bucket) {
            target.insert(FieldKey::PathIndex(*index), FieldValue::Segment(segment.clone()));
        }
        for (name, values) in query.bucket(bucket) {
            target.insert(FieldKey::QueryName(name.clone()), FieldValue::Params(values.clone()));
        }
    }
    merged
}

/// Parses both URLs and returns their merged partition
pub fn build_diff(current: &str, other: &str) -> UrlPartition {
    diff_parts(&UrlParts::parse(current), &UrlParts::parse(other))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_diff_path_extra_segments() {
        let diff = diff_path("/some/url/path/", "/some/url/path/with/extra/");
        assert_eq!(
            diff.plus,
            BTreeMap::from([(3, "with".to_string()), (4, "extra".to_string())])
        );
        assert_eq!(
            diff.equal,
            BTreeMap::from([(0, "some".to_string()), (1, "url".to_string()), (2, "path".to_string())])
        );
        assert!(diff.minus.is_empty());
        assert!(diff.not_equal.is_empty());
    }

    #[test]
    fn test_diff_path_removed_segments() {
        let diff = diff_path("/some/url/path/with/extra", "/some/url/path/");
        assert_eq!(
            diff.minus,
            BTreeMap::from([(3, "with".to_string()), (4, "extra".to_string())])
        );
        assert!(diff.plus.is_empty());
    }

    #[test]
    fn test_diff_path_is_positional() {
        let diff = diff_path(
            "/some/url_changed/path/with/",
            "/some/url/path_changed/with/extra/",
        );
        assert_eq!(diff.plus, BTreeMap::from([(4, "extra".to_string())]));
        assert_eq!(
            diff.not_equal,
            BTreeMap::from([(1, "url_changed".to_string()), (2, "path".to_string())])
        );
        assert_eq!(
            diff.equal,
            BTreeMap::from([(0, "some".to_string()), (3, "with".to_string())])
        );
    }

    #[test]
    fn test_diff_query_multimap() {
        let diff = diff_query(
            "page=1&next=n&dbl=one&dbl=two",
            "dbl=one&dbl=two&page=2&with=&next=n2",
        );
        assert_eq!(diff.plus, BTreeMap::from([("with".to_string(), strings(&[""]))]));
        assert_eq!(
            diff.not_equal,
            BTreeMap::from([
                ("page".to_string(), strings(&["1"])),
                ("next".to_string(), strings(&["n"])),
            ])
        );
        assert_eq!(diff.equal, BTreeMap::from([("dbl".to_string(), strings(&["one", "two"]))]));
        assert!(diff.minus.is_empty());
    }

    #[test]
    fn test_value_order_matters() {
        let diff = diff_query("dbl=one&dbl=two", "dbl=two&dbl=one");
        assert_eq!(diff.not_equal.len(), 1);
        assert!(diff.equal.is_empty());
    }

    #[test]
    fn test_empty_inputs_give_empty_buckets() {
        let diff = diff_query("", "");
        assert_eq!(diff, DiffPartition::default());
        assert!(diff.is_identical());
    }

    #[test]
    fn test_buckets_partition_key_union() {
        let pairs = [
            ("https://h/a/b/c?x=1&y=2", "https://h/a/z?y=2&w=3"),
            ("https://h/", "https://h/one/two?page=4"),
            ("https://h/p/1?q=a&q=b", "https://h/p/2?q=b&q=a"),
        ];
        for (current, other) in pairs {
            let diff = build_diff(current, other);
            let cur = UrlParts::parse(current);
            let oth = UrlParts::parse(other);

            let mut expected: Vec<FieldKey> = cur
                .path_map()
                .into_keys()
                .chain(oth.path_map().into_keys())
                .map(FieldKey::PathIndex)
                .chain(
                    cur.query_map()
                        .into_keys()
                        .chain(oth.query_map().into_keys())
                        .map(FieldKey::QueryName),
                )
                .collect();
            expected.sort();
            expected.dedup();

            let mut seen: Vec<FieldKey> = [Bucket::Minus, Bucket::Plus, Bucket::NotEqual, Bucket::Equal]
                .into_iter()
                .flat_map(|bucket| diff.bucket(bucket).keys().cloned().collect::<Vec<_>>())
                .collect();
            let total = seen.len();
            seen.sort();
            seen.dedup();

            assert_eq!(total, seen.len(), "a key appears in two buckets");
            assert_eq!(seen, expected);
        }
    }

    #[test]
    fn test_build_diff_merges_path_and_query() {
        let diff = build_diff(
            "https://test.blog.lan/some/url/path/?page=1&next_val=nextval&dbl_val=one&dbl_val=two",
            "https://test.blog.lan/some/url/path?dbl_val=one&dbl_val=two&page=2&with=&next_val=other",
        );
        assert!(diff.minus.is_empty());
        assert_eq!(
            diff.plus,
            BTreeMap::from([(FieldKey::query("with"), FieldValue::Params(strings(&[""])))])
        );
        assert_eq!(
            diff.not_equal,
            BTreeMap::from([
                (FieldKey::query("next_val"), FieldValue::Params(strings(&["nextval"]))),
                (FieldKey::query("page"), FieldValue::Params(strings(&["1"]))),
            ])
        );
        assert_eq!(
            diff.equal,
            BTreeMap::from([
                (FieldKey::PathIndex(0), FieldValue::from("some")),
                (FieldKey::PathIndex(1), FieldValue::from("url")),
                (FieldKey::PathIndex(2), FieldValue::from("path")),
                (FieldKey::query("dbl_val"), FieldValue::Params(strings(&["one", "two"]))),
            ])
        );
        assert_eq!(diff.locate(&FieldKey::query("page")), Some(Bucket::NotEqual));
        assert_eq!(diff.locate(&FieldKey::query("missing")), None);
    }

    #[test]
    fn test_identical_urls_are_all_equal() {
        let diff = build_diff("https://h/a/b?x=1", "https://h/a/b?x=1");
        assert!(diff.is_identical());
        assert_eq!(diff.equal.len(), 3);
    }
}
