// src/recognizer.rs
// =============================================================================
// Recognizes which single URL field encodes the page number.
//
// How it works:
// 1. Diff every adjacent pair of URLs in the trace
// 2. Score each change bucket (plus, minus, not_equal) by how "numeric" its
//    fields are
// 3. Keep only the pairs scoring exactly 1.0: one numeric field changed
// 4. Every kept pair must point at the same field, otherwise give up
//
// The recognizer never guesses. Anything short of a unanimous, 100% answer
// is reported as an ambiguity.
// =============================================================================

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::error::{PagerError, Result};
use crate::urldiff::{Bucket, FieldKey, FieldValue, UrlDiff};

/// Weights are rounded to this many decimal places at every step
pub const ROUND_PRECISION: i32 = 3;

fn round(value: f64) -> f64 {
    let factor = 10f64.powi(ROUND_PRECISION);
    (value * factor).round() / factor
}

/// A field whose values are at least partly integers
#[derive(Debug, Clone, PartialEq)]
pub struct FieldScore {
    pub key: FieldKey,
    /// Fraction of the field's values that parse as integers
    pub ratio: f64,
    pub numbers: Vec<i128>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BucketScore {
    pub bucket: Bucket,
    pub weight: f64,
    /// Only fields with a non-zero ratio
    pub fields: Vec<FieldScore>,
}

/// Score of one adjacent URL pair
#[derive(Debug, Clone, PartialEq)]
pub struct PairScore {
    pub weight: f64,
    /// Only buckets with a non-zero weight
    pub buckets: Vec<BucketScore>,
}

impl PairScore {
    pub fn is_confident(&self) -> bool {
        self.weight == 1.0
    }

    /// The single field a confident pair points at
    fn sole_field(&self) -> Result<&FieldScore> {
        match self.buckets.as_slice() {
            [bucket] => match bucket.fields.as_slice() {
                [field] => Ok(field),
                fields => Err(PagerError::Invariant(format!(
                    "a pair weighing 1.0 must change exactly one field, found {}",
                    fields.len()
                ))),
            },
            buckets => Err(PagerError::Invariant(format!(
                "a pair weighing 1.0 must change exactly one bucket, found {}",
                buckets.len()
            ))),
        }
    }
}

/// An optional sign followed by ASCII digits, of any length
fn is_integer(value: &str) -> bool {
    let digits = value.strip_prefix(['+', '-']).unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Fraction of values that are integers, and the integers that fit an i128
fn integer_ratio(values: &[String]) -> (f64, Vec<i128>) {
    if values.is_empty() {
        return (0.0, Vec::new());
    }
    let integers: Vec<&str> = values
        .iter()
        .map(|value| value.trim())
        .filter(|value| is_integer(value))
        .collect();
    let numbers = integers.iter().filter_map(|value| value.parse::<i128>().ok()).collect();
    (round(integers.len() as f64 / values.len() as f64), numbers)
}

fn score_bucket(bucket: Bucket, fields: &BTreeMap<FieldKey, FieldValue>) -> BucketScore {
    let count = fields.len() as f64;
    let mut sum = 0.0;
    let mut scored = Vec::new();

    for (key, value) in fields {
        let (ratio, numbers) = integer_ratio(value.values());
        sum += round(ratio / count);
        if ratio > 0.0 {
            scored.push(FieldScore {
                key: key.clone(),
                ratio,
                numbers,
            });
        }
    }

    let weight = if sum == 0.0 { 0.0 } else { round(sum / count) };
    BucketScore {
        bucket,
        weight,
        fields: scored,
    }
}

/// Scores the differences of one URL pair
///
/// The average of the contributing bucket weights is divided once more by
/// the number of contributing buckets, so 1.0 is reachable only when a
/// single bucket holding a single numeric field contributes.
pub fn score_pair(diff: &UrlDiff) -> PairScore {
    let buckets: Vec<BucketScore> = Bucket::DIFFERENCES
        .into_iter()
        .map(|bucket| score_bucket(bucket, diff.partition().bucket(bucket)))
        .filter(|score| score.weight > 0.0)
        .collect();

    if buckets.is_empty() {
        return PairScore {
            weight: 0.0,
            buckets,
        };
    }

    let positive = buckets.len() as f64;
    let sum: f64 = buckets.iter().map(|b| round(b.weight / positive)).sum();
    PairScore {
        weight: round(sum / positive),
        buckets,
    }
}

/// The recognized page field
#[derive(Debug, Clone)]
pub struct PageField {
    pub key: FieldKey,
    /// Page numbers observed at this field across the confident pairs
    pub values: BTreeSet<i128>,
    /// Diff of the last confident pair, basis for composing page URLs
    pub diff: UrlDiff,
}

/// Serializable part of a recognition result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageFieldRecord {
    pub key: FieldKey,
    pub values: Vec<i128>,
}

impl PageField {
    /// URL of page `page`, built from the diff's basis URL
    pub fn page_url(&self, page: i128) -> Result<String> {
        let overrides = BTreeMap::from([(self.key.clone(), self.key.value_of(page.to_string()))]);
        self.diff.unparse(&overrides)
    }

    pub fn record(&self) -> PageFieldRecord {
        PageFieldRecord {
            key: self.key.clone(),
            values: self.values.iter().copied().collect(),
        }
    }
}

/// Finds the one field that encodes the page number across `urls`
///
/// `urls` is a trace of consecutive pages, at least two of them.
pub fn recognize<S: AsRef<str>>(urls: &[S]) -> Result<PageField> {
    if urls.len() < 2 {
        return Err(PagerError::Structural(format!(
            "recognition needs at least 2 urls, got {}",
            urls.len()
        )));
    }

    let mut confident = Vec::new();
    for pair in urls.windows(2) {
        let (current, next) = (pair[0].as_ref(), pair[1].as_ref());
        let diff = UrlDiff::new(current, next);
        let score = score_pair(&diff);
        debug!(current, next, weight = score.weight, "scored url pair");
        if score.is_confident() {
            confident.push((score, diff));
        }
    }

    let share = confident.len() as f64;
    let mut votes: BTreeMap<FieldKey, (f64, BTreeSet<i128>, UrlDiff)> = BTreeMap::new();
    for (score, diff) in confident {
        let field = score.sole_field()?;
        let entry = votes
            .entry(field.key.clone())
            .or_insert_with(|| (0.0, BTreeSet::new(), diff.clone()));
        entry.0 += round(field.ratio / share);
        entry.1.extend(field.numbers.iter().copied());
        entry.2 = diff;
    }

    votes.retain(|_, (weight, _, _)| *weight > 0.0);
    if votes.len() != 1 {
        return Err(PagerError::Ambiguous {
            candidates: votes.into_keys().collect(),
        });
    }

    let (key, (weight, values, diff)) = votes
        .into_iter()
        .next()
        .ok_or_else(|| PagerError::Invariant("vote table emptied unexpectedly".to_string()))?;
    debug!(field = %key, weight, "recognized page field");
    Ok(PageField { key, values, diff })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_added_query_param_is_page_field() {
        let field = recognize(&["https://h/some/url", "https://h/some/url/?page=2"]).unwrap();
        assert_eq!(field.key, FieldKey::query("page"));
        assert_eq!(field.values, BTreeSet::from([2]));
        assert_eq!(field.page_url(5).unwrap(), "https://h/some/url?page=5");
    }

    #[test]
    fn test_non_integer_value_is_ambiguous() {
        let result = recognize(&["https://h/some/url", "https://h/some/url/?page=abc"]);
        match result {
            Err(PagerError::Ambiguous { candidates }) => assert!(candidates.is_empty()),
            other => panic!("expected ambiguity, got {:?}", other),
        }
    }

    #[test]
    fn test_path_segment_page_field() {
        let field = recognize(&[
            "https://test.blog.lan/some/0/",
            "https://test.blog.lan/some/1/",
            "https://test.blog.lan/some/2/",
        ])
        .unwrap();
        assert_eq!(field.key, FieldKey::PathIndex(1));
        assert_eq!(field.values, BTreeSet::from([0, 1]));
        assert_eq!(field.page_url(7).unwrap(), "https://test.blog.lan/some/7/");
    }

    #[test]
    fn test_disagreeing_pairs_are_ambiguous() {
        let result = recognize(&["https://h/a/1?p=1", "https://h/a/2?p=1", "https://h/a/2?p=2"]);
        match result {
            Err(PagerError::Ambiguous { candidates }) => {
                assert_eq!(candidates, vec![FieldKey::PathIndex(1), FieldKey::query("p")]);
            }
            other => panic!("expected ambiguity, got {:?}", other),
        }
    }

    #[test]
    fn test_two_numeric_changes_are_not_confident() {
        let diff = UrlDiff::new("https://h/a/1?p=1", "https://h/a/2?p=2");
        let score = score_pair(&diff);
        assert_eq!(score.weight, 0.5);
        assert!(recognize(&["https://h/a/1?p=1", "https://h/a/2?p=2"]).is_err());
    }

    #[test]
    fn test_two_buckets_are_not_confident() {
        let diff = UrlDiff::new("https://h/a/1", "https://h/a/2?p=3");
        let score = score_pair(&diff);
        assert_eq!(score.buckets.len(), 2);
        assert_eq!(score.weight, 0.5);
    }

    #[test]
    fn test_non_numeric_side_change_is_tolerated() {
        let field = recognize(&["https://h/list?page=1", "https://h/list?page=2&with="]).unwrap();
        assert_eq!(field.key, FieldKey::query("page"));
        assert_eq!(field.values, BTreeSet::from([1]));
    }

    #[test]
    fn test_non_confident_pairs_are_skipped() {
        let field = recognize(&[
            "https://h/list?page=1",
            "https://h/other?page=2",
            "https://h/other?page=3",
        ])
        .unwrap();
        assert_eq!(field.key, FieldKey::query("page"));
        assert_eq!(field.values, BTreeSet::from([2]));
        assert_eq!(field.diff.basis().segments, vec!["other"]);
    }

    #[test]
    fn test_partly_numeric_field_ratio() {
        let (ratio, numbers) = integer_ratio(&["1".to_string(), "x".to_string(), " 3 ".to_string()]);
        assert_eq!(ratio, 0.667);
        assert_eq!(numbers, vec![1, 3]);
        assert_eq!(integer_ratio(&[]).0, 0.0);
    }

    #[test]
    fn test_integers_wider_than_64_bits() {
        assert!(is_integer("12345678901234567890"));
        assert!(is_integer("-3"));
        assert!(!is_integer("1e5"));
        assert!(!is_integer("+"));

        let field = recognize(&[
            "https://h/feed?id=12345678901234567890",
            "https://h/feed?id=12345678901234567891",
        ])
        .unwrap();
        assert_eq!(field.key, FieldKey::query("id"));
        assert_eq!(field.values, BTreeSet::from([12345678901234567890]));
        assert_eq!(
            field.page_url(12345678901234567892).unwrap(),
            "https://h/feed?id=12345678901234567892"
        );
    }

    #[test]
    fn test_single_url_is_rejected() {
        assert!(matches!(
            recognize(&["https://h/a?page=1"]),
            Err(PagerError::Structural(_))
        ));
    }

    #[test]
    fn test_record_serializes_key_and_values() {
        let field = recognize(&["https://h/p?page=1", "https://h/p?page=2", "https://h/p?page=3"]).unwrap();
        let json = serde_json::to_string(&field.record()).unwrap();
        assert_eq!(json, r#"{"key":"page","values":[1,2]}"#);
    }
}
