// src/urldiff/parts.rs
// =============================================================================
// Decomposes a URL string into the structural model the diff engine works on.
//
//   https://host/some/url/?page=2&q=a#top
//   \___/   \__/ \_______/ \________/ \_/
//   scheme  authority path   query    fragment
//
// The path is kept as a list of non-empty segments plus two flags telling
// whether it started and ended with a '/'. The query is a multimap: a name
// can appear several times and every value is kept, in order.
//
// No RFC validation happens here. Anything that isn't a scheme, authority,
// query or fragment is treated as the path.
// =============================================================================

use std::collections::BTreeMap;
use url::form_urlencoded;

pub const PATH_SEPARATOR: char = '/';

/// Query parameters keyed by name, every value kept in order
pub type QueryMap = BTreeMap<String, Vec<String>>;

/// Structural view of one URL
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UrlParts {
    pub scheme: String,
    pub authority: Option<String>,
    /// Non-empty path components, in order
    pub segments: Vec<String>,
    pub leading_slash: bool,
    pub trailing_slash: bool,
    /// Query parameters in order of first appearance
    pub query: Vec<(String, Vec<String>)>,
    /// The query's `name=value` pieces exactly as written
    pub raw_query: Vec<RawPair>,
    pub fragment: Option<String>,
}

/// One `name=value` piece of a query, decoded and as written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPair {
    pub name: String,
    pub value: String,
    pub text: String,
}

impl UrlParts {
    /// Splits a URL string into its parts
    ///
    /// Never fails: relative references simply have no scheme or authority.
    pub fn parse(url: &str) -> Self {
        let (rest, fragment) = match url.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment.to_string())),
            None => (url, None),
        };

        let (rest, query) = match rest.split_once('?') {
            Some((rest, query)) => (rest, query),
            None => (rest, ""),
        };

        let (scheme, rest) = split_scheme(rest);

        let (authority, path) = match rest.strip_prefix("//") {
            Some(after) => {
                let end = after.find(PATH_SEPARATOR).unwrap_or(after.len());
                (Some(after[..end].to_string()), &after[end..])
            }
            None => (None, rest),
        };

        let raw_query = raw_pairs(query);
        UrlParts {
            scheme: scheme.to_string(),
            authority,
            segments: split_path(path),
            leading_slash: path.starts_with(PATH_SEPARATOR),
            trailing_slash: path.ends_with(PATH_SEPARATOR),
            query: group_pairs(&raw_query),
            raw_query,
            fragment,
        }
    }

    /// Path segments keyed by their position
    pub fn path_map(&self) -> BTreeMap<usize, String> {
        self.segments.iter().cloned().enumerate().collect()
    }

    /// Query parameters as a name -> values multimap
    pub fn query_map(&self) -> QueryMap {
        self.query.iter().cloned().collect()
    }

    /// Joins segments back into a path, reapplying the slash flags
    pub fn join_path(&self, segments: &[String]) -> String {
        if segments.is_empty() {
            // "https://host/" keeps its lone slash
            return if self.leading_slash {
                PATH_SEPARATOR.to_string()
            } else {
                String::new()
            };
        }

        let mut path = segments.join("/");
        if self.leading_slash {
            path.insert(0, PATH_SEPARATOR);
        }
        if self.trailing_slash {
            path.push(PATH_SEPARATOR);
        }
        path
    }

    /// Assembles a URL from this URL's scheme, authority and fragment and
    /// the given path and (already encoded) query
    pub fn assemble(&self, path: &str, query: &str) -> String {
        let mut url = String::new();
        if !self.scheme.is_empty() {
            url.push_str(&self.scheme);
            url.push(':');
        }
        if let Some(authority) = &self.authority {
            url.push_str("//");
            url.push_str(authority);
        }
        url.push_str(path);
        if !query.is_empty() {
            url.push('?');
            url.push_str(query);
        }
        if let Some(fragment) = self.fragment.as_deref().filter(|f| !f.is_empty()) {
            url.push('#');
            url.push_str(fragment);
        }
        url
    }

    /// Rebuilds the URL from its parts
    pub fn unparse(&self) -> String {
        let path = self.join_path(&self.segments);
        let query = self.query_string(self.query.iter().map(|(name, values)| (name.as_str(), values.as_slice())));
        self.assemble(&path, &query)
    }

    /// Builds a query string for `params`
    ///
    /// Names this URL already carries keep their position. A name whose
    /// values are unchanged is copied as written, so `?next=/a/b` or `?flag`
    /// survive untouched. Changed names are re-encoded at their first
    /// position, and names this URL lacks are appended in the given order.
    pub fn query_string<'a, I>(&self, params: I) -> String
    where
        I: IntoIterator<Item = (&'a str, &'a [String])>,
    {
        let params: Vec<(&str, &[String])> = params.into_iter().collect();
        let original = group_pairs(&self.raw_query);
        let unchanged = |name: &str, values: &[String]| {
            original
                .iter()
                .any(|(existing, written)| existing == name && written.as_slice() == values)
        };

        let mut pieces = Vec::new();
        let mut reencoded: Vec<&str> = Vec::new();
        for pair in &self.raw_query {
            let Some(&(name, values)) = params.iter().find(|(name, _)| *name == pair.name) else {
                continue;
            };
            if unchanged(name, values) {
                pieces.push(pair.text.clone());
            } else if !reencoded.contains(&name) {
                reencoded.push(name);
                pieces.push(encode_query([(name, values)]));
            }
        }
        for &(name, values) in &params {
            if !self.raw_query.iter().any(|pair| pair.name == name) {
                pieces.push(encode_query([(name, values)]));
            }
        }

        pieces.retain(|piece| !piece.is_empty());
        pieces.join("&")
    }
}

// A scheme is ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ) followed by ':'
fn split_scheme(rest: &str) -> (&str, &str) {
    if let Some(colon) = rest.find(':') {
        let candidate = &rest[..colon];
        let mut chars = candidate.chars();
        let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if valid {
            return (candidate, &rest[colon + 1..]);
        }
    }
    ("", rest)
}

/// Splits a path on '/' and drops the empty components
pub fn split_path(path: &str) -> Vec<String> {
    path.split(PATH_SEPARATOR)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses a raw query string, keeping blank values and repeated names
///
/// Names keep their order of first appearance.
pub fn parse_query(query: &str) -> Vec<(String, Vec<String>)> {
    group_pairs(&raw_pairs(query))
}

/// Splits a raw query string into its decoded pieces, in order
pub fn raw_pairs(query: &str) -> Vec<RawPair> {
    query
        .split('&')
        .filter(|piece| !piece.is_empty())
        .filter_map(|text| {
            form_urlencoded::parse(text.as_bytes())
                .next()
                .map(|(name, value)| RawPair {
                    name: name.into_owned(),
                    value: value.into_owned(),
                    text: text.to_string(),
                })
        })
        .collect()
}

fn group_pairs(pairs: &[RawPair]) -> Vec<(String, Vec<String>)> {
    let mut params: Vec<(String, Vec<String>)> = Vec::new();
    for pair in pairs {
        match params.iter_mut().find(|(existing, _)| *existing == pair.name) {
            Some((_, values)) => values.push(pair.value.clone()),
            None => params.push((pair.name.clone(), vec![pair.value.clone()])),
        }
    }
    params
}

/// Form-encodes parameters, one `name=value` pair per value
pub fn encode_query<'a, I>(params: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a [String])>,
{
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (name, values) in params {
        for value in values {
            serializer.append_pair(name, value);
        }
    }
    serializer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_url() {
        let parts = UrlParts::parse("https://test.blog.lan/some/url/?page=2&q=a#top");
        assert_eq!(parts.scheme, "https");
        assert_eq!(parts.authority.as_deref(), Some("test.blog.lan"));
        assert_eq!(parts.segments, vec!["some", "url"]);
        assert!(parts.leading_slash);
        assert!(parts.trailing_slash);
        assert_eq!(
            parts.query,
            vec![
                ("page".to_string(), vec!["2".to_string()]),
                ("q".to_string(), vec!["a".to_string()]),
            ]
        );
        assert_eq!(parts.fragment.as_deref(), Some("top"));
    }

    #[test]
    fn test_double_separators_are_discarded() {
        let parts = UrlParts::parse("https://h//a///b");
        assert_eq!(parts.segments, vec!["a", "b"]);
        assert!(!parts.trailing_slash);
    }

    #[test]
    fn test_repeated_and_blank_params() {
        let query = parse_query("dbl=one&with=&dbl=two&flag");
        assert_eq!(
            query,
            vec![
                ("dbl".to_string(), vec!["one".to_string(), "two".to_string()]),
                ("with".to_string(), vec![String::new()]),
                ("flag".to_string(), vec![String::new()]),
            ]
        );
    }

    #[test]
    fn test_unparse_round_trip() {
        for url in [
            "https://test.blog.lan/",
            "https://test.blog.lan",
            "https://test.blog.lan/some/url/path/?page=2",
            "https://test.blog.lan/some/url?page=1&next=n&dbl=one&dbl=two#frag",
            "/relative/path?x=1",
        ] {
            assert_eq!(UrlParts::parse(url).unparse(), url);
        }
    }

    #[test]
    fn test_unparse_keeps_query_as_written() {
        for url in [
            "https://h/login?next=/a/b",
            "https://h/search?q=a%20b",
            "https://h/list?a=1&b=2&a=3",
            "https://h/list?flag&page=2",
        ] {
            assert_eq!(UrlParts::parse(url).unparse(), url);
        }
    }

    #[test]
    fn test_query_string_reencodes_changed_names_only() {
        let parts = UrlParts::parse("https://h/list?next=/a/b&page=1&page=9&sort");
        let next = vec!["/a/b".to_string()];
        let page = vec!["2".to_string()];
        let sort = vec![String::new()];
        let extra = vec!["x y".to_string()];
        assert_eq!(
            parts.query_string([
                ("next", next.as_slice()),
                ("page", page.as_slice()),
                ("sort", sort.as_slice()),
                ("extra", extra.as_slice()),
            ]),
            "next=/a/b&page=2&sort&extra=x+y"
        );
    }

    #[test]
    fn test_raw_pairs_decode_names() {
        let pairs = raw_pairs("a%20b=1&&flag");
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].name, "a b");
        assert_eq!(pairs[0].text, "a%20b=1");
        assert_eq!(pairs[1].value, "");
    }

    #[test]
    fn test_relative_reference_has_no_scheme() {
        let parts = UrlParts::parse("page/2?sort=asc");
        assert_eq!(parts.scheme, "");
        assert_eq!(parts.authority, None);
        assert_eq!(parts.segments, vec!["page", "2"]);
        assert!(!parts.leading_slash);
    }

    #[test]
    fn test_encode_query_plus_for_space() {
        let values = vec!["a b".to_string()];
        assert_eq!(encode_query([("q", values.as_slice())]), "q=a+b");
    }
}
