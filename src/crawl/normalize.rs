// src/crawl/normalize.rs
// =============================================================================
// Page URL normalization, applied to pager links before deduplication.
//
// Pagers often emit different-looking links to the same page. A search
// engine, for example, only cares about "q" and "start", but every pager
// link carries extra tracking parameters that differ from page to page.
// Normalizing those links makes "already visited" checks work.
// =============================================================================

use crate::urldiff::UrlParts;

pub trait PageUrlNormalizer {
    fn normalize(&self, url: String) -> String;
}

/// Leaves URLs untouched (the default)
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl PageUrlNormalizer for Identity {
    fn normalize(&self, url: String) -> String {
        url
    }
}

/// Closures work as normalizers too
impl<F> PageUrlNormalizer for F
where
    F: Fn(String) -> String,
{
    fn normalize(&self, url: String) -> String {
        self(url)
    }
}

/// Keeps only the named query parameters and drops the fragment
///
/// Missing parameters with a default get the default appended.
#[derive(Debug, Clone, Default)]
pub struct KeepQuery {
    names: Vec<String>,
    defaults: Vec<(String, String)>,
}

impl KeepQuery {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        KeepQuery {
            names: names.into_iter().map(Into::into).collect(),
            defaults: Vec::new(),
        }
    }

    pub fn with_default(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        if !self.names.contains(&name) {
            self.names.push(name.clone());
        }
        self.defaults.push((name, value.into()));
        self
    }
}

impl PageUrlNormalizer for KeepQuery {
    fn normalize(&self, url: String) -> String {
        let mut parts = UrlParts::parse(&url);
        parts.query.retain(|(name, _)| self.names.contains(name));
        for (name, value) in &self.defaults {
            if !parts.query.iter().any(|(existing, _)| existing == name) {
                parts.query.push((name.clone(), vec![value.clone()]));
            }
        }
        parts.fragment = None;
        parts.unparse()
    }
}
