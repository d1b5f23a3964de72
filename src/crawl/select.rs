// src/crawl/select.rs
// =============================================================================
// Link and pager extraction from fetched HTML.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM
// - Supports CSS selectors for finding elements
//
// An Extractor returns raw links: the attribute value exactly as written in
// the page, tagged with the element it came from. Resolving relative links
// is the crawl loop's job, since only it knows the page URL.
//
// Which attribute holds the link depends on the element:
//   <a href="...">   <img src="...">
// Elements of any other kind are skipped.
// =============================================================================

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use crate::error::{PagerError, Result};

/// Element name -> attribute carrying the link
pub const ELEMENT_URL_ATTR: &[(&str, &str)] = &[("a", "href"), ("img", "src")];

/// A link as found in the page, before resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawLink {
    /// Name of the originating element ("a", "img")
    pub tag: String,
    pub href: String,
}

/// Pulls raw links out of a parsed page
pub trait Extractor {
    fn extract(&self, document: &Html) -> Vec<RawLink>;
}

/// Extractor driven by a CSS selector
#[derive(Debug, Clone)]
pub struct CssSelector {
    selector: Selector,
}

impl CssSelector {
    pub fn new(selector: &str) -> Result<Self> {
        let trimmed = selector.trim();
        if trimmed.is_empty() {
            return Err(PagerError::Selector {
                selector: selector.to_string(),
                reason: "selector is empty".to_string(),
            });
        }
        let parsed = Selector::parse(trimmed).map_err(|err| PagerError::Selector {
            selector: selector.to_string(),
            reason: err.to_string(),
        })?;
        Ok(CssSelector { selector: parsed })
    }
}

impl Extractor for CssSelector {
    fn extract(&self, document: &Html) -> Vec<RawLink> {
        document
            .select(&self.selector)
            .filter_map(element_link)
            .collect()
    }
}

fn element_link(element: ElementRef<'_>) -> Option<RawLink> {
    let tag = element.value().name();
    let attr = ELEMENT_URL_ATTR
        .iter()
        .find(|(name, _)| *name == tag)
        .map(|(_, attr)| *attr)?;

    element.value().attr(attr).map(|href| RawLink {
        tag: tag.to_string(),
        href: href.trim().to_string(),
    })
}
