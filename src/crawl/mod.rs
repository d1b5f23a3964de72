// src/crawl/mod.rs
// =============================================================================
// This module handles paginated crawling.
//
// Features:
// - FIFO frontier of page URLs with a visited set
// - Links extracted with a CSS selector, resolved against their page
// - Next pages discovered through a pager selector or given as a fixed list
// - Pager links normalized before deduplication
//
// Submodules:
// - fetch: the Fetch collaborator and its reqwest implementation
// - select: CSS-selector-based link extraction
// - normalize: page URL normalizers
// - queue: the crawl loop itself
// =============================================================================

mod fetch;
mod normalize;
mod queue;
mod select;

pub use fetch::{Fetch, FetchedPage, HttpFetcher};
pub(crate) use fetch::is_certificate_error;
pub use normalize::{Identity, KeepQuery, PageUrlNormalizer};
pub use queue::{CrawlPhase, CrawlState, Crawler, DiscoveredLink, PageSource};
pub use select::{CssSelector, Extractor, RawLink, ELEMENT_URL_ATTR};

use crate::config::CrawlConfig;
use crate::error::Result;

/// Builds an HTTP crawler for `start_url` from a configuration
///
/// A non-empty `static_pages` list takes precedence over the pager selector.
pub fn site_crawler(
    start_url: &str,
    config: &CrawlConfig,
    static_pages: Vec<String>,
) -> Result<Crawler<HttpFetcher>> {
    let fetcher = HttpFetcher::new(config)?;
    let links = Box::new(CssSelector::new(&config.link_selector)?);

    let pages = if !static_pages.is_empty() {
        PageSource::Static(static_pages)
    } else if let Some(pager) = &config.pager_selector {
        PageSource::Extracted(Box::new(CssSelector::new(pager)?))
    } else {
        PageSource::None
    };

    let normalizer: Box<dyn PageUrlNormalizer> = if config.keep_query.is_empty() {
        Box::new(Identity)
    } else {
        Box::new(KeepQuery::new(config.keep_query.iter().cloned()))
    };

    Ok(Crawler::new(start_url, fetcher, links)
        .with_pages(pages)
        .with_normalizer(normalizer))
}
