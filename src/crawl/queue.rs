// src/crawl/queue.rs
// =============================================================================
// The paginated crawl loop.
//
// How it works:
// 1. Start with the start URL in the frontier
// 2. FETCHING: pop the head URL and fetch it (non-2xx aborts the crawl)
// 3. EXTRACTING: run the link extractor on the page and hand the links out,
//    resolved against the page URL
// 4. PAGINATING: once those links are consumed, run the pager extractor on
//    the same page, normalize the candidates and append the unseen ones
// 5. Repeat until the frontier is empty (IDLE)
//
// The frontier is strictly FIFO, and one page's links are always exhausted
// before the next page is fetched. Visited pages are never fetched again.
//
// State lives on the Crawler, so a second pass over an exhausted crawler
// yields nothing until reset() is called. The same holds after a failed
// fetch: the crawl is ABORTED and stays that way.
//
// Pages are deduplicated by their normalized URL, the start page included.
// =============================================================================

use futures::stream::{self, Stream};
use scraper::Html;
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use tracing::{debug, info, warn};
use url::Url;

use super::fetch::Fetch;
use super::normalize::{Identity, PageUrlNormalizer};
use super::select::{Extractor, RawLink};
use crate::error::{PagerError, Result};

/// Where the crawl loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlPhase {
    Idle,
    Fetching,
    Extracting,
    Paginating,
    /// A page failed; nothing more is crawled until `reset`
    Aborted,
}

/// Where additional page URLs come from
pub enum PageSource {
    /// Only the start URL is crawled
    None,
    /// Pager links are extracted from every fetched page
    Extracted(Box<dyn Extractor>),
    /// A fixed list of pages, enqueued once after the start page
    Static(Vec<String>),
}

/// A link discovered on a crawled page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredLink {
    /// Absolute URL of the link
    pub url: String,
    /// Element the link came from ("a", "img")
    pub tag: String,
    /// Page the link was found on
    pub page_url: String,
}

/// Mutable state of one crawl
#[derive(Debug, Default)]
pub struct CrawlState {
    pub frontier: VecDeque<String>,
    /// Normalized URLs of the pages fetched so far
    pub visited: HashSet<String>,
    pub current_page: Option<String>,
    static_taken: bool,
}

pub struct Crawler<F> {
    start_url: String,
    fetcher: F,
    links: Box<dyn Extractor>,
    pages: PageSource,
    normalizer: Box<dyn PageUrlNormalizer>,
    state: CrawlState,
    phase: CrawlPhase,
    // Links of the current page not handed out yet
    pending: VecDeque<DiscoveredLink>,
    // Resolved pager candidates of the current page, enqueued on the next step
    candidates: Option<Vec<String>>,
}

impl<F: Fetch> Crawler<F> {
    pub fn new(start_url: impl Into<String>, fetcher: F, links: Box<dyn Extractor>) -> Self {
        let start_url = start_url.into();
        let mut crawler = Crawler {
            start_url,
            fetcher,
            links,
            pages: PageSource::None,
            normalizer: Box::new(Identity),
            state: CrawlState::default(),
            phase: CrawlPhase::Idle,
            pending: VecDeque::new(),
            candidates: None,
        };
        crawler.reset();
        crawler
    }

    pub fn with_pages(mut self, pages: PageSource) -> Self {
        self.pages = pages;
        self
    }

    pub fn with_normalizer(mut self, normalizer: Box<dyn PageUrlNormalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn start_url(&self) -> &str {
        &self.start_url
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    /// The page whose links are being handed out
    pub fn current_page_url(&self) -> Option<&str> {
        self.state.current_page.as_deref()
    }

    /// Forgets every visited page and starts over from the start URL
    pub fn reset(&mut self) {
        self.state = CrawlState::default();
        self.state.frontier.push_back(self.start_url.clone());
        self.phase = CrawlPhase::Idle;
        self.pending.clear();
        self.candidates = None;
    }

    /// Crawls the next unvisited page and returns all of its links
    ///
    /// Returns `Ok(None)` once the frontier is exhausted or the crawl was
    /// aborted. Links still pending from `next_link` are dropped.
    pub async fn next_batch(&mut self) -> Result<Option<Vec<DiscoveredLink>>> {
        if self.phase == CrawlPhase::Aborted {
            return Ok(None);
        }
        match self.advance().await {
            Ok(batch) => Ok(batch),
            Err(err) => {
                self.abort();
                Err(err)
            }
        }
    }

    async fn advance(&mut self) -> Result<Option<Vec<DiscoveredLink>>> {
        self.pending.clear();
        self.paginate();

        while let Some(url) = self.state.frontier.pop_front() {
            let key = self.page_key(&url);
            if self.state.visited.contains(&key) {
                debug!(url = %url, "skipping visited page");
                continue;
            }

            self.phase = CrawlPhase::Fetching;
            self.state.current_page = Some(url.clone());
            info!(url = %url, "crawling page");

            let page = self.fetcher.fetch(&url).await?;
            if !page.is_success() {
                return Err(PagerError::Status {
                    url,
                    status: page.status,
                });
            }
            self.state.visited.insert(key);

            self.phase = CrawlPhase::Extracting;
            let links = self.harvest(&url, &page.body)?;
            debug!(url = %url, count = links.len(), "links extracted");
            return Ok(Some(links));
        }

        self.phase = CrawlPhase::Idle;
        self.state.current_page = None;
        Ok(None)
    }

    fn abort(&mut self) {
        if let Some(url) = &self.state.current_page {
            warn!(url = %url, "crawl aborted");
        }
        self.phase = CrawlPhase::Aborted;
        self.state.frontier.clear();
        self.state.current_page = None;
        self.pending.clear();
        self.candidates = None;
    }

    /// Next discovered link, crawling further pages as needed
    pub async fn next_link(&mut self) -> Result<Option<DiscoveredLink>> {
        loop {
            if let Some(link) = self.pending.pop_front() {
                return Ok(Some(link));
            }
            match self.next_batch().await? {
                Some(links) => self.pending.extend(links),
                None => return Ok(None),
            }
        }
    }

    /// Lazy stream of discovered links
    ///
    /// An error is the stream's last item. Dropping the stream early simply
    /// stops the crawl; the state stays on the crawler.
    pub fn links(&mut self) -> impl Stream<Item = Result<DiscoveredLink>> + '_ {
        stream::unfold(Some(self), |crawler| async move {
            let crawler = crawler?;
            match crawler.next_link().await {
                Ok(Some(link)) => Some((Ok(link), Some(crawler))),
                Ok(None) => None,
                Err(err) => Some((Err(err), None)),
            }
        })
    }

    // Parses the page once: links are returned, pager candidates are kept
    // for the paginating step
    fn harvest(&mut self, page_url: &str, body: &str) -> Result<Vec<DiscoveredLink>> {
        let base = Url::parse(page_url).map_err(|source| PagerError::InvalidUrl {
            url: page_url.to_string(),
            source,
        })?;
        let document = Html::parse_document(body);

        let links = self
            .links
            .extract(&document)
            .into_iter()
            .filter_map(|raw| {
                resolve(&base, &raw.href).map(|url| DiscoveredLink {
                    url,
                    tag: raw.tag,
                    page_url: page_url.to_string(),
                })
            })
            .collect();

        if let PageSource::Extracted(pager) = &self.pages {
            let candidates = pager
                .extract(&document)
                .into_iter()
                .filter(is_anchor)
                .filter_map(|raw| resolve(&base, &raw.href))
                .collect();
            self.candidates = Some(candidates);
        }

        Ok(links)
    }

    // Appends the current page's unseen pager links to the frontier
    fn paginate(&mut self) {
        if let Some(candidates) = self.candidates.take() {
            self.phase = CrawlPhase::Paginating;
            for candidate in candidates {
                let url = self.normalizer.normalize(candidate);
                self.enqueue(url);
            }
        }

        // A static list is handed over once, right after the start page
        let static_urls = match &self.pages {
            PageSource::Static(urls) if !self.state.static_taken && !self.state.visited.is_empty() => {
                Some(urls.clone())
            }
            _ => None,
        };
        if let Some(urls) = static_urls {
            self.phase = CrawlPhase::Paginating;
            self.state.static_taken = true;
            for url in urls {
                self.enqueue(url);
            }
        }
    }

    fn enqueue(&mut self, url: String) {
        // The visited check also covers a page linking to itself
        let key = self.page_key(&url);
        if self.state.visited.contains(&key)
            || self.state.frontier.iter().any(|queued| self.page_key(queued) == key)
        {
            return;
        }
        debug!(url = %url, "queued page");
        self.state.frontier.push_back(url);
    }

    fn page_key(&self, url: &str) -> String {
        self.normalizer.normalize(url.to_string())
    }
}

fn is_anchor(raw: &RawLink) -> bool {
    if raw.tag == "a" {
        return true;
    }
    debug!(tag = %raw.tag, href = %raw.href, "pager selector matched a non-anchor element");
    false
}

// Resolves a possibly-relative link against the page it was found on
fn resolve(base: &Url, href: &str) -> Option<String> {
    match base.join(href) {
        Ok(url) => Some(url.to_string()),
        Err(err) => {
            warn!(href, base = %base, error = %err, "could not resolve link");
            None
        }
    }
}
