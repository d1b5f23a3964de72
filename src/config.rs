// src/config.rs
// =============================================================================
// Crawl configuration.
//
// Plain data passed to the fetcher and the crawler at construction time.
// The CLI fills it from its flags; library users build it directly, usually
// starting from CrawlConfig::default().
// =============================================================================

use std::time::Duration;

/// Browser-like user agent; some sites refuse obvious bots
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:78.0) Gecko/20100101 Firefox/78.0";

/// Selects every link on a page
pub const DEFAULT_LINK_SELECTOR: &str = "a[href]";

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub user_agent: String,
    /// Per-request timeout for the fetch collaborator
    pub timeout: Duration,
    /// Retry once without certificate verification when TLS validation fails
    pub allow_self_signed: bool,
    /// CSS selector for the links yielded from every page
    pub link_selector: String,
    /// CSS selector for the pager's next-page links, None = no pager
    pub pager_selector: Option<String>,
    /// Query parameters kept when normalizing page URLs, empty = keep all
    pub keep_query: Vec<String>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        CrawlConfig {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(10),
            allow_self_signed: true,
            link_selector: DEFAULT_LINK_SELECTOR.to_string(),
            pager_selector: None,
            keep_query: Vec::new(),
        }
    }
}
