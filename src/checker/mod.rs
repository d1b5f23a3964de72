// src/checker/mod.rs
// =============================================================================
// This module contains all link checking logic.
//
// Submodules:
// - http: Makes HTTP requests to check if links are alive
// - filter: Chooses which discovered links to check
//
// check_crawl ties the checker to the crawl loop: every page's links are
// checked before the next page is fetched.
// =============================================================================

mod filter;
mod http;

pub use filter::{is_checkable_link, is_local, LinkKind};
pub use http::{classify_status, LinkCheckResult, LinkChecker, LinkStatus, DEFAULT_CONCURRENCY};

use tracing::info;

use crate::crawl::{Crawler, Fetch};
use crate::error::Result;

/// Crawls every page and checks the links of the requested kind
///
/// Crawl errors (including a non-2xx page) abort the whole run.
pub async fn check_crawl<F: Fetch>(
    crawler: &mut Crawler<F>,
    checker: &mut LinkChecker,
    kind: LinkKind,
) -> Result<Vec<LinkCheckResult>> {
    let mut results = Vec::new();

    while let Some(links) = crawler.next_batch().await? {
        let selected: Vec<_> = links
            .into_iter()
            .filter(|link| is_checkable_link(&link.url) && kind.accepts(link))
            .collect();

        let page = crawler.current_page_url().unwrap_or("unknown page").to_string();
        info!(page = %page, links = selected.len(), "checking links");

        results.extend(checker.check_batch(selected).await);
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CrawlConfig;
    use crate::crawl::{CssSelector, FetchedPage, PageSource};
    use async_trait::async_trait;

    struct OnePage;

    #[async_trait]
    impl Fetch for OnePage {
        async fn fetch(&self, _url: &str) -> Result<FetchedPage> {
            Ok(FetchedPage {
                status: 200,
                body: r#"<a href="mailto:me@example.com">mail</a>
                         <a href="http://127.0.0.1:9/local">local</a>
                         <img src="http://127.0.0.1:9/pic.png">"#
                    .to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_check_crawl_filters_links() {
        let links = Box::new(CssSelector::new("a[href], img[src]").unwrap());
        let mut crawler = Crawler::new("http://127.0.0.1:9/", OnePage, links).with_pages(PageSource::None);
        let mut checker = LinkChecker::new(&CrawlConfig::default()).unwrap();

        let results = check_crawl(&mut crawler, &mut checker, LinkKind::LocalA).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].url, "http://127.0.0.1:9/local");
        assert_eq!(results[0].page_url, "http://127.0.0.1:9/");
    }
}
