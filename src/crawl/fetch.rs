// src/crawl/fetch.rs
// =============================================================================
// The fetch collaborator: turns a URL into (status, body).
//
// The crawl loop only depends on the Fetch trait, so tests can plug in an
// in-memory site. HttpFetcher is the real implementation on top of reqwest.
//
// Self-signed certificates:
// - The first request always verifies certificates
// - If verification fails and the config allows it, the request is retried
//   once with a client that accepts invalid certificates, and a warning is
//   logged
// =============================================================================

use async_trait::async_trait;
use reqwest::{header, Client};
use tracing::{debug, warn};

use crate::config::CrawlConfig;
use crate::error::{PagerError, Result};

/// A fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    pub body: String,
}

impl FetchedPage {
    /// 2xx status codes
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Anything that can fetch a page for the crawl loop
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Returns the page's status and body; errors only when no status exists
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;
}

/// Shared fetchers, so a caller can keep a handle on the one the crawler uses
#[async_trait]
impl<T: Fetch + ?Sized> Fetch for std::sync::Arc<T> {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        (**self).fetch(url).await
    }
}

/// reqwest-backed fetcher
pub struct HttpFetcher {
    client: Client,
    // Only built when the config allows the self-signed fallback
    insecure: Option<Client>,
}

impl HttpFetcher {
    pub fn new(config: &CrawlConfig) -> Result<Self> {
        let client = build_client(config, false)?;
        let insecure = if config.allow_self_signed {
            Some(build_client(config, true)?)
        } else {
            None
        };
        Ok(HttpFetcher { client, insecure })
    }

    async fn send(client: &Client, url: &str) -> std::result::Result<FetchedPage, reqwest::Error> {
        let response = client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(FetchedPage { status, body })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        debug!(url, "fetching page");
        match Self::send(&self.client, url).await {
            Ok(page) => Ok(page),
            Err(err) if is_certificate_error(&err) => match &self.insecure {
                Some(insecure) => {
                    warn!(url, "certificate is not trusted, retrying without verification");
                    Self::send(insecure, url).await.map_err(|err| transport(url, err))
                }
                None => Err(transport(url, err)),
            },
            Err(err) => Err(transport(url, err)),
        }
    }
}

fn build_client(config: &CrawlConfig, accept_invalid_certs: bool) -> Result<Client> {
    let mut headers = header::HeaderMap::new();
    if let Ok(agent) = header::HeaderValue::from_str(&config.user_agent) {
        headers.insert(header::USER_AGENT, agent);
    }

    Client::builder()
        .timeout(config.timeout)
        .default_headers(headers)
        .danger_accept_invalid_certs(accept_invalid_certs)
        .build()
        .map_err(PagerError::Client)
}

fn transport(url: &str, err: reqwest::Error) -> PagerError {
    PagerError::Transport {
        url: url.to_string(),
        source: Box::new(err),
    }
}

// reqwest wraps the TLS failure a few levels deep, so walk the whole chain
pub(crate) fn is_certificate_error(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(err) = current {
        let text = err.to_string().to_lowercase();
        if text.contains("certificate") || text.contains("self signed") || text.contains("self-signed") {
            return true;
        }
        current = err.source();
    }
    false
}
