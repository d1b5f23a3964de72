// src/checker/http.rs
// =============================================================================
// This module checks if URLs are alive by making HTTP requests.
//
// Key functionality:
// - Makes HTTP HEAD requests (lightweight, no body download)
// - Falls back to GET when the server answers 405 Method Not Allowed
// - Remembers every checked URL, so a link repeated across pages is only
//   requested once
// - Checks one page's links concurrently, keeping their order
// =============================================================================

use futures::stream::{self, StreamExt};
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::config::CrawlConfig;
use crate::crawl::DiscoveredLink;
use crate::error::{PagerError, Result};

/// How many links of a page are checked at once
pub const DEFAULT_CONCURRENCY: usize = 16;

/// Represents the status of a link after checking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "target", rename_all = "snake_case")]
pub enum LinkStatus {
    /// Link is working (2xx)
    Ok,
    /// Link redirects to another URL (301, 302, etc.)
    Redirect(String),
    /// Link is broken (404, 410)
    Broken,
    /// Request timed out
    Timeout,
    /// SSL/TLS certificate error
    SslError,
    /// Too many redirects (redirect loop)
    TooManyRedirects,
    /// Could not resolve hostname
    DnsError,
    /// Other error
    Error,
}

/// Result of checking a single link
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkCheckResult {
    pub url: String,
    /// Page the link was found on
    pub page_url: String,
    #[serde(flatten)]
    pub status: LinkStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// True when the status was reused from an earlier check
    pub cached: bool,
}

impl LinkCheckResult {
    /// Ok and Redirect count as working
    pub fn is_ok(&self) -> bool {
        matches!(self.status, LinkStatus::Ok | LinkStatus::Redirect(_))
    }
}

pub struct LinkChecker {
    client: Client,
    concurrency: usize,
    // url -> (status, message) of every link checked so far
    checked: HashMap<String, (LinkStatus, Option<String>)>,
}

impl LinkChecker {
    pub fn new(config: &CrawlConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        if let Ok(agent) = header::HeaderValue::from_str(&config.user_agent) {
            headers.insert(header::USER_AGENT, agent);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(PagerError::Client)?;

        Ok(LinkChecker {
            client,
            concurrency: DEFAULT_CONCURRENCY,
            checked: HashMap::new(),
        })
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Number of distinct URLs checked so far
    pub fn checked_count(&self) -> usize {
        self.checked.len()
    }

    /// Checks one page's links, returning results in the links' order
    ///
    /// URLs seen before, in this batch or an earlier one, are not requested
    /// again and come back with `cached` set.
    pub async fn check_batch(&mut self, links: Vec<DiscoveredLink>) -> Vec<LinkCheckResult> {
        let mut fresh: Vec<String> = Vec::new();
        for link in &links {
            if !self.checked.contains_key(&link.url) && !fresh.contains(&link.url) {
                fresh.push(link.url.clone());
            }
        }

        let client = self.client.clone();
        let outcomes: Vec<(String, (LinkStatus, Option<String>))> = stream::iter(fresh)
            .map(|url| {
                let client = client.clone();
                async move {
                    let outcome = check_single_link(&client, &url).await;
                    (url, outcome)
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let fresh: HashSet<String> = outcomes.iter().map(|(url, _)| url.clone()).collect();
        self.checked.extend(outcomes);

        let mut reported: HashSet<String> = HashSet::new();
        links
            .into_iter()
            .map(|link| {
                let (status, message) = self
                    .checked
                    .get(&link.url)
                    .cloned()
                    .unwrap_or((LinkStatus::Error, Some("not checked".to_string())));
                let cached = !fresh.contains(&link.url) || !reported.insert(link.url.clone());
                LinkCheckResult {
                    url: link.url,
                    page_url: link.page_url,
                    status,
                    message,
                    cached,
                }
            })
            .collect()
    }
}

// HEAD first; some servers refuse it, then GET
async fn check_single_link(client: &Client, url: &str) -> (LinkStatus, Option<String>) {
    let result = match client.head(url).send().await {
        Ok(response) if response.status() == StatusCode::METHOD_NOT_ALLOWED => {
            debug!(url, "HEAD not allowed, retrying with GET");
            client.get(url).send().await
        }
        other => other,
    };

    match result {
        Ok(response) => {
            let location = response
                .headers()
                .get(header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            classify_status(response.status(), location.as_deref())
        }
        Err(e) => categorize_error(e),
    }
}

/// Maps an HTTP status to a link status
///
/// - 200-299: Success
/// - 300-399: Redirect
/// - 404, 410: Broken
/// - anything else: Error
pub fn classify_status(status_code: StatusCode, location: Option<&str>) -> (LinkStatus, Option<String>) {
    let code = status_code.as_u16();
    if status_code.is_success() {
        (LinkStatus::Ok, Some(format!("HTTP {}", code)))
    } else if status_code.is_redirection() {
        let target = location.unwrap_or("unknown").to_string();
        let message = format!("HTTP {} -> {}", code, target);
        (LinkStatus::Redirect(target), Some(message))
    } else if matches!(status_code, StatusCode::NOT_FOUND | StatusCode::GONE) {
        (LinkStatus::Broken, Some(format!("HTTP {}", code)))
    } else {
        (LinkStatus::Error, Some(format!("HTTP {}", code)))
    }
}

// Categorizes different error types from reqwest
fn categorize_error(error: reqwest::Error) -> (LinkStatus, Option<String>) {
    let error_string = error.to_string();

    let (status, message) = if error.is_timeout() {
        (LinkStatus::Timeout, "Request timed out".to_string())
    } else if error.is_redirect() {
        (LinkStatus::TooManyRedirects, "Too many redirects".to_string())
    } else if crate::crawl::is_certificate_error(&error) {
        (LinkStatus::SslError, "SSL certificate error".to_string())
    } else if error.is_connect() {
        // Connection errors often mean DNS issues or host unreachable
        if format!("{:?}", error).to_lowercase().contains("dns") {
            (LinkStatus::DnsError, "Could not resolve hostname".to_string())
        } else {
            (LinkStatus::Error, "Connection failed".to_string())
        }
    } else {
        (LinkStatus::Error, error_string)
    };

    (status, Some(message))
}
