// src/lib.rs
// =============================================================================
// url_pager: structural URL diffing, pagination field recognition and
// paginated link crawling.
//
// Modules, leaves first:
// - urldiff: URL structural model, four-bucket diff, URL composition
// - recognizer: finds the one field that encodes the page number
// - crawl: FIFO crawl loop over a site's pages
// - checker: checks the links the crawl loop discovers
// =============================================================================

pub mod checker;
pub mod config;
pub mod crawl;
pub mod error;
pub mod recognizer;
pub mod urldiff;

pub use config::CrawlConfig;
pub use error::{PagerError, Result};
pub use recognizer::{recognize, PageField, PageFieldRecord};
pub use urldiff::{build_diff, compose_url, FieldKey, FieldValue, UrlDiff, UrlParts};
