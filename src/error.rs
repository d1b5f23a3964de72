// src/error.rs
// =============================================================================
// Typed errors for the url_pager library.
//
// The binary uses anyhow for convenience, but the library reports every
// failure through one enum so callers can match on the kind:
// - Structural / Sequencing: the caller handed the diff engine inconsistent data
// - Ambiguous: the recognizer refused to guess a page field
// - Status / Transport: the crawl loop could not fetch a page
// =============================================================================

use thiserror::Error;

use crate::urldiff::FieldKey;

/// Errors produced by the diff engine, the recognizer and the crawl loop.
#[derive(Debug, Error)]
pub enum PagerError {
    /// Input to the diff engine has the wrong shape
    #[error("structural error: {0}")]
    Structural(String),

    /// Reconstructed path indices are not a contiguous 0-based run
    #[error("path should be sequential but there is a gap at index {index} (expected {expected})")]
    Sequencing { index: usize, expected: usize },

    /// Zero or several fields qualified as the page field
    #[error("no exact page field could be recognized (candidates: {})", format_candidates(.candidates))]
    Ambiguous { candidates: Vec<FieldKey> },

    /// A computation reached a state its own rules exclude
    #[error("internal invariant violated: {0}")]
    Invariant(String),

    /// A page answered with a non-success status
    #[error("HTTP status {status} on url '{url}'")]
    Status { url: String, status: u16 },

    /// The fetch collaborator failed before a status was available
    #[error("failed to fetch '{url}': {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The HTTP client could not be configured
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// A URL could not be used as a base for link resolution
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// A CSS selector did not parse
    #[error("invalid selector '{selector}': {reason}")]
    Selector { selector: String, reason: String },
}

/// Convenience alias used throughout the library
pub type Result<T> = std::result::Result<T, PagerError>;

fn format_candidates(candidates: &[FieldKey]) -> String {
    if candidates.is_empty() {
        return "none".to_string();
    }
    candidates
        .iter()
        .map(|key| key.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
