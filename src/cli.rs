// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Subcommands:
// - diff: compare two URLs field by field
// - recognize: find the page field of a sequence of page URLs
// - links: crawl a paginated listing and print the discovered links
// - check: crawl a paginated listing and check every discovered link
// =============================================================================

use clap::{Args, Parser, Subcommand};
use std::time::Duration;

use url_pager::checker::LinkKind;
use url_pager::config::{CrawlConfig, DEFAULT_LINK_SELECTOR, DEFAULT_USER_AGENT};

#[derive(Parser, Debug)]
#[command(
    name = "url-pager",
    version = "0.1.0",
    about = "Diff URLs, recognize pagination and crawl paginated listings",
    long_about = "url-pager compares URLs structurally, works out which path segment or query \
                  parameter carries the page number, and walks a site's pager collecting links."
)]
pub struct Cli {
    /// Log debug output to stderr (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the structural difference between two URLs
    ///
    /// Example: url-pager diff "https://h/list?page=1" "https://h/list?page=2"
    Diff {
        /// The current URL
        current: String,

        /// The URL to compare against
        other: String,

        /// Output results in JSON format instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Recognize which field of a sequence of page URLs is the page number
    ///
    /// Example: url-pager recognize https://h/blog https://h/blog?page=2 --page 5
    Recognize {
        /// Consecutive page URLs (at least two)
        #[arg(required = true, num_args = 2..)]
        urls: Vec<String>,

        /// Also print the URL of this page number
        #[arg(long)]
        page: Option<i64>,

        /// Output results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Crawl a paginated listing and print every discovered link
    ///
    /// Example: url-pager links https://blog.lan/ --pager "nav.pagination a"
    Links {
        #[command(flatten)]
        crawl: CrawlArgs,

        /// Stop after this many links
        #[arg(long)]
        limit: Option<usize>,

        /// Output one JSON object per line
        #[arg(long)]
        json: bool,
    },

    /// Crawl a paginated listing and check every discovered link
    ///
    /// Example: url-pager check https://blog.lan/ --pager "nav a" --only external
    Check {
        #[command(flatten)]
        crawl: CrawlArgs,

        /// Which links to check
        #[arg(long, value_enum, default_value_t = LinkKind::All)]
        only: LinkKind,

        /// Output results in JSON format instead of a table
        #[arg(long)]
        json: bool,
    },
}

/// Options shared by the crawling commands
#[derive(Args, Debug)]
pub struct CrawlArgs {
    /// First page of the listing
    pub start_url: String,

    /// CSS selector for the links collected on every page
    #[arg(long = "links", default_value = DEFAULT_LINK_SELECTOR)]
    pub link_selector: String,

    /// CSS selector for the pager's links to further pages
    #[arg(long = "pager")]
    pub pager_selector: Option<String>,

    /// Fixed list of further pages (replaces --pager)
    #[arg(long = "pages", num_args = 1..)]
    pub pages: Vec<String>,

    /// Keep only these query parameters when comparing page URLs
    #[arg(long = "keep-query", num_args = 1..)]
    pub keep_query: Vec<String>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,

    /// Fail instead of retrying when a certificate cannot be verified
    #[arg(long)]
    pub strict_tls: bool,

    /// User agent sent with every request
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,
}

impl CrawlArgs {
    pub fn config(&self) -> CrawlConfig {
        CrawlConfig {
            user_agent: self.user_agent.clone(),
            timeout: Duration::from_secs(self.timeout),
            allow_self_signed: !self.strict_tls,
            link_selector: self.link_selector.clone(),
            pager_selector: self.pager_selector.clone(),
            keep_query: self.keep_query.clone(),
        }
    }
}
