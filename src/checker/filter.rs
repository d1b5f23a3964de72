// src/checker/filter.rs
// =============================================================================
// Decides which discovered links get checked.
//
// Two independent criteria, combined by LinkKind:
// - element: <a> links, <img> sources, or both
// - locality: links on the same scheme+host as the page they were found on
//   (local), links elsewhere (external), or both
// =============================================================================

use clap::ValueEnum;

use crate::crawl::DiscoveredLink;
use crate::urldiff::UrlParts;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LinkKind {
    #[default]
    All,
    Local,
    External,
    Img,
    LocalImg,
    ExternalImg,
    A,
    LocalA,
    ExternalA,
}

impl LinkKind {
    pub fn accepts(&self, link: &DiscoveredLink) -> bool {
        let tag_ok = match self {
            LinkKind::Img | LinkKind::LocalImg | LinkKind::ExternalImg => link.tag == "img",
            LinkKind::A | LinkKind::LocalA | LinkKind::ExternalA => link.tag == "a",
            LinkKind::All | LinkKind::Local | LinkKind::External => true,
        };
        if !tag_ok {
            return false;
        }

        match self {
            LinkKind::Local | LinkKind::LocalImg | LinkKind::LocalA => is_local(link),
            LinkKind::External | LinkKind::ExternalImg | LinkKind::ExternalA => !is_local(link),
            _ => true,
        }
    }
}

/// Same scheme and authority as the page the link was found on
pub fn is_local(link: &DiscoveredLink) -> bool {
    let target = UrlParts::parse(&link.url);
    let page = UrlParts::parse(&link.page_url);
    target.scheme.eq_ignore_ascii_case(&page.scheme)
        && match (&target.authority, &page.authority) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            (None, None) => true,
            _ => false,
        }
}

/// Only http(s) links can be checked; mailto:, tel:, javascript: etc. are skipped
pub fn is_checkable_link(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
