//! URL handling module for linkcrawl
//!
//! This module turns raw `href` values into canonical, in-domain URLs and
//! holds the seed domain that defines the crawl boundary.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{authority_host, extract_domain, is_loopback_host};
pub use normalize::{normalize_href, CanonicalUrl, SeedDomain};
