//! Linkcrawl: a single-domain link crawler
//!
//! This crate crawls one web domain starting from a seed URL. It fetches pages,
//! extracts same-domain hyperlinks, and follows newly discovered links until no
//! new work appears, emitting a stream of `(status, source, link)` records.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Failed to fetch {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Timed out fetching {url} after {attempt} retries")]
    Timeout { url: String, attempt: u32 },

    #[error("Gave up on {url} after {attempts} attempts")]
    RetriesExhausted { url: String, attempts: u32 },

    #[error("{status},{url},Invalid Content Type: {content_type}")]
    ContentType {
        status: u16,
        url: String,
        content_type: String,
    },

    #[error("{status},{url},Error reading response body: {message}")]
    Body {
        status: u16,
        url: String,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Task failed: {0}")]
    TaskJoin(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CompletionReason, CrawlReport, Frontier};
pub use output::OutputRecord;
pub use state::{FetchState, VisitedSet};
pub use crate::url::{normalize_href, CanonicalUrl, SeedDomain};
