//! Configuration module for linkcrawl
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key is optional; a missing file section falls back to defaults.
//!
//! # Example
//!
//! ```no_run
//! use linkcrawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("linkcrawl.toml")).unwrap();
//! println!("Fetch workers: {}", config.crawler.fetch_workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{CompletionMode, Config, CrawlerConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
