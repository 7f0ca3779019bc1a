//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic
//! - HTML parsing and link extraction
//! - Page processing into output records and new work
//! - The concurrent frontier and its completion monitor

mod fetcher;
mod frontier;
mod monitor;
mod parser;
mod processor;

pub use fetcher::{build_http_client, FetchOutcome, FetchResult, Fetcher, PendingFetch, RetryPolicy};
pub use frontier::{CrawlReport, Frontier};
pub use monitor::{CompletionReason, Monitor, Observation, StabilityDetector};
pub use parser::{extract_hrefs, extract_links, filtered_links, parse_html};
pub use processor::{is_accepted_content_type, PageProcessor, WorkBatch};

use crate::config::Config;
use crate::output::OutputSink;
use crate::url::SeedDomain;
use crate::CrawlError;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP client
/// 2. Seed the frontier with the seed URL
/// 3. Fetch pages and follow same-domain links
/// 4. Stop once the monitor declares the crawl finished
///
/// Records are published to `output`; the caller owns the receiving end.
pub async fn crawl(
    config: &Config,
    seed: SeedDomain,
    output: OutputSink,
    cancel: CancellationToken,
) -> Result<CrawlReport, CrawlError> {
    Frontier::new(config, seed, output, cancel)?.run().await
}

/// Takes the next item from a receiver shared by a worker pool
///
/// Returns `None` when cancelled or when the channel is closed.
pub(crate) async fn recv_shared<T>(
    rx: &Mutex<mpsc::Receiver<T>>,
    cancel: &CancellationToken,
) -> Option<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        item = async { rx.lock().await.recv().await } => item,
    }
}
