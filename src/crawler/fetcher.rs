//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - A fixed pool of fetch workers draining a shared request queue
//! - Per-attempt deadlines and retry with a fixed backoff
//! - Pairing every response with the request that asked for it
//!
//! Every failed attempt is published as an error record. A request that
//! fails all of its attempts resolves to [`CrawlError::RetriesExhausted`].

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::crawler::recv_shared;
use crate::output::OutputSink;
use crate::url::CanonicalUrl;
use crate::CrawlError;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A response whose headers have arrived
///
/// The body has not been read yet; the page processor consumes it.
#[derive(Debug)]
pub struct FetchResult {
    /// The URL that was requested
    pub source_url: CanonicalUrl,
    /// HTTP status code
    pub status_code: u16,
    /// Content-Type header value, empty if absent
    pub content_type: String,
    /// The response, with its body still unread
    pub body: Response,
}

impl FetchResult {
    pub fn from_response(source_url: CanonicalUrl, response: Response) -> Self {
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        Self {
            source_url,
            status_code: response.status().as_u16(),
            content_type,
            body: response,
        }
    }
}

/// Outcome delivered to whoever submitted a fetch
pub type FetchOutcome = Result<FetchResult, CrawlError>;

#[derive(Debug)]
struct FetchRequest {
    url: CanonicalUrl,
    reply: oneshot::Sender<FetchOutcome>,
}

/// Retry and deadline settings for a fetch worker
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub retries: u32,
    /// Deadline for a single attempt
    pub timeout: Duration,
    /// Pause between attempts
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            retries: config.retries,
            timeout: config.timeout(),
            backoff: config.retry_backoff(),
        }
    }

    pub fn attempts(&self) -> u32 {
        self.retries + 1
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Upper bound on a whole request, body included
///
/// # Example
///
/// ```no_run
/// use linkcrawl::config::UserAgentConfig;
/// use linkcrawl::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(5)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Handle for submitting URLs to the fetch worker pool
///
/// Cloning the handle shares the same pool. The pool's workers exit once
/// every handle is dropped or the cancellation token fires.
#[derive(Debug, Clone)]
pub struct Fetcher {
    requests: mpsc::Sender<FetchRequest>,
    cancel: CancellationToken,
}

/// A submitted fetch awaiting its outcome
#[derive(Debug)]
pub struct PendingFetch {
    url: CanonicalUrl,
    reply: oneshot::Receiver<FetchOutcome>,
}

impl PendingFetch {
    pub fn url(&self) -> &CanonicalUrl {
        &self.url
    }

    /// Waits for the worker that took this request
    ///
    /// If that worker stopped without answering (cancellation), this
    /// resolves to an error.
    pub async fn wait(self) -> FetchOutcome {
        match self.reply.await {
            Ok(outcome) => outcome,
            Err(_) => Err(CrawlError::TaskJoin(format!(
                "fetch of {} was abandoned",
                self.url
            ))),
        }
    }
}

impl Fetcher {
    /// Starts `config.fetch_workers` workers sharing one request queue
    pub fn spawn(
        client: Client,
        config: &CrawlerConfig,
        output: OutputSink,
        cancel: CancellationToken,
    ) -> (Self, Vec<JoinHandle<()>>) {
        let (tx, rx) = mpsc::channel(config.fetch_workers.max(1));
        let requests = Arc::new(Mutex::new(rx));
        let policy = RetryPolicy::from_config(config);

        let handles = (0..config.fetch_workers)
            .map(|id| {
                let worker = FetchWorker {
                    id,
                    client: client.clone(),
                    policy,
                    requests: Arc::clone(&requests),
                    output: output.clone(),
                    cancel: cancel.clone(),
                };
                tokio::spawn(worker.run())
            })
            .collect();

        tracing::debug!("Started {} fetch workers", config.fetch_workers);

        (Self { requests: tx, cancel }, handles)
    }

    /// Queues a URL for fetching
    ///
    /// Returns `None` if the crawl was cancelled before the request could
    /// be queued.
    pub async fn submit(&self, url: CanonicalUrl) -> Option<PendingFetch> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let request = FetchRequest {
            url: url.clone(),
            reply: reply_tx,
        };

        let queued = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            sent = self.requests.send(request) => sent.is_ok(),
        };

        queued.then(|| PendingFetch {
            url,
            reply: reply_rx,
        })
    }
}

struct FetchWorker {
    id: usize,
    client: Client,
    policy: RetryPolicy,
    requests: Arc<Mutex<mpsc::Receiver<FetchRequest>>>,
    output: OutputSink,
    cancel: CancellationToken,
}

impl FetchWorker {
    async fn run(self) {
        while let Some(request) = recv_shared(&self.requests, &self.cancel).await {
            let Some(outcome) = self.fetch_with_retries(&request.url).await else {
                break;
            };
            // The submitter may have been cancelled already
            let _ = request.reply.send(outcome);
        }

        tracing::debug!("Fetch worker {} stopped", self.id);
    }

    /// Runs up to `retries + 1` attempts
    ///
    /// Returns `None` only when cancelled mid-request.
    async fn fetch_with_retries(&self, url: &CanonicalUrl) -> Option<FetchOutcome> {
        for attempt in 0..=self.policy.retries {
            let sent = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return None,
                sent = tokio::time::timeout(
                    self.policy.timeout,
                    self.client.get(url.as_str()).send(),
                ) => sent,
            };

            let failure = match sent {
                Ok(Ok(response)) => {
                    tracing::debug!(
                        "Fetched {} ({}) on attempt {}",
                        url,
                        response.status(),
                        attempt + 1
                    );
                    return Some(Ok(FetchResult::from_response(url.clone(), response)));
                }
                Ok(Err(e)) if e.is_timeout() => CrawlError::Timeout {
                    url: url.to_string(),
                    attempt,
                },
                Ok(Err(e)) => CrawlError::Transport {
                    url: url.to_string(),
                    message: e.to_string(),
                },
                Err(_) => CrawlError::Timeout {
                    url: url.to_string(),
                    attempt,
                },
            };

            tracing::warn!(
                "Attempt {}/{} failed: {}",
                attempt + 1,
                self.policy.attempts(),
                failure
            );
            self.output.error(&failure).await;

            if attempt < self.policy.retries {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => return None,
                    _ = tokio::time::sleep(self.policy.backoff) => {}
                }
            }
        }

        Some(Err(CrawlError::RetriesExhausted {
            url: url.to_string(),
            attempts: self.policy.attempts(),
        }))
    }
}
