//! Crawl frontier: the concurrent pipeline that drives a crawl
//!
//! # Pipeline
//!
//! ```text
//!   seed ──► work queue ──► dedup stage ──► unseen queue ──► crawl workers
//!               ▲                                              │    │
//!               │                                       submit │    │ outcome
//!               │                                              ▼    │
//!               │                                       fetch workers
//!               └──────────── WorkBatch (page processor) ◄─────────┘
//! ```
//!
//! The dedup stage is the only task that touches the visited set. It merges
//! every batch arriving on the work queue, forwards newly inserted URLs to
//! the unseen queue, and publishes a [`VisitedSnapshot`] after every change.
//! The [`Monitor`] watches those snapshots and raises cancellation once the
//! crawl is finished; every other stage stops when it sees that signal.

use crate::config::{Config, CrawlerConfig};
use crate::crawler::fetcher::{build_http_client, Fetcher};
use crate::crawler::monitor::{CompletionReason, Monitor};
use crate::crawler::processor::{PageProcessor, WorkBatch};
use crate::crawler::recv_shared;
use crate::output::OutputSink;
use crate::state::{VisitedSet, VisitedSnapshot};
use crate::url::{CanonicalUrl, SeedDomain};
use crate::CrawlError;
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Summary of a finished crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// URLs in the visited set when the crawl stopped
    pub discovered: usize,
    /// URLs that were dispatched to the fetcher
    pub fetched: usize,
    /// Why the crawl stopped
    pub completion: CompletionReason,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
}

/// Messages accepted by the dedup stage
#[derive(Debug)]
enum DedupCommand {
    /// Links found on `origin`; the seed batch has no origin
    Discovered {
        origin: Option<CanonicalUrl>,
        batch: WorkBatch,
    },
    /// A crawl worker is about to fetch this URL
    Fetching(CanonicalUrl),
}

/// Owns the visited set and feeds unseen URLs to the crawl workers
struct DedupStage {
    visited: VisitedSet,
    /// Newly inserted URLs not yet handed to the unseen queue; never
    /// larger than the visited set, since each URL enters it once
    ready: VecDeque<CanonicalUrl>,
    /// Inserted URLs whose batch has not been merged yet
    outstanding: usize,
    commands: mpsc::Receiver<DedupCommand>,
    unseen: mpsc::Sender<CanonicalUrl>,
    snapshots: watch::Sender<VisitedSnapshot>,
    cancel: CancellationToken,
}

impl DedupStage {
    async fn run(mut self) -> VisitedSet {
        loop {
            // The permit borrows `unseen`, so commands are applied after the select
            let command = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                command = self.commands.recv() => match command {
                    Some(command) => command,
                    None => break,
                },
                permit = self.unseen.reserve(), if !self.ready.is_empty() => match permit {
                    Ok(permit) => {
                        if let Some(url) = self.ready.pop_front() {
                            permit.send(url);
                        }
                        continue;
                    }
                    Err(_) => break,
                },
            };

            self.apply(command);
        }

        tracing::debug!(
            "Dedup stage stopped with {} URLs ({} never fetched, {} never handed out)",
            self.visited.len(),
            self.visited.discovered_count(),
            self.ready.len()
        );
        self.visited
    }

    fn apply(&mut self, command: DedupCommand) {
        match command {
            DedupCommand::Discovered { origin, batch } => {
                for url in batch {
                    if self.visited.insert_if_absent(url.clone()) {
                        tracing::trace!("Discovered {}", url);
                        self.outstanding += 1;
                        self.ready.push_back(url);
                    }
                }
                // Counted after the batch so the total never dips to zero early
                if origin.is_some() {
                    self.outstanding = self.outstanding.saturating_sub(1);
                }
            }
            DedupCommand::Fetching(url) => {
                if !self.visited.mark_fetched(&url) {
                    tracing::warn!(
                        "{} was dispatched but is not awaiting fetch (state: {:?})",
                        url,
                        self.visited.state(&url)
                    );
                }
            }
        }

        self.snapshots
            .send_replace(self.visited.snapshot(self.outstanding));
    }
}

/// Pairs unseen URLs with fetches and feeds the results back
struct CrawlWorker {
    id: usize,
    unseen: Arc<Mutex<mpsc::Receiver<CanonicalUrl>>>,
    work: mpsc::Sender<DedupCommand>,
    fetcher: Fetcher,
    processor: Arc<PageProcessor>,
    output: OutputSink,
    cancel: CancellationToken,
}

impl CrawlWorker {
    async fn run(self) {
        let mut crawled = 0usize;
        while let Some(url) = recv_shared(&self.unseen, &self.cancel).await {
            if !self.crawl(url).await {
                break;
            }
            crawled += 1;
        }

        tracing::debug!("Crawl worker {} stopped after {} pages", self.id, crawled);
    }

    /// Handles one URL end to end; returns false once cancelled
    async fn crawl(&self, url: CanonicalUrl) -> bool {
        if !self.send(DedupCommand::Fetching(url.clone())).await {
            return false;
        }

        let Some(pending) = self.fetcher.submit(url.clone()).await else {
            return false;
        };

        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return false,
            outcome = pending.wait() => outcome,
        };

        let batch = match outcome {
            Ok(result) => match self.processor.process(result).await {
                Ok(batch) => batch,
                Err(e) => {
                    tracing::debug!("{}", e);
                    self.output.error(&e).await;
                    WorkBatch::new()
                }
            },
            Err(e) => {
                // Each failed attempt was already reported by the fetcher
                tracing::debug!("{}", e);
                WorkBatch::new()
            }
        };

        self.send(DedupCommand::Discovered {
            origin: Some(url),
            batch,
        })
        .await
    }

    async fn send(&self, command: DedupCommand) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            sent = self.work.send(command) => sent.is_ok(),
        }
    }
}

/// Sends the seed as a one-element batch with no origin
///
/// Raises cancellation if the dedup stage is already gone.
async fn enqueue_seed(
    work: &mpsc::Sender<DedupCommand>,
    seed: &CanonicalUrl,
    cancel: &CancellationToken,
) -> Result<(), CrawlError> {
    let command = DedupCommand::Discovered {
        origin: None,
        batch: vec![seed.clone()],
    };

    if work.send(command).await.is_err() {
        cancel.cancel();
        return Err(CrawlError::TaskJoin(
            "dedup stage exited before seeding".into(),
        ));
    }
    Ok(())
}

/// A configured crawl of one seed domain
///
/// # Example
///
/// ```no_run
/// use linkcrawl::config::Config;
/// use linkcrawl::output::{spawn_writer, OutputSink, RecordWriter};
/// use linkcrawl::{Frontier, SeedDomain};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn run() -> linkcrawl::Result<()> {
/// let config = Config::default();
/// let cancel = CancellationToken::new();
/// let (sink, records) = OutputSink::channel(256, cancel.clone());
/// let writer = spawn_writer(records, RecordWriter::stdout());
///
/// let seed = SeedDomain::parse("https://example.com")?;
/// let report = Frontier::new(&config, seed, sink, cancel)?.run().await?;
/// println!("{} pages fetched", report.fetched);
/// # let _ = writer.await;
/// # Ok(())
/// # }
/// ```
pub struct Frontier {
    config: CrawlerConfig,
    seed: SeedDomain,
    client: Client,
    output: OutputSink,
    cancel: CancellationToken,
}

impl Frontier {
    pub fn new(
        config: &Config,
        seed: SeedDomain,
        output: OutputSink,
        cancel: CancellationToken,
    ) -> Result<Self, CrawlError> {
        let client = build_http_client(&config.user_agent, config.crawler.timeout())?;
        Ok(Self::with_client(
            config.crawler.clone(),
            client,
            seed,
            output,
            cancel,
        ))
    }

    pub fn with_client(
        config: CrawlerConfig,
        client: Client,
        seed: SeedDomain,
        output: OutputSink,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            seed,
            client,
            output,
            cancel,
        }
    }

    pub fn seed(&self) -> &SeedDomain {
        &self.seed
    }

    /// Runs the crawl to completion
    ///
    /// Returns once the monitor has declared the crawl finished (or the
    /// cancellation token was raised from outside) and every task has
    /// stopped. All of this frontier's output sinks are dropped by then.
    pub async fn run(self) -> Result<CrawlReport, CrawlError> {
        let started_at = Utc::now();
        let start = Instant::now();
        let config = &self.config;

        tracing::info!(
            "Starting crawl of {} ({} crawl workers, {} fetch workers, {} completion)",
            self.seed.url(),
            config.crawl_workers,
            config.fetch_workers,
            config.completion
        );

        let (work_tx, work_rx) = mpsc::channel(config.work_queue_capacity);
        let (unseen_tx, unseen_rx) = mpsc::channel(config.unseen_queue_capacity);
        let (snapshot_tx, snapshot_rx) = watch::channel(VisitedSnapshot::default());

        let (fetcher, fetch_handles) = Fetcher::spawn(
            self.client.clone(),
            config,
            self.output.clone(),
            self.cancel.clone(),
        );
        let processor = Arc::new(PageProcessor::new(self.seed.clone(), self.output.clone()));

        let dedup = tokio::spawn(
            DedupStage {
                visited: VisitedSet::new(),
                ready: VecDeque::new(),
                outstanding: 0,
                commands: work_rx,
                unseen: unseen_tx,
                snapshots: snapshot_tx,
                cancel: self.cancel.clone(),
            }
            .run(),
        );

        enqueue_seed(&work_tx, self.seed.url(), &self.cancel).await?;

        let unseen_rx = Arc::new(Mutex::new(unseen_rx));
        let crawl_handles: Vec<JoinHandle<()>> = (0..config.crawl_workers)
            .map(|id| {
                let worker = CrawlWorker {
                    id,
                    unseen: Arc::clone(&unseen_rx),
                    work: work_tx.clone(),
                    fetcher: fetcher.clone(),
                    processor: Arc::clone(&processor),
                    output: self.output.clone(),
                    cancel: self.cancel.clone(),
                };
                tokio::spawn(worker.run())
            })
            .collect();
        drop(work_tx);
        drop(fetcher);
        drop(processor);

        let completion = Monitor::new(config, snapshot_rx, self.cancel.clone())
            .run()
            .await;

        for handle in crawl_handles.into_iter().chain(fetch_handles) {
            if let Err(e) = handle.await {
                tracing::error!("Worker task failed: {}", e);
            }
        }

        let visited = dedup
            .await
            .map_err(|e| CrawlError::TaskJoin(e.to_string()))?;

        Ok(CrawlReport {
            discovered: visited.len(),
            fetched: visited.fetched_count(),
            completion,
            started_at,
            elapsed: start.elapsed(),
        })
    }
}
