//! Completion monitor
//!
//! The monitor watches the dedup stage's published snapshots and raises the
//! crawl's cancellation token exactly once, when the crawl is finished.
//!
//! Two strategies are available:
//! - `exact`: finish as soon as every discovered URL has been fetched and
//!   its links merged back, with no batch in flight
//! - `stability`: finish after several consecutive polls observe
//!   `fetched == total` with no growth, pausing for a grace period after
//!   each stable poll

use crate::config::{CompletionMode, CrawlerConfig};
use crate::state::VisitedSnapshot;
use std::fmt;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Why a crawl stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionReason {
    /// No outstanding work remained
    Quiescent,
    /// Consecutive polls saw no growth
    Stable,
    /// Cancelled from outside (e.g. Ctrl-C)
    Cancelled,
}

impl fmt::Display for CompletionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quiescent => write!(f, "all work drained"),
            Self::Stable => write!(f, "visited set stable"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// What a single stability poll observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// Some discovered URLs have not been fetched yet
    Busy,
    /// Everything is fetched, but the counts moved since the last poll
    Settling,
    /// Everything is fetched and nothing changed since the last poll
    Stable,
}

/// The polling heuristic behind `stability` completion
///
/// A poll with unfetched URLs resets the streak. A poll where
/// `fetched == total` and both counts equal the previous poll's extends it.
/// The crawl is complete once the streak reaches the threshold.
#[derive(Debug, Clone)]
pub struct StabilityDetector {
    threshold: u32,
    streak: u32,
    last_fetched: usize,
    last_total: usize,
}

impl StabilityDetector {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            streak: 0,
            last_fetched: 0,
            last_total: 0,
        }
    }

    pub fn observe(&mut self, snapshot: &VisitedSnapshot) -> Observation {
        let observation = if !snapshot.all_fetched() {
            self.streak = 0;
            Observation::Busy
        } else if snapshot.total > 0
            && snapshot.fetched == self.last_fetched
            && snapshot.total == self.last_total
        {
            self.streak += 1;
            Observation::Stable
        } else {
            Observation::Settling
        };

        self.last_fetched = snapshot.fetched;
        self.last_total = snapshot.total;
        observation
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn is_complete(&self) -> bool {
        self.streak >= self.threshold
    }
}

/// Watches crawl progress and cancels the crawl when it is done
pub struct Monitor {
    mode: CompletionMode,
    poll_interval: Duration,
    grace_period: Duration,
    detector: StabilityDetector,
    snapshots: watch::Receiver<VisitedSnapshot>,
    cancel: CancellationToken,
    last_logged: Option<VisitedSnapshot>,
}

impl Monitor {
    pub fn new(
        config: &CrawlerConfig,
        snapshots: watch::Receiver<VisitedSnapshot>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            mode: config.completion,
            poll_interval: config.poll_interval(),
            grace_period: config.grace_period(),
            detector: StabilityDetector::new(config.stability_threshold),
            snapshots,
            cancel,
            last_logged: None,
        }
    }

    /// Runs until the crawl is finished, then raises cancellation
    pub async fn run(mut self) -> CompletionReason {
        let reason = match self.mode {
            CompletionMode::Exact => self.wait_for_quiescence().await,
            CompletionMode::Stability => self.wait_for_stability().await,
        };

        let snapshot = *self.snapshots.borrow();
        tracing::info!(
            "Crawl finished ({}): {} discovered, {} fetched",
            reason,
            snapshot.total,
            snapshot.fetched
        );

        self.cancel.cancel();
        reason
    }

    async fn wait_for_quiescence(&mut self) -> CompletionReason {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            if self.snapshots.borrow_and_update().is_quiescent() {
                return CompletionReason::Quiescent;
            }

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return CompletionReason::Cancelled,
                changed = self.snapshots.changed() => {
                    if changed.is_err() {
                        // The dedup stage only stops once cancellation is raised
                        return CompletionReason::Cancelled;
                    }
                }
                _ = ticker.tick() => self.log_progress(),
            }
        }
    }

    async fn wait_for_stability(&mut self) -> CompletionReason {
        loop {
            if !self.pause(self.poll_interval).await {
                return CompletionReason::Cancelled;
            }

            let snapshot = *self.snapshots.borrow();
            if self.detector.observe(&snapshot) == Observation::Stable {
                tracing::debug!(
                    "No growth for {} consecutive polls",
                    self.detector.streak()
                );
                if !self.pause(self.grace_period).await {
                    return CompletionReason::Cancelled;
                }
            }

            if self.detector.is_complete() {
                return CompletionReason::Stable;
            }

            self.log_progress();
        }
    }

    /// Sleeps unless cancelled first; returns false on cancellation
    async fn pause(&self, duration: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }

    fn log_progress(&mut self) {
        let snapshot = *self.snapshots.borrow();
        if self.last_logged == Some(snapshot) {
            return;
        }

        tracing::info!(
            "Progress: {} discovered, {} fetched, {} in flight",
            snapshot.total,
            snapshot.fetched,
            snapshot.outstanding
        );
        self.last_logged = Some(snapshot);
    }
}
