use crate::output::OutputRecord;
use std::fmt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Cloneable handle every worker uses to publish records
///
/// Publishing races the crawl's cancellation token: once cancellation is
/// raised a blocked `emit` gives up instead of waiting for buffer space.
#[derive(Debug, Clone)]
pub struct OutputSink {
    tx: mpsc::Sender<OutputRecord>,
    cancel: CancellationToken,
}

impl OutputSink {
    /// Creates a sink and the receiving end of its bounded channel
    pub fn channel(
        capacity: usize,
        cancel: CancellationToken,
    ) -> (Self, mpsc::Receiver<OutputRecord>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx, cancel }, rx)
    }

    /// Publishes a record
    ///
    /// Returns false if the record was dropped because the crawl was
    /// cancelled or the receiver is gone.
    pub async fn emit(&self, record: OutputRecord) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            sent = self.tx.send(record) => sent.is_ok(),
        }
    }

    pub async fn data(&self, status_code: u16, source_url: &str, raw_link: &str) -> bool {
        self.emit(OutputRecord::data(status_code, source_url, raw_link))
            .await
    }

    pub async fn error(&self, detail: impl fmt::Display) -> bool {
        self.emit(OutputRecord::error(detail)).await
    }
}
