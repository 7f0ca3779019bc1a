//! Output handler trait and the writer task
//!
//! Handlers render records somewhere (stdout by default). The writer task
//! drains the record channel until every [`OutputSink`](super::OutputSink)
//! has been dropped.

use crate::output::{CrawlStatistics, OutputRecord};
use std::io::Write;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Trait for record destinations
pub trait OutputHandler: Send {
    /// Handles a single record
    fn handle(&mut self, record: &OutputRecord) -> OutputResult<()>;

    /// Called once after the last record
    fn finish(&mut self) -> OutputResult<()> {
        Ok(())
    }
}

/// Writes one line per record
pub struct RecordWriter<W: Write> {
    out: W,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl RecordWriter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> OutputHandler for RecordWriter<W> {
    fn handle(&mut self, record: &OutputRecord) -> OutputResult<()> {
        writeln!(self.out, "{}", record)?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Spawns the task that drains the record channel into a handler
///
/// The task ends once every sender is gone and returns the statistics
/// gathered along the way together with the handler.
pub fn spawn_writer<H>(
    mut records: mpsc::Receiver<OutputRecord>,
    mut handler: H,
) -> JoinHandle<OutputResult<(H, CrawlStatistics)>>
where
    H: OutputHandler + 'static,
{
    tokio::spawn(async move {
        let mut stats = CrawlStatistics::default();

        while let Some(record) = records.recv().await {
            stats.record(&record);
            if let Err(e) = handler.handle(&record) {
                tracing::error!("Failed to write record: {}", e);
                return Err(e);
            }
        }

        handler.finish()?;
        Ok((handler, stats))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_writer_lines() {
        let mut writer = RecordWriter::new(Vec::new());
        writer
            .handle(&OutputRecord::data(200, "https://example.com", "/a"))
            .unwrap();
        writer.handle(&OutputRecord::error("boom")).unwrap();
        writer.finish().unwrap();

        let text = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(text, "data,200,https://example.com,/a\nerror,boom\n");
    }

    #[tokio::test]
    async fn test_spawn_writer_drains_until_senders_drop() {
        let (tx, rx) = mpsc::channel(8);
        let handle = spawn_writer(rx, RecordWriter::new(Vec::new()));

        tx.send(OutputRecord::data(200, "https://example.com", "/a"))
            .await
            .unwrap();
        tx.send(OutputRecord::data(200, "https://example.com", "/b"))
            .await
            .unwrap();
        tx.send(OutputRecord::error("boom")).await.unwrap();
        drop(tx);

        let (writer, stats) = handle.await.unwrap().unwrap();
        assert_eq!(stats.data_records, 2);
        assert_eq!(stats.error_records, 1);

        let text = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(text.lines().count(), 3);
    }
}
