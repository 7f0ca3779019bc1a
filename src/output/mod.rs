//! Output module for the crawl record stream
//!
//! This module handles:
//! - The `OutputRecord` type emitted by fetchers and page processors
//! - A cancellation-aware sink shared by every worker
//! - A writer task that renders records one per line
//! - End-of-run statistics

mod record;
mod sink;
pub mod stats;
mod traits;

pub use record::OutputRecord;
pub use sink::OutputSink;
pub use stats::{print_statistics, CrawlStatistics};
pub use traits::{spawn_writer, OutputError, OutputHandler, OutputResult, RecordWriter};
