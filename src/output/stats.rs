//! Statistics gathered from the record stream
//!
//! This module counts what the writer saw and prints the end-of-run summary.

use crate::crawler::CrawlReport;
use crate::output::OutputRecord;
use std::collections::{BTreeMap, HashSet};

/// Crawl statistics summary
#[derive(Debug, Clone, Default)]
pub struct CrawlStatistics {
    /// Number of data records (links seen)
    pub data_records: u64,

    /// Number of error records
    pub error_records: u64,

    /// Pages that produced at least one data record
    pub source_pages: HashSet<String>,

    /// Data records keyed by the HTTP status of their source page
    pub links_by_status: BTreeMap<u16, u64>,
}

impl CrawlStatistics {
    /// Accounts for one record
    pub fn record(&mut self, record: &OutputRecord) {
        match record {
            OutputRecord::Data {
                status_code,
                source_url,
                ..
            } => {
                self.data_records += 1;
                *self.links_by_status.entry(*status_code).or_insert(0) += 1;
                self.source_pages.insert(source_url.clone());
            }
            OutputRecord::Error { .. } => self.error_records += 1,
        }
    }

    pub fn total_records(&self) -> u64 {
        self.data_records + self.error_records
    }
}

/// Prints statistics to stderr in a formatted manner
///
/// Stdout carries the record stream, so the summary goes to stderr.
pub fn print_statistics(stats: &CrawlStatistics, report: &CrawlReport) {
    eprintln!("=== Crawl Statistics ===\n");

    eprintln!("Overview:");
    eprintln!("  Started: {}", report.started_at.to_rfc3339());
    eprintln!("  Elapsed: {:.2}s", report.elapsed.as_secs_f64());
    eprintln!("  Completion: {}", report.completion);
    eprintln!("  URLs discovered: {}", report.discovered);
    eprintln!("  URLs fetched: {}", report.fetched);
    eprintln!();

    eprintln!("Records:");
    eprintln!("  Links seen: {}", stats.data_records);
    eprintln!("  Errors: {}", stats.error_records);
    eprintln!("  Pages with links: {}", stats.source_pages.len());
    eprintln!();

    if !stats.links_by_status.is_empty() {
        eprintln!("Links by Status:");
        for (status, count) in &stats.links_by_status {
            let percentage = if stats.data_records > 0 {
                (*count as f64 / stats.data_records as f64) * 100.0
            } else {
                0.0
            };
            eprintln!("  {}: {} ({:.1}%)", status, count, percentage);
        }
        eprintln!();
    }
}
