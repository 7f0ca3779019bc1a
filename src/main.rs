//! Linkcrawl main entry point
//!
//! This is the command-line interface for the linkcrawl single-domain crawler.
//! Records go to stdout, one per line; logs and statistics go to stderr.

use anyhow::Context;
use clap::Parser;
use linkcrawl::config::{load_config_with_hash, validate, CompletionMode, Config};
use linkcrawl::crawler::crawl;
use linkcrawl::output::{print_statistics, spawn_writer, OutputSink, RecordWriter};
use linkcrawl::SeedDomain;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Linkcrawl: crawl every page of a single domain
///
/// Starting from the seed URL, linkcrawl fetches pages, extracts their
/// hyperlinks and follows the ones on the same host until no new work
/// appears. Every link found is printed as `data,status,source,link`;
/// failures are printed as `error,detail`.
#[derive(Parser, Debug)]
#[command(name = "linkcrawl")]
#[command(version)]
#[command(about = "A single-domain concurrent link crawler", long_about = None)]
struct Cli {
    /// Seed URL; only links on its host are followed
    #[arg(short, long, value_name = "URL")]
    domain: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Number of fetch workers
    #[arg(long, value_name = "N")]
    fetch_workers: Option<usize>,

    /// Number of crawl workers
    #[arg(long, value_name = "N")]
    crawl_workers: Option<usize>,

    /// Retries per URL after the first attempt
    #[arg(long, value_name = "N")]
    retries: Option<u32>,

    /// Deadline for a single request attempt
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// How to decide the crawl is finished (exact or stability)
    #[arg(long, value_name = "MODE")]
    completion: Option<CompletionMode>,

    /// Validate the seed and config and show the effective settings without crawling
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    fn apply_overrides(&self, config: &mut Config) {
        let crawler = &mut config.crawler;
        if let Some(n) = self.fetch_workers {
            crawler.fetch_workers = n;
        }
        if let Some(n) = self.crawl_workers {
            crawler.crawl_workers = n;
        }
        if let Some(n) = self.retries {
            crawler.retries = n;
        }
        if let Some(ms) = self.timeout_ms {
            crawler.timeout_ms = ms;
        }
        if let Some(mode) = self.completion {
            crawler.completion = mode;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    cli.apply_overrides(&mut config);
    validate(&config).context("invalid configuration")?;

    let seed = SeedDomain::parse(&cli.domain)
        .with_context(|| format!("invalid seed URL '{}'", cli.domain))?;

    if cli.dry_run {
        handle_dry_run(&config, &seed);
        return Ok(());
    }

    handle_crawl(config, seed, cli.quiet).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("linkcrawl=info,warn"),
            1 => EnvFilter::new("linkcrawl=debug,info"),
            2 => EnvFilter::new("linkcrawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config, seed: &SeedDomain) {
    let crawler = &config.crawler;

    println!("=== Linkcrawl Dry Run ===\n");

    println!("Seed:");
    println!("  URL: {}", seed.url());
    println!("  Host: {}", seed.hostname());
    if let Some(port) = seed.port() {
        println!("  Port: {}", port);
    }

    println!("\nCrawler Configuration:");
    println!("  Fetch workers: {}", crawler.fetch_workers);
    println!("  Crawl workers: {}", crawler.crawl_workers);
    println!("  Retries: {}", crawler.retries);
    println!("  Timeout: {}ms", crawler.timeout_ms);
    println!("  Retry backoff: {}ms", crawler.retry_backoff_ms);
    println!("  Completion: {}", crawler.completion);
    if crawler.completion == CompletionMode::Stability {
        println!("  Poll interval: {}ms", crawler.poll_interval_ms);
        println!("  Stability threshold: {}", crawler.stability_threshold);
        println!("  Grace period: {}ms", crawler.grace_period_ms);
    }

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, seed: SeedDomain, quiet: bool) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let (sink, records) = OutputSink::channel(config.crawler.output_buffer, cancel.clone());
    let writer = spawn_writer(records, RecordWriter::stdout());

    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, stopping crawl");
                cancel.cancel();
            }
        }
    });

    let report = crawl(&config, seed, sink, cancel)
        .await
        .context("crawl failed")?;

    let (_, stats) = writer.await.context("output writer panicked")??;

    tracing::info!(
        "Crawl completed ({}): {} pages fetched, {} records written",
        report.completion,
        report.fetched,
        stats.total_records()
    );

    if !quiet {
        print_statistics(&stats, &report);
    }

    Ok(())
}
