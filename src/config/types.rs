use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Main configuration structure for linkcrawl
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
}

/// How the monitor decides that a crawl is finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionMode {
    /// Finish when the outstanding-work count drops to zero
    #[default]
    Exact,
    /// Finish after several consecutive polls observe no growth
    Stability,
}

impl fmt::Display for CompletionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Stability => write!(f, "stability"),
        }
    }
}

impl FromStr for CompletionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "stability" => Ok(Self::Stability),
            other => Err(format!(
                "unknown completion mode '{}' (expected 'exact' or 'stability')",
                other
            )),
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Number of fetch workers performing HTTP requests
    #[serde(rename = "fetch-workers")]
    pub fetch_workers: usize,

    /// Number of crawl workers pairing fetches with page processing
    #[serde(rename = "crawl-workers")]
    pub crawl_workers: usize,

    /// Retries after the first failed attempt (attempts = retries + 1)
    pub retries: u32,

    /// Deadline for a single fetch attempt (milliseconds)
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Fixed delay between fetch attempts (milliseconds)
    #[serde(rename = "retry-backoff-ms")]
    pub retry_backoff_ms: u64,

    /// Interval between completion checks (milliseconds)
    #[serde(rename = "poll-interval-ms")]
    pub poll_interval_ms: u64,

    /// Consecutive stable observations required in stability mode
    #[serde(rename = "stability-threshold")]
    pub stability_threshold: u32,

    /// Extra pause after a stable observation (milliseconds)
    #[serde(rename = "grace-period-ms")]
    pub grace_period_ms: u64,

    /// Completion detection strategy
    pub completion: CompletionMode,

    /// Capacity of the queue feeding the dedup stage
    #[serde(rename = "work-queue-capacity")]
    pub work_queue_capacity: usize,

    /// Capacity of the queue feeding crawl workers
    #[serde(rename = "unseen-queue-capacity")]
    pub unseen_queue_capacity: usize,

    /// Capacity of the output record channel
    #[serde(rename = "output-buffer")]
    pub output_buffer: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            fetch_workers: 5,
            crawl_workers: 20,
            retries: 3,
            timeout_ms: 5_000,
            retry_backoff_ms: 1_000,
            poll_interval_ms: 1_000,
            stability_threshold: 3,
            grace_period_ms: 3_000,
            completion: CompletionMode::Exact,
            work_queue_capacity: 64,
            unseen_queue_capacity: 64,
            output_buffer: 256,
        }
    }
}

impl CrawlerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "linkcrawl".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://github.com/linkcrawl/linkcrawl".to_string(),
            contact_email: "crawler@linkcrawl.dev".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the user agent header value
    ///
    /// Format: `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}
