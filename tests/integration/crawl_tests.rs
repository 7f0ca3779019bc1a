//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! fetching, page processing and the full crawl cycle end-to-end.

use linkcrawl::config::{CompletionMode, Config, CrawlerConfig, UserAgentConfig};
use linkcrawl::crawler::{build_http_client, FetchResult, Fetcher, PageProcessor};
use linkcrawl::output::{spawn_writer, CrawlStatistics, OutputRecord, OutputSink, RecordWriter};
use linkcrawl::{CompletionReason, CrawlError, CrawlReport, Frontier, SeedDomain};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEVEN_LINKS: &str = r#"
<html>
<body>
<p><a href="/">Link1</a></p>
<p><a href="/home">Link2</a></p>
<p><a href="/about">Link3</a></p>
<p><a href="/blog">Link4</a></p>
<p><a href="/contact">Link5</a></p>
<p><a href="/privacy">Link6</a></p>
<p><a href="/cookies">Link7</a></p>
</body>
</html>"#;

/// Creates a test configuration with short timings
fn create_test_config(completion: CompletionMode) -> Config {
    Config {
        crawler: CrawlerConfig {
            fetch_workers: 3,
            crawl_workers: 4,
            retries: 2,
            timeout_ms: 2000,
            retry_backoff_ms: 10,
            poll_interval_ms: 20,
            stability_threshold: 3,
            grace_period_ms: 20,
            completion,
            ..CrawlerConfig::default()
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
    }
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/html")
}

fn drain(records: &mut mpsc::Receiver<OutputRecord>) -> Vec<OutputRecord> {
    let mut out = Vec::new();
    while let Ok(record) = records.try_recv() {
        out.push(record);
    }
    out
}

/// Runs a full crawl and returns the report plus every record written
async fn run_crawl(
    config: &Config,
    seed: &str,
) -> (CrawlReport, Vec<String>, CrawlStatistics) {
    let cancel = CancellationToken::new();
    let (sink, records) = OutputSink::channel(config.crawler.output_buffer, cancel.clone());
    let writer = spawn_writer(records, RecordWriter::new(Vec::new()));

    let seed = SeedDomain::parse(seed).expect("Failed to parse seed");
    let frontier = Frontier::new(config, seed, sink, cancel).expect("Failed to build frontier");

    let report = tokio::time::timeout(Duration::from_secs(20), frontier.run())
        .await
        .expect("Crawl did not finish")
        .expect("Crawl failed");

    let (writer, stats) = writer
        .await
        .expect("Writer task panicked")
        .expect("Writer failed");
    let text = String::from_utf8(writer.into_inner()).expect("Output is not UTF-8");
    let lines = text.lines().map(str::to_string).collect();

    (report, lines, stats)
}

#[tokio::test]
async fn test_seven_link_page_is_processed() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(SEVEN_LINKS))
        .mount(&mock_server)
        .await;

    let seed = SeedDomain::parse(&mock_server.uri()).expect("Failed to parse seed");
    let (output, mut records) = OutputSink::channel(32, CancellationToken::new());
    let processor = PageProcessor::new(seed.clone(), output);

    let response = reqwest::get(seed.url().as_str())
        .await
        .expect("Request failed");
    let result = FetchResult::from_response(seed.url().clone(), response);
    assert_eq!(result.status_code, 200);

    let batch = processor.process(result).await.expect("Processing failed");
    assert_eq!(batch.len(), 7);
    assert_eq!(batch[0], *seed.url());
    assert_eq!(batch[1].as_str(), format!("{}/home", mock_server.uri()));

    let records = drain(&mut records);
    assert_eq!(records.len(), 7);
    assert!(records.iter().all(|r| !r.is_error()));
    assert_eq!(
        records[6],
        OutputRecord::data(200, seed.url().as_str(), "/cookies")
    );
}

#[tokio::test]
async fn test_json_page_is_rejected() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(br#"{"links": ["/a"]}"#.to_vec(), "application/json"),
        )
        .mount(&mock_server)
        .await;

    let seed = SeedDomain::parse(&mock_server.uri()).expect("Failed to parse seed");
    let (output, _records) = OutputSink::channel(8, CancellationToken::new());
    let processor = PageProcessor::new(seed.clone(), output);

    let response = reqwest::get(seed.url().as_str())
        .await
        .expect("Request failed");
    let result = FetchResult::from_response(seed.url().clone(), response);

    let err = processor.process(result).await.unwrap_err();
    assert!(matches!(err, CrawlError::ContentType { status: 200, .. }));
    assert_eq!(
        err.to_string(),
        format!(
            "200,{},Invalid Content Type: application/json",
            seed.url()
        )
    );
}

#[tokio::test]
async fn test_crawl_of_json_seed_yields_one_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(b"{}".to_vec(), "application/json"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(CompletionMode::Exact);
    let (report, lines, stats) = run_crawl(&config, &mock_server.uri()).await;

    assert_eq!(report.completion, CompletionReason::Quiescent);
    assert_eq!(report.discovered, 1);
    assert_eq!(report.fetched, 1);
    assert_eq!(stats.error_records, 1);
    assert_eq!(stats.data_records, 0);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("error,200,"));
    assert!(lines[0].ends_with("Invalid Content Type: application/json"));
}

#[tokio::test]
async fn test_always_timing_out_target_exhausts_retries() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html("<a href=\"/never\">x</a>").set_delay(Duration::from_secs(5)))
        .mount(&mock_server)
        .await;

    let retries = 2;
    let config = CrawlerConfig {
        fetch_workers: 1,
        retries,
        timeout_ms: 100,
        retry_backoff_ms: 10,
        ..CrawlerConfig::default()
    };

    let cancel = CancellationToken::new();
    let (output, mut records) = OutputSink::channel(16, cancel.clone());
    let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(10))
        .expect("Failed to build client");
    let (fetcher, _handles) = Fetcher::spawn(client, &config, output, cancel.clone());

    let seed = SeedDomain::parse(&format!("{}/slow", mock_server.uri())).expect("seed");
    let pending = fetcher
        .submit(seed.url().clone())
        .await
        .expect("Fetch was not queued");

    let outcome = pending.wait().await;
    assert!(matches!(
        outcome,
        Err(CrawlError::RetriesExhausted { attempts: 3, .. })
    ));

    let records = drain(&mut records);
    assert_eq!(records.len(), (retries + 1) as usize);
    for (attempt, record) in records.iter().enumerate() {
        assert_eq!(
            record.to_string(),
            format!(
                "error,Timed out fetching {} after {} retries",
                seed.url(),
                attempt
            )
        );
    }

    cancel.cancel();
}

#[tokio::test]
async fn test_crawl_of_unresponsive_seed_finishes() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<a href=\"/a\">a</a>").set_delay(Duration::from_secs(5)))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(CompletionMode::Exact);
    config.crawler.timeout_ms = 100;

    let (report, lines, stats) = run_crawl(&config, &mock_server.uri()).await;

    assert_eq!(report.completion, CompletionReason::Quiescent);
    assert_eq!(report.discovered, 1);
    assert_eq!(stats.data_records, 0);
    assert_eq!(stats.error_records, (config.crawler.retries + 1) as u64);
    assert!(lines.iter().all(|l| l.starts_with("error,Timed out fetching")));
}

#[tokio::test]
async fn test_full_crawl_fetches_each_url_once() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    let pages = [
        (
            "/",
            r##"<a href="/a">A</a><a href="/b/">B</a><a href="#top">Top</a>
               <a href="https://example.org/elsewhere">Elsewhere</a>
               <a href="mailto:owner@example.org">Mail</a>"##,
        ),
        ("/a", r#"<a href="/">Home</a><a href="/c">C</a><a href="/a">Self</a>"#),
        ("/b", r#"<a href="/c">C</a><a href="//b">Also B</a>"#),
        ("/c", r#"<a href="/">Home</a><a href="/b">B</a>"#),
    ];
    for (page, body) in pages {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(html(body))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let config = create_test_config(CompletionMode::Exact);
    let (report, lines, stats) = run_crawl(&config, &base).await;

    assert_eq!(report.completion, CompletionReason::Quiescent);
    assert_eq!(report.discovered, 4);
    assert_eq!(report.fetched, 4);

    // 5 + 3 + 2 + 2 distinct raw links across the four pages
    assert_eq!(stats.data_records, 12);
    assert_eq!(stats.error_records, 0);
    assert_eq!(stats.source_pages.len(), 4);
    assert!(lines.contains(&format!("data,200,{},https://example.org/elsewhere", base)));
    assert!(lines.contains(&format!("data,200,{}/b,/c", base)));

    // Dropping the server verifies every page was requested exactly once
}

#[tokio::test]
async fn test_stability_mode_crawl_completes() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(SEVEN_LINKS))
        .expect(1)
        .mount(&mock_server)
        .await;
    for page in ["/home", "/about", "/blog", "/contact", "/privacy", "/cookies"] {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(html(r#"<a href="/">Home</a>"#))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let config = create_test_config(CompletionMode::Stability);
    let (report, _lines, stats) = run_crawl(&config, &base).await;

    assert_eq!(report.completion, CompletionReason::Stable);
    assert_eq!(report.discovered, 7);
    assert_eq!(report.fetched, 7);
    assert_eq!(stats.data_records, 7 + 6);
}

#[tokio::test]
async fn test_other_hosts_are_never_fetched() {
    let mock_server = MockServer::start().await;
    let port = url::Url::parse(&mock_server.uri())
        .expect("Failed to parse base URL")
        .port()
        .expect("Mock server has no port");

    // localhost resolves to the same server but is a different hostname
    let seed_page = format!(
        r#"<a href="http://localhost:{port}/other">Other host</a><a href="/in">In</a>"#
    );
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(&seed_page))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/in"))
        .respond_with(html("no links here"))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/other"))
        .respond_with(html("unreachable"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(CompletionMode::Exact);
    let (report, _lines, stats) = run_crawl(&config, &mock_server.uri()).await;

    assert_eq!(report.discovered, 2);
    assert_eq!(stats.data_records, 2);
}

#[tokio::test]
async fn test_error_status_pages_are_still_parsed() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/gone">Gone</a>"#))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_raw(br#"<a href="/">Back home</a>"#.to_vec(), "text/html"),
        )
        .mount(&mock_server)
        .await;

    let config = create_test_config(CompletionMode::Exact);
    let (report, lines, _stats) = run_crawl(&config, &base).await;

    assert_eq!(report.fetched, 2);
    assert!(lines.contains(&format!("data,404,{}/gone,/", base)));
}

#[tokio::test]
async fn test_external_cancellation_stops_crawl() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html(r#"<a href="/">Home</a>"#).set_delay(Duration::from_secs(10)))
        .mount(&mock_server)
        .await;

    let config = create_test_config(CompletionMode::Exact);
    let cancel = CancellationToken::new();
    let (sink, records) = OutputSink::channel(16, cancel.clone());
    let writer = spawn_writer(records, RecordWriter::new(Vec::new()));

    let seed = SeedDomain::parse(&mock_server.uri()).expect("Failed to parse seed");
    let frontier = Frontier::new(&config, seed, sink, cancel.clone()).expect("frontier");

    let stopper = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
    });

    let report = tokio::time::timeout(Duration::from_secs(5), frontier.run())
        .await
        .expect("Crawl did not stop")
        .expect("Crawl failed");
    stopper.await.expect("stopper");

    assert_eq!(report.completion, CompletionReason::Cancelled);
    assert_eq!(report.discovered, 1);

    let (_, stats) = writer.await.expect("writer").expect("writer");
    assert_eq!(stats.data_records, 0);
}
