//! Page processing: turns a fetched response into output records and work
//!
//! Every raw link that survives de-duplication is reported as a data
//! record, whether or not it is followed. Only links that normalize to a
//! URL on the seed's host make it into the returned [`WorkBatch`].

use crate::crawler::fetcher::FetchResult;
use crate::crawler::parser::{extract_links, filtered_links};
use crate::output::OutputSink;
use crate::url::{normalize_href, CanonicalUrl, SeedDomain};
use crate::CrawlError;

/// Candidate URLs discovered on one page
///
/// May contain repeats; the dedup stage handles those.
pub type WorkBatch = Vec<CanonicalUrl>;

/// Content types the processor is willing to parse
const ACCEPTED_CONTENT_TYPES: &[&str] = &["text/html", "text/plain"];

/// Returns true if the Content-Type header names a parseable document
pub fn is_accepted_content_type(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    ACCEPTED_CONTENT_TYPES
        .iter()
        .any(|accepted| content_type.contains(accepted))
}

/// Extracts links from fetched pages and publishes them
#[derive(Debug, Clone)]
pub struct PageProcessor {
    seed: SeedDomain,
    output: OutputSink,
}

impl PageProcessor {
    pub fn new(seed: SeedDomain, output: OutputSink) -> Self {
        Self { seed, output }
    }

    pub fn seed(&self) -> &SeedDomain {
        &self.seed
    }

    /// Processes one fetch result
    ///
    /// Pages of any HTTP status are processed. A response with an unaccepted
    /// content type, or whose body cannot be read, yields an error and no
    /// work; the caller is responsible for reporting it.
    pub async fn process(&self, result: FetchResult) -> Result<WorkBatch, CrawlError> {
        let FetchResult {
            source_url,
            status_code,
            content_type,
            body,
        } = result;

        if !is_accepted_content_type(&content_type) {
            // Dropping the response here releases its connection
            return Err(CrawlError::ContentType {
                status: status_code,
                url: source_url.into_string(),
                content_type,
            });
        }

        let bytes = body.bytes().await.map_err(|e| CrawlError::Body {
            status: status_code,
            url: source_url.to_string(),
            message: e.to_string(),
        })?;
        let document = String::from_utf8_lossy(&bytes);

        Ok(self
            .process_document(status_code, source_url.as_str(), &document)
            .await)
    }

    /// Extracts, reports and normalizes the links of an HTML document
    pub async fn process_document(
        &self,
        status_code: u16,
        source_url: &str,
        document: &str,
    ) -> WorkBatch {
        let links = filtered_links(extract_links(document));
        let mut batch = WorkBatch::with_capacity(links.len());

        for link in &links {
            self.output.data(status_code, source_url, link).await;

            match normalize_href(link, &self.seed) {
                Ok(Some(url)) => batch.push(url),
                Ok(None) => tracing::trace!("Not following off-domain link {}", link),
                Err(e) => tracing::debug!("Skipping link {} on {}: {}", link, source_url, e),
            }
        }

        tracing::debug!(
            "Processed {}: {} links, {} in scope",
            source_url,
            links.len(),
            batch.len()
        );

        batch
    }
}
