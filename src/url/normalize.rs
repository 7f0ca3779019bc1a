use crate::url::domain::{authority_host, extract_domain, is_loopback_host};
use crate::{UrlError, UrlResult};
use std::fmt;
use url::Url;

/// Schemes that never carry a `//` authority
const OPAQUE_SCHEMES: &[&str] = &["mailto:", "javascript:", "tel:", "data:"];

/// A normalized absolute URL used as the dedup key
///
/// Form: `scheme://host[:port][/path][?query]` with no fragment and no
/// trailing slash. Two hrefs that differ only in trailing slash, fragment,
/// scheme case or a missing scheme map to the same value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalUrl(String);

impl CanonicalUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Rebuilds a parsed URL in canonical form
    fn from_parsed(url: &Url) -> Self {
        let mut out = format!("{}://{}", url.scheme(), url.host_str().unwrap_or_default());
        if let Some(port) = url.port() {
            out.push(':');
            out.push_str(&port.to_string());
        }

        let path = collapse_path(url.path());
        if path != "/" {
            out.push_str(&path);
        }

        if let Some(query) = url.query().filter(|q| !q.is_empty()) {
            out.push('?');
            out.push_str(query);
        }

        Self(out)
    }
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The crawl boundary: the seed URL's scheme, hostname and explicit port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedDomain {
    scheme: String,
    hostname: String,
    port: Option<u16>,
    url: CanonicalUrl,
}

impl SeedDomain {
    /// Parses the seed URL
    ///
    /// The seed must be absolute with an `http` or `https` scheme and a host.
    /// Any failure here is fatal for the crawl.
    ///
    /// # Examples
    ///
    /// ```
    /// use linkcrawl::url::SeedDomain;
    ///
    /// let seed = SeedDomain::parse("https://Example.com/blog/").unwrap();
    /// assert_eq!(seed.hostname(), "example.com");
    /// assert_eq!(seed.url().as_str(), "https://example.com/blog");
    ///
    /// assert!(SeedDomain::parse("example.com").is_err());
    /// ```
    pub fn parse(seed: &str) -> UrlResult<Self> {
        let trimmed = seed.trim();
        let url =
            Url::parse(trimmed).map_err(|e| UrlError::Parse(format!("{}: {}", trimmed, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(UrlError::InvalidScheme(format!(
                "Only HTTP and HTTPS seeds are supported, got: {}",
                url.scheme()
            )));
        }

        let hostname = extract_domain(&url).ok_or(UrlError::MissingDomain)?;

        Ok(Self {
            scheme: url.scheme().to_string(),
            hostname,
            port: url.port(),
            url: CanonicalUrl::from_parsed(&url),
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// The seed itself in canonical form
    pub fn url(&self) -> &CanonicalUrl {
        &self.url
    }

    /// `scheme://host[:port]` of the seed
    pub fn origin(&self) -> String {
        match self.port {
            Some(port) => format!("{}://{}:{}", self.scheme, self.hostname, port),
            None => format!("{}://{}", self.scheme, self.hostname),
        }
    }
}

/// Normalizes a raw `href` against the seed domain
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace
/// 2. A leading `#` resolves to the seed origin
/// 3. A leading `/` is resolved against the seed origin
/// 4. A schemeless loopback host gets `http://`, any other schemeless href `https://`
/// 5. Parse; a malformed href is an error for this link only
/// 6. Compare hostnames exactly; subdomains and other domains are out of scope
/// 7. Rebuild as `scheme://host[:port]` + path (omitted when `/`) + `?query`
///
/// # Returns
///
/// * `Ok(Some(CanonicalUrl))` - The href is in the seed's domain
/// * `Ok(None)` - The href is out of scope
/// * `Err(UrlError)` - The href could not be parsed
///
/// # Examples
///
/// ```
/// use linkcrawl::url::{normalize_href, SeedDomain};
///
/// let seed = SeedDomain::parse("https://example.com").unwrap();
///
/// let url = normalize_href("/relative/path/", &seed).unwrap().unwrap();
/// assert_eq!(url.as_str(), "https://example.com/relative/path");
///
/// assert!(normalize_href("subdomain.example.com/", &seed).unwrap().is_none());
/// ```
pub fn normalize_href(raw: &str, seed: &SeedDomain) -> UrlResult<Option<CanonicalUrl>> {
    let trimmed = raw.trim();
    let mut href = trimmed.to_string();

    if href.starts_with('#') {
        href = seed.origin();
    }

    if href.starts_with('/') {
        href = format!("{}{}", seed.origin(), href);
    }

    if !has_scheme(&href) {
        let scheme = if is_loopback_host(authority_host(&href)) {
            "http"
        } else {
            "https"
        };
        href = format!("{}://{}", scheme, href);
    }

    let url = Url::parse(&href).map_err(|e| UrlError::Parse(format!("{}: {}", trimmed, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Ok(None);
    }

    match extract_domain(&url) {
        Some(host) if host == seed.hostname() => Ok(Some(CanonicalUrl::from_parsed(&url))),
        _ => Ok(None),
    }
}

/// Checks whether an href already names its scheme
fn has_scheme(href: &str) -> bool {
    if let Some((scheme, _)) = href.split_once("://") {
        if is_scheme_token(scheme) {
            return true;
        }
    }

    let lower = href.to_ascii_lowercase();
    OPAQUE_SCHEMES.iter().any(|scheme| lower.starts_with(scheme))
}

/// `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )`
fn is_scheme_token(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Normalizes a URL path by removing dot segments, repeated and trailing slashes
fn collapse_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            // Skip empty segments (from multiple slashes) and current directory markers
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    format!("/{}", segments.join("/"))
}
