use std::net::IpAddr;
use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host (`mailto:`, `javascript:` and friends), it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use linkcrawl::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("mailto:someone@example.com").unwrap();
/// assert_eq!(extract_domain(&url), None);
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str()
        .filter(|h| !h.is_empty())
        .map(|h| h.to_lowercase())
}

/// Returns the host part of a schemeless `host[:port][/path]` string
///
/// Userinfo is skipped and IPv6 literals keep their brackets.
pub fn authority_host(href: &str) -> &str {
    let end = href.find(['/', '?', '#']).unwrap_or(href.len());
    let authority = &href[..end];
    let authority = match authority.rfind('@') {
        Some(at) => &authority[at + 1..],
        None => authority,
    };

    if authority.starts_with('[') {
        return match authority.find(']') {
            Some(close) => &authority[..=close],
            None => authority,
        };
    }

    match authority.find(':') {
        Some(colon) => &authority[..colon],
        None => authority,
    }
}

/// Checks whether a host names the local machine
///
/// Accepts `localhost`, any `127.0.0.0/8` address and `::1` (with or
/// without brackets).
pub fn is_loopback_host(host: &str) -> bool {
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }

    let bare = host.trim_start_matches('[').trim_end_matches(']');
    bare.parse::<IpAddr>()
        .map(|ip| ip.is_loopback())
        .unwrap_or(false)
}
