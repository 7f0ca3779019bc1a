//! HTML parser for extracting anchor links
//!
//! This module walks a parsed document and collects every `href` value found
//! on an `<a>` element. It does no filtering or resolution; that belongs to
//! the page processor and the URL normalizer.

use scraper::{Html, Node};
use std::collections::HashSet;

/// Parses an HTML document
///
/// The underlying parser (html5ever) recovers from malformed markup, so this
/// never fails.
pub fn parse_html(body: &str) -> Html {
    Html::parse_document(body)
}

/// Collects every anchor `href` in the document
///
/// The traversal is an exhaustive depth-first walk in document order: the
/// node itself, then its children left to right. Anchors without an `href`
/// contribute nothing; empty `href` values are kept.
///
/// # Example
///
/// ```
/// use linkcrawl::crawler::{extract_hrefs, parse_html};
///
/// let html = r#"<div><a href="/one">1</a><p><a href="/two">2</a></p></div>"#;
/// let document = parse_html(html);
/// assert_eq!(extract_hrefs(&document), vec!["/one", "/two"]);
/// ```
pub fn extract_hrefs(document: &Html) -> Vec<String> {
    document
        .tree
        .root()
        .descendants()
        .filter_map(|node| match node.value() {
            Node::Element(element) if element.name() == "a" => element.attr("href"),
            _ => None,
        })
        .map(str::to_string)
        .collect()
}

/// Convenience function for extracting the raw hrefs of an HTML string
pub fn extract_links(body: &str) -> Vec<String> {
    extract_hrefs(&parse_html(body))
}

/// Removes empty and repeated links, keeping first-occurrence order
///
/// # Example
///
/// ```
/// use linkcrawl::crawler::filtered_links;
///
/// let links = vec!["/a".to_string(), "".to_string(), "/b".to_string(), "/a".to_string()];
/// assert_eq!(filtered_links(links), vec!["/a", "/b"]);
/// ```
pub fn filtered_links(links: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    links
        .into_iter()
        .filter(|link| !link.is_empty())
        .filter(|link| seen.insert(link.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn test_extract_seven_links() {
        let links = extract_links(SEVEN_LINKS);
        assert_eq!(links.len(), 7);
        assert_eq!(links[0], "/");
        assert_eq!(links[6], "/cookies");
    }

    #[test]
    fn test_nesting_depth_does_not_matter() {
        let html = r#"
            <html><body>
                <a href="/top">Top</a>
                <div><div><div><section><ul><li><span>
                    <a href="/deep">Deep</a>
                </span></li></ul></section></div></div></div>
                <footer><nav><a href="/footer">Footer</a></nav></footer>
            </body></html>
        "#;
        assert_eq!(extract_links(html), vec!["/top", "/deep", "/footer"]);
    }

    #[test]
    fn test_document_order_across_head_and_body() {
        let html = r#"
            <html>
            <head><title>t</title></head>
            <body>
                <div><a href="/first">1</a><div><a href="/second">2</a></div></div>
                <a href="/third">3</a>
            </body>
            </html>
        "#;
        assert_eq!(extract_links(html), vec!["/first", "/second", "/third"]);
    }

    #[test]
    fn test_anchor_without_href_is_skipped() {
        let html = r#"<a name="top">Top</a><a href="/page">Page</a>"#;
        assert_eq!(extract_links(html), vec!["/page"]);
    }

    #[test]
    fn test_no_filtering_at_extraction() {
        let html = r##"
            <a href="mailto:test@example.com">Mail</a>
            <a href="#section">Jump</a>
            <a href="https://other.com/page">Other</a>
            <a href="">Empty</a>
            <a href="/page">Page</a>
            <a href="/page">Again</a>
        "##;
        let links = extract_links(html);
        assert_eq!(links.len(), 6);
        assert_eq!(links[3], "");
    }

    #[test]
    fn test_other_elements_are_ignored() {
        let html = r#"
            <link rel="canonical" href="https://example.com/canonical" />
            <img src="/logo.png">
            <script src="/app.js"></script>
            <area href="/map">
        "#;
        assert!(extract_links(html).is_empty());
    }

    #[test]
    fn test_malformed_markup_still_yields_links() {
        let html = r#"<div><p><a href="/unclosed">no closing tags<a href="/next">"#;
        assert_eq!(extract_links(html), vec!["/unclosed", "/next"]);
    }

    #[test]
    fn test_filtered_links_dedupes() {
        let raw: Vec<String> = [
            "https://example.com",
            "https://example.com",
            "https://example.com",
            "https://example.com/path",
            "https://example.com/path",
            "https://example.com/path",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        assert_eq!(
            filtered_links(raw),
            vec!["https://example.com", "https://example.com/path"]
        );
    }

    #[test]
    fn test_filtered_links_drops_empty_and_keeps_order() {
        let raw: Vec<String> = ["", "/b", "/a", "", "/b", "/c", "/a"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        assert_eq!(filtered_links(raw), vec!["/b", "/a", "/c"]);
    }
}
