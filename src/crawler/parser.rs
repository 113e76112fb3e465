//! HTML parser for link discovery
//!
//! This module handles parsing HTML content to extract:
//! - Candidate hrefs to follow (from <a> tags only)
//! - Page title, for logging
//!
//! Hrefs are returned raw; resolution and canonicalization belong to
//! [`UrlNormalizer`](crate::url::UrlNormalizer).

use scraper::{Html, Selector};

/// Link-discovery view of an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// Candidate hrefs in document order, unresolved
    pub hrefs: Vec<String>,
}

/// Parses HTML content and collects candidate hrefs
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:`, `data:` hrefs
/// - Fragment-only hrefs (same page anchors)
/// - `<link>` elements, including `rel="canonical"`
///
/// `rel="nofollow"` links are followed.
///
/// Parsing never fails; malformed markup yields whatever the HTML5 parser
/// recovers.
///
/// # Example
///
/// ```
/// use site_trawler::crawler::parse_html;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let parsed = parse_html(html);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.hrefs, vec!["/page".to_string()]);
/// ```
pub fn parse_html(html: &str) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        hrefs: extract_hrefs(&document),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn extract_hrefs(document: &Html) -> Vec<String> {
    let mut hrefs = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }
            if let Some(href) = element.value().attr("href").and_then(followable) {
                hrefs.push(href.to_string());
            }
        }
    }

    hrefs
}

/// Returns the trimmed href if it can lead to another page
fn followable(href: &str) -> Option<&str> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    let special = ["javascript:", "mailto:", "tel:", "data:"];
    if special.iter().any(|scheme| lower.starts_with(scheme)) {
        return None;
    }

    Some(href)
}
