//! HTML link extraction
//!
//! Finds every `<a href>` in a fetched page, resolves it against the page
//! URL, and keeps only links that stay under the base URL.

use scraper::{Html, Selector};
use std::collections::BTreeSet;
use url::Url;

/// Extracts the same-origin links of an HTML document
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags, relative or absolute
///
/// **Exclude:**
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs and fragment-only anchors
/// - Non-HTTP(S) URLs after resolution
/// - URLs whose origin differs from `base_url`, or whose string form does not
///   start with the normalized `base_url` (lowercase host, default port
///   dropped, surrounding whitespace trimmed)
///
/// Fragments are stripped so `/a#x` and `/a#y` collapse into one entry.
/// Links that fail to resolve are skipped; an unparseable `base_url` yields an
/// empty set.
///
/// # Example
///
/// ```
/// use regex_crawler::crawler::extract_links;
///
/// let html = r#"<a href="/docs">Docs</a><a href="https://other.org/">Other</a>"#;
/// let links = extract_links(html, "https://example.com");
/// assert_eq!(links.len(), 1);
/// assert!(links.contains("https://example.com/docs"));
/// ```
pub fn extract_links(html: &str, base_url: &str) -> BTreeSet<String> {
    let base = match Url::parse(base_url.trim()) {
        Ok(mut base) => {
            base.set_fragment(None);
            base
        }
        Err(e) => {
            tracing::warn!("Cannot extract links, invalid base URL {}: {}", base_url, e);
            return BTreeSet::new();
        }
    };

    let selector = match Selector::parse("a[href]") {
        Ok(selector) => selector,
        Err(e) => {
            tracing::warn!("Failed to build link selector: {:?}", e);
            return BTreeSet::new();
        }
    };

    let document = Html::parse_document(html);
    let mut links = BTreeSet::new();

    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };

        let Some(absolute) = resolve_link(href, &base) else {
            continue;
        };

        if is_in_scope(&absolute, &base) {
            links.insert(absolute.to_string());
        }
    }

    tracing::debug!("Extracted {} in-scope links from {}", links.len(), base_url);
    links
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(mut absolute) => {
            if absolute.scheme() != "http" && absolute.scheme() != "https" {
                return None;
            }
            absolute.set_fragment(None);
            Some(absolute)
        }
        Err(e) => {
            tracing::debug!("Skipping malformed link {:?}: {}", href, e);
            None
        }
    }
}

/// A link is in scope when it shares the base origin and its string form
/// starts with the normalized base URL
fn is_in_scope(link: &Url, base: &Url) -> bool {
    link.origin() == base.origin() && link.as_str().starts_with(base.as_str())
}
