//! URL handling module for Lead Harvester
//!
//! This module provides URL normalization, href resolution against a base URL,
//! and unwrapping of redirect-wrapped links.

mod normalize;

pub use normalize::normalize_url;

use url::Url;

/// Resolves an href found in markup against the page it came from
///
/// Returns `None` for empty hrefs, non-navigational schemes
/// (`javascript:`, `mailto:`, `tel:`, `data:`) and anything that does not
/// resolve to an HTTP(S) URL.
///
/// # Examples
///
/// ```
/// use lead_harvester::url::resolve_href;
/// use url::Url;
///
/// let base = Url::parse("https://html.duckduckgo.com/html/").unwrap();
/// let url = resolve_href("//duckduckgo.com/l/?uddg=x", &base).unwrap();
/// assert_eq!(url.as_str(), "https://duckduckgo.com/l/?uddg=x");
/// ```
pub fn resolve_href(href: &str, base: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty()
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let url = base.join(href).ok()?;
    is_http(&url).then_some(url)
}

/// Replaces a redirect-wrapper URL with the destination in `param`
///
/// Search backends wrap result links as `https://host/l/?uddg=<encoded>&rut=...`.
/// If `url` carries `param` and its decoded value is an absolute HTTP(S) URL,
/// that destination is returned; otherwise `url` is returned unchanged.
pub fn unwrap_redirect(url: Url, param: &str) -> Url {
    let destination = url
        .query_pairs()
        .find(|(key, _)| key == param)
        .and_then(|(_, value)| Url::parse(&value).ok())
        .filter(is_http);

    destination.unwrap_or(url)
}

/// Truncates a string for log and status output, respecting char boundaries
pub fn truncate_for_display(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &value[..idx]),
        None => value.to_string(),
    }
}

fn is_http(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}
