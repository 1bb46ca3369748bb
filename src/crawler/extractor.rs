//! Link and image extraction from fetched HTML
//!
//! Walks a document's `<a>` and `<img>` elements and resolves whatever their
//! `href`/`src` attributes hold into absolute URLs. Outputs are sets, so
//! document order never matters.

use scraper::{Html, Selector};
use std::collections::{HashMap, HashSet};
use url::Url;

/// Looks through an HTTP response for images to record and links to follow
///
/// The caller is expected to have already checked the content type, but the
/// check is repeated here: a missing `content-type` header or one without a
/// `text/html` substring (case-insensitive) yields two empty sets and a log
/// line instead of an error, so a benign skip looks exactly like a page with
/// nothing on it.
///
/// # Arguments
///
/// * `base_url` - The URL the response came from, after redirects; relative
///   candidates are resolved against it
/// * `headers` - Response headers with lowercased keys
/// * `body` - The full response body
///
/// # Returns
///
/// A tuple of `(image_urls, link_urls)`, both absolute.
pub fn parse_response(
    base_url: &str,
    headers: &HashMap<String, String>,
    body: &str,
) -> (HashSet<String>, HashSet<String>) {
    let Some(content_type) = headers.get("content-type") else {
        tracing::warn!("Missing Content-Type header. Skipping.");
        return (HashSet::new(), HashSet::new());
    };
    if !content_type.to_lowercase().contains("text/html") {
        tracing::warn!("Content type \"{}\" not parseable. Skipping.", content_type);
        return (HashSet::new(), HashSet::new());
    }

    let document = Html::parse_document(body);
    let mut image_urls = HashSet::new();
    let mut link_urls = HashSet::new();

    if let Ok(anchor_selector) = Selector::parse("a") {
        for element in document.select(&anchor_selector) {
            if let Some(href) = element.value().attr("href") {
                if !href.is_empty() {
                    link_urls.insert(guess_absolute_url(base_url, href));
                }
            }
        }
    }

    if let Ok(image_selector) = Selector::parse("img") {
        for element in document.select(&image_selector) {
            if let Some(src) = element.value().attr("src") {
                if !src.is_empty() {
                    image_urls.insert(guess_absolute_url(base_url, src));
                }
            }
        }
    }

    (image_urls, link_urls)
}

/// Given an absolute or relative URL, guess the absolute form
///
/// A leading `/` is definitely origin-relative; a leading `http://` or
/// `https://` already looks absolute and passes through untouched. Anything
/// else (a relative path without the slash, or junk) gets the same relative
/// join, and the result is not validated.
fn guess_absolute_url(base_url: &str, candidate: &str) -> String {
    if candidate.starts_with("http://") || candidate.starts_with("https://") {
        return candidate.to_string();
    }

    match Url::parse(base_url).and_then(|base| base.join(candidate)) {
        Ok(resolved) => resolved.to_string(),
        // Unjoinable junk is carried through as-is.
        Err(_) => candidate.to_string(),
    }
}
