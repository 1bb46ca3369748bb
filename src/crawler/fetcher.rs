//! HTTP fetcher implementation
//!
//! A thin abstraction over reqwest that gives the executor the shape it
//! wants: status code, post-redirect URL, a flattened header map, and the
//! whole body.

use reqwest::redirect::Policy;
use reqwest::Client;
use std::collections::HashMap;

/// A fully read HTTP response
#[derive(Debug)]
pub struct FetchedPage {
    /// HTTP status code
    pub status: u16,
    /// Final URL after redirects
    pub final_url: String,
    /// Response headers, keys lowercased, first value wins
    pub headers: HashMap<String, String>,
    /// Full response body
    pub body: String,
}

/// Builds the HTTP client every fetch goes through
///
/// Redirects are followed transparently and certificates are validated.
/// No request timeout is set: a stalled upstream parks the worker's single
/// execution slot until the connection dies on its own.
pub fn build_http_client(user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and reads the whole response in
///
/// Headers can technically repeat; only the first value of each is kept,
/// which is all the pipeline ever looks at.
pub async fn fetch_page(client: &Client, url: &str) -> Result<FetchedPage, reqwest::Error> {
    let response = client.get(url).send().await?;

    let status = response.status().as_u16();
    let final_url = response.url().to_string();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
        })
        .collect();
    let body = response.text().await?;

    Ok(FetchedPage {
        status,
        final_url,
        headers,
        body,
    })
}
