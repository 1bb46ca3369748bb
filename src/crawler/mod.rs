//! Crawler module for fetching and processing one task at a time
//!
//! This module contains the per-task crawl pipeline:
//! - HTTP fetching with redirect following
//! - Content-type validation
//! - Link and image extraction from HTML
//! - Recording results and delegating discovered links

mod executor;
mod extractor;
mod fetcher;

pub use executor::{crawl_job_url, CrawlOutcome, SkipReason};
pub use extractor::parse_response;
pub use fetcher::{build_http_client, fetch_page, FetchedPage};
