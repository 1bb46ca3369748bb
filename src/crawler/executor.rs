//! Crawl task executor
//!
//! Where the sausage is made: one `(job, url, depth)` task in, a recorded
//! result and a batch of delegated sub-links out. Every failure here is
//! terminal for this one task; nothing is retried and nothing escalates
//! past a log line.

use crate::bus::{enqueue_crawl_tasks, TaskMessage, TaskSink};
use crate::crawler::extractor::parse_response;
use crate::crawler::fetcher::fetch_page;
use crate::store::JobStore;
use reqwest::Client;
use std::collections::HashSet;
use std::sync::Mutex;

/// How a crawl task ended
#[derive(Debug, PartialEq, Eq)]
pub enum CrawlOutcome {
    /// The page was crawled and its result recorded
    Completed {
        /// Images recorded for this URL
        images_found: usize,
        /// Links handed to the delegation channel (0 at the depth limit)
        links_delegated: usize,
    },
    /// The task was dropped without a full crawl
    Skipped(SkipReason),
}

/// Benign reasons a task is dropped
#[derive(Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The fetch itself failed (connect, TLS, too many redirects, ...)
    FetchFailed,
    /// The server answered with a non-200 status
    BadStatus(u16),
    /// Missing content-type header, or not an HTML document; the URL is
    /// still recorded as completed with zero findings
    NotHtml,
}

/// Crawls one URL for images and delegates the links found on it
///
/// The pipeline: fetch with redirects followed, validate the status and
/// content type, extract images and links with the post-redirect URL as
/// base, record the result under the task's job, then hand each discovered
/// link to the delegation channel at `depth + 1`. A task already sitting at
/// the depth limit still computes its links, then drops them.
///
/// Transport problems and non-HTML responses end the task quietly with a
/// [`CrawlOutcome::Skipped`]; only store and bus failures surface as errors,
/// and the worker loop just logs those, there being no caller to notify.
pub async fn crawl_job_url<S, K>(
    client: &Client,
    store: &Mutex<S>,
    delegator: &K,
    task: &TaskMessage,
    max_depth: u32,
) -> crate::Result<CrawlOutcome>
where
    S: JobStore,
    K: TaskSink + ?Sized,
{
    let page = match fetch_page(client, &task.url).await {
        Ok(page) => page,
        Err(error) => {
            tracing::error!("URL {} could not be fetched: {}", task.url, error);
            return Ok(CrawlOutcome::Skipped(SkipReason::FetchFailed));
        }
    };

    if page.status != 200 {
        tracing::error!(
            "URL {} failed with non-200 HTTP code: {}",
            task.url,
            page.status
        );
        return Ok(CrawlOutcome::Skipped(SkipReason::BadStatus(page.status)));
    }

    let is_html = page
        .headers
        .get("content-type")
        .map(|value| value.to_lowercase().contains("text/html"))
        .unwrap_or(false);
    if !is_html {
        // Benign skip: done with zero findings, indistinguishable from a
        // page that had nothing on it.
        tracing::warn!("URL {} did not come back as HTML. Skipping.", task.url);
        lock_store(store).record_crawl_result(&task.job_id, &task.url, &HashSet::new())?;
        return Ok(CrawlOutcome::Skipped(SkipReason::NotHtml));
    }

    // Relative candidates resolve against wherever the redirects landed,
    // not where the task pointed.
    let (image_urls, links_to_crawl) = parse_response(&page.final_url, &page.headers, &page.body);

    lock_store(store).record_crawl_result(&task.job_id, &task.url, &image_urls)?;

    // Rather than follow the links in the current invocation, hand them off
    // so the work spreads across the pool.
    let links_delegated = if !links_to_crawl.is_empty() && task.depth < max_depth {
        enqueue_crawl_tasks(delegator, &task.job_id, &links_to_crawl, task.depth + 1).await?
    } else {
        0
    };

    Ok(CrawlOutcome::Completed {
        images_found: image_urls.len(),
        links_delegated,
    })
}

fn lock_store<S: JobStore>(store: &Mutex<S>) -> std::sync::MutexGuard<'_, S> {
    store.lock().unwrap_or_else(|e| e.into_inner())
}
