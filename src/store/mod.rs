//! Job store for per-job crawl state
//!
//! Each job is four string sets under one opaque ID: every URL registered at
//! submission, the subset still pending, the subset already crawled, and the
//! images discovered so far. The store exposes exactly three operations and
//! no removal API: `crawls_pending` only shrinks, the other sets only grow.
//!
//! Links delegated mid-crawl are never registered here. They exist only as
//! in-flight bus messages, so a job snapshot undercounts work the pool is
//! still chewing on.

mod schema;
mod sqlite;

pub use sqlite::SqliteJobStore;

use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur during job store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No valid URLs provided.")]
    NoUrls,

    #[error("Invalid Job ID: {0}")]
    UnknownJob(String),

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for job store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// A snapshot of one crawl job's state
///
/// Serializes in the wire shape of the HTTP API: the ID plus the four sets
/// as JSON arrays. The snapshot is a batched read, not a linearized one, so
/// it may be stale the instant it is returned while workers are recording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Job {
    pub id: String,
    pub all_urls: HashSet<String>,
    pub crawls_pending: HashSet<String>,
    pub crawls_completed: HashSet<String>,
    pub images: HashSet<String>,
}

/// Trait for job store backends
///
/// Every operation batches its underlying set mutations into a single
/// round trip; there is deliberately no cross-call transaction. Concurrent
/// `record_crawl_result` calls for different URLs of the same job interleave
/// safely because each call is individually atomic.
pub trait JobStore {
    /// Creates a job from its initial URL scope
    ///
    /// Allocates a fresh ID, initializes `all_urls` and `crawls_pending` to
    /// the given set in one batched write, and returns the freshly read job.
    ///
    /// # Errors
    ///
    /// * `StoreError::NoUrls` - the URL set is empty
    fn create_job(&mut self, urls: &HashSet<String>) -> StoreResult<Job>;

    /// Reads a batched snapshot of all four sets for a job
    ///
    /// An empty `all_urls` set is the existence check: there is no separate
    /// existence flag, so a job nobody created looks exactly like a job with
    /// no registered URLs.
    ///
    /// # Errors
    ///
    /// * `StoreError::UnknownJob` - no `all_urls` members exist for this ID
    fn get_job(&self, job_id: &str) -> StoreResult<Job>;

    /// Records the outcome of crawling one URL
    ///
    /// Atomically removes the URL from `crawls_pending`, adds it to
    /// `crawls_completed`, and unions the images in. Re-invoking with the
    /// same arguments is a no-op beyond redundant set operations.
    fn record_crawl_result(
        &mut self,
        job_id: &str,
        url: &str,
        images: &HashSet<String>,
    ) -> StoreResult<()>;
}
