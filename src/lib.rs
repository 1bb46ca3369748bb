//! Magpie: a distributed image crawler
//!
//! This crate implements the coordination layer of a distributed web crawl:
//! jobs are submitted over HTTP, fanned out to a worker pool through a
//! competing-consumer task queue, and every worker records the images it
//! finds in a shared job store while delegating newly discovered links back
//! onto the queue up to a bounded depth.

pub mod api;
pub mod bus;
pub mod config;
pub mod crawler;
pub mod ingest;
pub mod store;

use thiserror::Error;

/// Main error type for Magpie operations
#[derive(Debug, Error)]
pub enum MagpieError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Job store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("Bus error: {0}")]
    Bus(#[from] bus::BusError),

    #[error("URL ingestion error: {0}")]
    Ingest(#[from] IngestError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Errors raised while parsing a raw job submission body into URLs
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("URLs must start with a protocol string.")]
    MissingProtocol,
}

/// Result type alias for Magpie operations
pub type Result<T> = std::result::Result<T, MagpieError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use bus::{enqueue_crawl_tasks, TaskMessage, TaskSink};
pub use config::Config;
pub use crawler::{crawl_job_url, CrawlOutcome};
pub use store::{Job, JobStore, SqliteJobStore};
