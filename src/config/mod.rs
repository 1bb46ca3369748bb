//! Configuration module for Magpie
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. One config file is shared by the API daemon and the workers so
//! that every process agrees on the store location, the bus endpoints, and
//! the crawl depth limit.
//!
//! # Example
//!
//! ```no_run
//! use magpie::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("magpie.toml")).unwrap();
//! println!("Crawling at most {} hop(s) deep", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ApiConfig, BusConfig, Config, CrawlerConfig, StoreConfig};

// Re-export parser functions
pub use parser::load_config;
