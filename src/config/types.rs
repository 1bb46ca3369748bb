use serde::Deserialize;

/// Main configuration structure for Magpie
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub store: StoreConfig,
    pub bus: BusConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

/// Job store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file shared by all processes on a host
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Message bus configuration
///
/// Both channels ride the same NATS server: the task subject is consumed
/// through a queue group (each message goes to exactly one worker), the
/// delegation subject is consumed by the repeater alone.
#[derive(Debug, Clone, Deserialize)]
pub struct BusConfig {
    /// NATS server address, e.g. "nats://127.0.0.1:4222"
    #[serde(rename = "server-url")]
    pub server_url: String,

    /// Subject crawl tasks are distributed on
    #[serde(rename = "task-subject", default = "default_task_subject")]
    pub task_subject: String,

    /// Subject workers delegate discovered links on
    #[serde(rename = "delegation-subject", default = "default_delegation_subject")]
    pub delegation_subject: String,

    /// Queue group name shared by the worker pool
    #[serde(rename = "worker-group", default = "default_worker_group")]
    pub worker_group: String,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum hop count from a job's initial URLs
    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: u32,

    /// User-agent string sent on every outbound fetch
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

/// HTTP API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Address the job submission/query surface listens on
    #[serde(rename = "bind-addr", default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

fn default_task_subject() -> String {
    "magpie.tasks".to_string()
}

fn default_delegation_subject() -> String {
    "magpie.delegated".to_string()
}

fn default_worker_group() -> String {
    "magpie-workers".to_string()
}

fn default_max_depth() -> u32 {
    1
}

fn default_user_agent() -> String {
    "magpie image crawler 1.0".to_string()
}

fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}
