//! Magpie main entry point
//!
//! One binary, two daemons: `serve` runs the job submission/query API plus
//! the delegation repeater, `worker` runs a single-threaded crawl loop that
//! competes for tasks with every other worker process.

use anyhow::Context;
use clap::{Parser, Subcommand};
use futures::StreamExt;
use magpie::api::{router, ApiState};
use magpie::bus::{connect, run_repeater, subscribe_tasks, NatsTaskSink, TaskMessage};
use magpie::config::Config;
use magpie::crawler::{build_http_client, crawl_job_url};
use magpie::store::SqliteJobStore;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

/// Magpie: a distributed image crawler
///
/// Jobs come in over HTTP, crawl tasks go out over a shared queue, and a
/// pool of worker processes records discovered images in a shared job store
/// while feeding newly found links back into the queue.
#[derive(Parser, Debug)]
#[command(name = "magpie")]
#[command(version = "1.0.0")]
#[command(about = "A distributed image crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the job submission/query API and the delegation repeater
    Serve,
    /// Run one crawl worker
    Worker,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = magpie::config::load_config(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    match cli.command {
        Command::Serve => run_serve(config).await,
        Command::Worker => run_worker(config).await,
    }
}

/// Sets up the tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("magpie=info,warn"),
            1 => EnvFilter::new("magpie=debug,info"),
            2 => EnvFilter::new("magpie=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Runs the HTTP surface and the delegation repeater
async fn run_serve(config: Config) -> anyhow::Result<()> {
    let store = SqliteJobStore::open(Path::new(&config.store.database_path))
        .context("Failed to open the job store")?;

    let client = connect(&config.bus.server_url)
        .await
        .context("Failed to connect to the bus")?;

    // The repeater closes the delegation loop: whatever workers discover
    // comes back around onto the task queue for the next free worker.
    let repeater_client = client.clone();
    let delegation_subject = config.bus.delegation_subject.clone();
    let task_subject = config.bus.task_subject.clone();
    tokio::spawn(async move {
        if let Err(error) =
            run_repeater(&repeater_client, &delegation_subject, &task_subject).await
        {
            tracing::error!("Repeater terminated: {}", error);
        }
    });

    let state = ApiState {
        store: Arc::new(Mutex::new(store)),
        tasks: Arc::new(NatsTaskSink::new(client, config.bus.task_subject.clone())),
    };

    let addr = &config.api.bind_addr;
    tracing::info!("Job submission API listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, router(state))
        .await
        .context("API server error")?;

    Ok(())
}

/// Runs one crawl worker until its task subscription ends
///
/// The loop is single-threaded and cooperative: at most one task is in
/// flight at a time from this process's perspective, and parallelism comes
/// from running more worker processes against the same queue group.
async fn run_worker(config: Config) -> anyhow::Result<()> {
    let store = Mutex::new(
        SqliteJobStore::open(Path::new(&config.store.database_path))
            .context("Failed to open the job store")?,
    );

    let client = connect(&config.bus.server_url)
        .await
        .context("Failed to connect to the bus")?;

    let mut tasks = subscribe_tasks(
        &client,
        &config.bus.task_subject,
        &config.bus.worker_group,
    )
    .await
    .context("Failed to subscribe to the task queue")?;

    let delegator = NatsTaskSink::new(client.clone(), config.bus.delegation_subject.clone());

    let http_client =
        build_http_client(&config.crawler.user_agent).context("Failed to build HTTP client")?;

    let max_depth = config.crawler.max_depth;
    tracing::info!("Worker ready, crawling at most {} hop(s) deep", max_depth);

    while let Some(message) = tasks.next().await {
        let task = match TaskMessage::decode(&message.payload) {
            Ok(task) => task,
            Err(error) => {
                tracing::error!("Discarding malformed task message: {}", error);
                continue;
            }
        };

        tracing::info!(
            "Task received: job={} url={} depth={}",
            task.job_id,
            task.url,
            task.depth
        );

        match crawl_job_url(&http_client, &store, &delegator, &task, max_depth).await {
            Ok(outcome) => tracing::debug!("Task for {} finished: {:?}", task.url, outcome),
            // Terminal for this task; the queue carries no redelivery.
            Err(error) => tracing::error!("Task for {} lost: {}", task.url, error),
        }
    }

    tracing::info!("Task subscription ended, worker shutting down");
    Ok(())
}
