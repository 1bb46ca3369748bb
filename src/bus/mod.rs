//! Two-channel message bus for crawl task distribution
//!
//! Despite the broadcast-flavored naming that tends to stick to this kind of
//! plumbing, the task channel is a competing-consumer queue: every message is
//! delivered to exactly one member of the worker pool. The delegation channel
//! carries links a worker discovered mid-crawl; a repeater drains it and
//! republishes each message unchanged onto the task channel, closing the loop
//! `submit → distribute → execute → delegate → repeat → distribute`.
//!
//! Delivery is best-effort. There is no acknowledgment, no redelivery, and no
//! backpressure; a delegation burst can outrun the pool and the bus buffer
//! grows without bound.

mod nats;

pub use nats::{connect, run_repeater, subscribe_tasks, NatsTaskSink};

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::sync::Mutex;
use thiserror::Error;

/// Errors that can occur on either bus channel
#[derive(Debug, Error)]
pub enum BusError {
    #[error("Failed to connect to the bus: {0}")]
    Connect(#[from] async_nats::ConnectError),

    #[error("Failed to subscribe: {0}")]
    Subscribe(#[from] async_nats::SubscribeError),

    #[error("Failed to publish: {0}")]
    Publish(#[from] async_nats::PublishError),

    #[error("Malformed task message: {0}")]
    Decode(#[from] serde_json::Error),
}

/// One crawl task in flight on a bus
///
/// The wire form is a flat JSON object. Depth is an integer, but senders in
/// the wild have shipped it as a numeric string, so decoding coerces both;
/// unknown or missing fields are rejected outright rather than being spread
/// into a handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskMessage {
    pub job_id: String,
    pub url: String,
    #[serde(deserialize_with = "deserialize_depth")]
    pub depth: u32,
}

impl TaskMessage {
    /// Decodes a task message from a raw bus payload
    pub fn decode(payload: &[u8]) -> Result<Self, BusError> {
        Ok(serde_json::from_slice(payload)?)
    }

    /// Encodes this task message for the wire
    pub fn encode(&self) -> Result<Bytes, BusError> {
        Ok(serde_json::to_vec(self)?.into())
    }
}

/// Accepts integer depth as well as the stringly-typed form some producers
/// emit, e.g. `"depth": "2"`.
fn deserialize_depth<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumericOrText {
        Numeric(u32),
        Text(String),
    }

    match NumericOrText::deserialize(deserializer)? {
        NumericOrText::Numeric(depth) => Ok(depth),
        NumericOrText::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Outbound half of a bus channel
///
/// The HTTP surface sends on the task channel, workers send on the
/// delegation channel; both go through this trait so the callers can be
/// exercised against [`RecordingSink`] without a running bus.
#[async_trait]
pub trait TaskSink: Send + Sync {
    /// Sends one task message down the channel
    async fn send(&self, message: &TaskMessage) -> Result<(), BusError>;
}

/// Enqueues a crawling job (or delegates sub-URLs of a current job) to the
/// worker pool, one announcement per URL
///
/// # Arguments
///
/// * `sink` - Outbound channel: the task queue for fresh submissions, the
///   delegation channel for links found mid-crawl
/// * `job_id` - The job these URLs fall under
/// * `urls` - The URLs to crawl
/// * `depth` - The depth these crawls will run at, 0 being initial
///
/// # Returns
///
/// The number of announcements made. One per URL.
pub async fn enqueue_crawl_tasks<S: TaskSink + ?Sized>(
    sink: &S,
    job_id: &str,
    urls: &HashSet<String>,
    depth: u32,
) -> Result<usize, BusError> {
    for url in urls {
        let message = TaskMessage {
            job_id: job_id.to_string(),
            url: url.clone(),
            depth,
        };
        sink.send(&message).await?;
    }

    Ok(urls.len())
}

/// In-memory sink that records every message it is handed
///
/// Lets tests inspect what would have gone out on a channel without a
/// running bus behind it.
#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<TaskMessage>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages sent so far, in send order
    pub fn sent(&self) -> Vec<TaskMessage> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl TaskSink for RecordingSink {
    async fn send(&self, message: &TaskMessage) -> Result<(), BusError> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message.clone());
        Ok(())
    }
}
