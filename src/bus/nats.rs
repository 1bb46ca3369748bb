//! NATS-backed bus channels
//!
//! One NATS server carries both channels. Workers consume the task subject
//! through a shared queue group, which is what makes it a competing-consumer
//! queue rather than a fan-out; the delegation subject has a single plain
//! subscriber, the repeater.

use crate::bus::{BusError, TaskMessage, TaskSink};
use async_nats::{Client, Subscriber};
use async_trait::async_trait;
use futures::StreamExt;

/// Connects to the NATS server backing both bus channels
pub async fn connect(server_url: &str) -> Result<Client, BusError> {
    let client = async_nats::connect(server_url).await?;
    tracing::info!("Connected to bus at {}", server_url);
    Ok(client)
}

/// Subscribes to the task subject as a member of the worker queue group
///
/// Every message on the subject is delivered to exactly one member of the
/// group, so adding worker processes shares the load instead of multiplying
/// it.
pub async fn subscribe_tasks(
    client: &Client,
    subject: &str,
    group: &str,
) -> Result<Subscriber, BusError> {
    let subscriber = client
        .queue_subscribe(subject.to_string(), group.to_string())
        .await?;
    tracing::info!("Pulling crawl tasks from '{}' as group '{}'", subject, group);
    Ok(subscriber)
}

/// Outbound sink publishing task messages onto one subject
pub struct NatsTaskSink {
    client: Client,
    subject: String,
}

impl NatsTaskSink {
    pub fn new(client: Client, subject: impl Into<String>) -> Self {
        Self {
            client,
            subject: subject.into(),
        }
    }
}

#[async_trait]
impl TaskSink for NatsTaskSink {
    async fn send(&self, message: &TaskMessage) -> Result<(), BusError> {
        tracing::debug!(
            "Sending crawl announcement for {} (depth {}) on '{}'",
            message.url,
            message.depth,
            self.subject
        );
        self.client
            .publish(self.subject.clone(), message.encode()?)
            .await?;
        Ok(())
    }
}

/// Drains the delegation subject and republishes every payload unchanged
/// onto the task subject
///
/// Workers send discovered links here with the incremented depth already
/// set, so repeating is a straight byte-for-byte republish; the first free
/// worker in the queue group picks each one up. Runs until the subscription
/// ends.
pub async fn run_repeater(
    client: &Client,
    delegation_subject: &str,
    task_subject: &str,
) -> Result<(), BusError> {
    let mut subscriber = client.subscribe(delegation_subject.to_string()).await?;
    tracing::info!(
        "Repeating delegated tasks from '{}' onto '{}'",
        delegation_subject,
        task_subject
    );

    while let Some(message) = subscriber.next().await {
        tracing::debug!("Repeater message received on '{}'", delegation_subject);
        if let Err(error) = client
            .publish(task_subject.to_string(), message.payload)
            .await
        {
            // Best-effort channel: the delegated task is lost.
            tracing::error!("Failed to repeat delegated task: {}", error);
        }
    }

    Ok(())
}
