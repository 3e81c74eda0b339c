//! Outbound notification publishers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::PublishError;

/// Delivers notifications of type `M` to a peer service.
///
/// Delivery is at-most-once from the caller's point of view: an `Err` means
/// the peer may or may not have applied the message, and nothing retries it.
#[async_trait]
pub trait Publisher<M>: Send + Sync
where
    M: Send + 'static,
{
    /// Publishes a single message.
    async fn publish(&self, message: M) -> Result<(), PublishError>;
}

#[async_trait]
impl<M, P> Publisher<M> for Arc<P>
where
    M: Send + 'static,
    P: Publisher<M> + ?Sized,
{
    async fn publish(&self, message: M) -> Result<(), PublishError> {
        (**self).publish(message).await
    }
}

/// Publishes messages as JSON `POST` requests to a fixed webhook URL.
#[derive(Debug, Clone)]
pub struct HttpPublisher {
    client: reqwest::Client,
    url: String,
}

impl HttpPublisher {
    /// Creates a publisher with its own client and request timeout.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, PublishError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, url))
    }

    /// Creates a publisher sharing an existing client.
    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Returns the webhook URL messages are posted to.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl<M> Publisher<M> for HttpPublisher
where
    M: Serialize + Send + Sync + 'static,
{
    async fn publish(&self, message: M) -> Result<(), PublishError> {
        let response = self.client.post(&self.url).json(&message).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Status {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(url = %self.url, status = status.as_u16(), "notification delivered");
        Ok(())
    }
}

#[derive(Debug)]
struct InMemoryPublisherState<M> {
    sent: Vec<M>,
    fail_on_publish: bool,
}

/// Records published messages in memory. Used by tests and local wiring.
#[derive(Debug)]
pub struct InMemoryPublisher<M> {
    state: Arc<RwLock<InMemoryPublisherState<M>>>,
}

impl<M> Clone for InMemoryPublisher<M> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<M> Default for InMemoryPublisher<M> {
    fn default() -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryPublisherState {
                sent: Vec::new(),
                fail_on_publish: false,
            })),
        }
    }
}

impl<M: Clone> InMemoryPublisher<M> {
    /// Creates a new in-memory publisher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the publisher to reject subsequent messages.
    pub async fn set_fail_on_publish(&self, fail: bool) {
        self.state.write().await.fail_on_publish = fail;
    }

    /// Returns a copy of every message accepted so far.
    pub async fn sent(&self) -> Vec<M> {
        self.state.read().await.sent.clone()
    }

    /// Returns the number of messages accepted so far.
    pub async fn sent_count(&self) -> usize {
        self.state.read().await.sent.len()
    }
}

#[async_trait]
impl<M> Publisher<M> for InMemoryPublisher<M>
where
    M: Send + Sync + 'static,
{
    async fn publish(&self, message: M) -> Result<(), PublishError> {
        let mut state = self.state.write().await;

        if state.fail_on_publish {
            return Err(PublishError::Rejected("peer unavailable".to_string()));
        }

        state.sent.push(message);
        Ok(())
    }
}
