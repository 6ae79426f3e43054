use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification channel failed: {0}")]
    Channel(String),
}

/// Outbound dispatch channel. Fire-and-forget: a failed notification is
/// logged by the caller and never affects order state.
#[async_trait]
pub trait DispatchNotifier: Send + Sync {
    async fn notify(&self, summary: &str) -> Result<(), NotifyError>;
}

/// Default channel: the operator tails the service log.
pub struct LogNotifier;

#[async_trait]
impl DispatchNotifier for LogNotifier {
    async fn notify(&self, summary: &str) -> Result<(), NotifyError> {
        info!(target: "dispatch", "{summary}");
        Ok(())
    }
}

/// Forwards summaries to an operator webhook (chat bridge, pager, ...).
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: String, timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| NotifyError::Channel(err.to_string()))?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl DispatchNotifier for WebhookNotifier {
    async fn notify(&self, summary: &str) -> Result<(), NotifyError> {
        self.client
            .post(&self.url)
            .json(&json!({ "text": summary }))
            .send()
            .await
            .map_err(|err| NotifyError::Channel(err.to_string()))?
            .error_for_status()
            .map_err(|err| NotifyError::Channel(err.to_string()))?;
        Ok(())
    }
}
