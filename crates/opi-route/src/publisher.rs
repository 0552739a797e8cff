use async_trait::async_trait;
use tracing::debug;

use crate::error::RouteError;

/// Subject route registrations are published on.
pub const REGISTER_SUBJECT: &str = "router.register";

/// Fire-and-forget message sink.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, subject: &str, payload: &[u8]) -> Result<(), RouteError>;
}

/// Publishes by POSTing the payload to `{endpoint}/v1/publish/{subject}`.
#[derive(Debug, Clone)]
pub struct HttpPublisher {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpPublisher {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl Publisher for HttpPublisher {
    async fn publish(&self, subject: &str, payload: &[u8]) -> Result<(), RouteError> {
        let response = self
            .client
            .post(format!("{}/v1/publish/{}", self.endpoint, subject))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload.to_vec())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RouteError::Rejected(format!("{status}: {body}")));
        }
        Ok(())
    }
}

/// Writes every message to the debug log; for setups without a router.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPublisher;

#[async_trait]
impl Publisher for LogPublisher {
    async fn publish(&self, subject: &str, payload: &[u8]) -> Result<(), RouteError> {
        debug!(subject, payload = %String::from_utf8_lossy(payload), "route message");
        Ok(())
    }
}
