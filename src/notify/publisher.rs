//! Event transports.

use std::time::Duration;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde_json::{json, Value};
use sha2::Sha256;
use tracing::{debug, info};

use super::{EventName, NotifyError};

pub const SIGNATURE_HEADER: &str = "X-Sovereign-Signature";

/// Delivers one event to one channel.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    fn name(&self) -> &str;

    async fn publish(
        &self,
        channel: &str,
        event: EventName,
        payload: &Value,
    ) -> Result<(), NotifyError>;
}

/// Hex HMAC-SHA256 of a request body.
pub fn sign_body(secret: &str, body: &[u8]) -> Result<String, NotifyError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| NotifyError::Config(e.to_string()))?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// POSTs `{channel, event, data}` to a pub/sub REST endpoint.
pub struct HttpPublisher {
    client: Client,
    endpoint: String,
    secret: String,
}

impl HttpPublisher {
    pub fn new(endpoint: &str, secret: &str, timeout_secs: u64) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| NotifyError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            secret: secret.to_string(),
        })
    }
}

#[async_trait]
impl EventPublisher for HttpPublisher {
    fn name(&self) -> &str {
        "http"
    }

    async fn publish(
        &self,
        channel: &str,
        event: EventName,
        payload: &Value,
    ) -> Result<(), NotifyError> {
        let body = serde_json::to_vec(&json!({
            "channel": channel,
            "event": event.as_str(),
            "data": payload,
        }))
        .map_err(|e| NotifyError::Transport(e.to_string()))?;
        let signature = sign_body(&self.secret, &body)?;

        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(SIGNATURE_HEADER, signature)
            .body(body)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!("Published {} to {}", event.as_str(), channel);
        Ok(())
    }
}

/// Used when no pub/sub endpoint is configured.
pub struct LogPublisher;

#[async_trait]
impl EventPublisher for LogPublisher {
    fn name(&self) -> &str {
        "log"
    }

    async fn publish(
        &self,
        channel: &str,
        event: EventName,
        payload: &Value,
    ) -> Result<(), NotifyError> {
        info!("event {} on {}: {}", event.as_str(), channel, payload);
        Ok(())
    }
}
