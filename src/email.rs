//! Transactional email.
//!
//! Env vars: EMAIL_ENDPOINT, EMAIL_API_KEY, EMAIL_FROM

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email send failed: {0}")]
    Transport(String),

    #[error("Email service rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Invalid email configuration: {0}")]
    Config(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    fn name(&self) -> &str;

    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError>;
}

fn default_from() -> String {
    "Sovereign <no-reply@sovereign.app>".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Email API endpoint. Messages are only logged when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default = "default_from")]
    pub from: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// API key (env only)
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            from: default_from(),
            timeout_secs: default_timeout_secs(),
            api_key: None,
        }
    }
}

impl EmailConfig {
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(endpoint) = std::env::var("EMAIL_ENDPOINT") {
            self.endpoint = Some(endpoint);
        }
        if let Ok(key) = std::env::var("EMAIL_API_KEY") {
            self.api_key = Some(key);
        }
        if let Ok(from) = std::env::var("EMAIL_FROM") {
            self.from = from;
        }
        self
    }

    /// Build the sender this configuration describes.
    pub fn build_sender(&self) -> Result<Arc<dyn EmailSender>, EmailError> {
        let sender: Arc<dyn EmailSender> = match &self.endpoint {
            Some(endpoint) => Arc::new(HttpMailer::new(self, endpoint)?),
            None => Arc::new(LogMailer),
        };
        info!("Email sender ready: {}", sender.name());
        Ok(sender)
    }
}

/// Sends through a JSON email API (`{from, to, subject, html}`, bearer auth).
pub struct HttpMailer {
    client: Client,
    endpoint: String,
    api_key: String,
    from: String,
}

impl HttpMailer {
    pub fn new(config: &EmailConfig, endpoint: &str) -> Result<Self, EmailError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| EmailError::Config("EMAIL_API_KEY is required with an endpoint".into()))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmailError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key,
            from: config.from.clone(),
        })
    }
}

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

#[async_trait]
impl EmailSender for HttpMailer {
    fn name(&self) -> &str {
        "http"
    }

    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&SendRequest {
                from: &self.from,
                to: &message.to,
                subject: &message.subject,
                html: &message.html,
            })
            .send()
            .await
            .map_err(|e| EmailError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        debug!("Sent email to {}", message.to);
        Ok(())
    }
}

/// Logs messages instead of sending them.
pub struct LogMailer;

#[async_trait]
impl EmailSender for LogMailer {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        info!("email to {}: {}", message.to, message.subject);
        Ok(())
    }
}

/// Send and log any failure. Returns whether the message went out.
pub async fn send_best_effort(sender: &dyn EmailSender, message: &EmailMessage) -> bool {
    match sender.send(message).await {
        Ok(()) => true,
        Err(e) => {
            warn!("Failed to send email to {}: {}", message.to, e);
            false
        }
    }
}
