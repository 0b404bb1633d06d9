//! Realtime notifications.
//!
//! Events go to `private-user-<id>` channels on a hosted pub/sub service.
//! Publishing is best-effort: transport failures are logged and dropped so
//! they never change the outcome of the request that triggered them.
//!
//! Env vars: PUBSUB_ENDPOINT, PUBSUB_APP_KEY, PUBSUB_APP_SECRET

mod channel;
mod publisher;

use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

pub use channel::{
    authorize_channel, channel_for_user, sign_channel, ChannelAuthError, USER_CHANNEL_PREFIX,
};
pub use publisher::{sign_body, EventPublisher, HttpPublisher, LogPublisher, SIGNATURE_HEADER};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Publish failed: {0}")]
    Transport(String),

    #[error("Pub/sub rejected event ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Invalid notifier configuration: {0}")]
    Config(String),
}

/// Events clients subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventName {
    ContractAnalyzed,
    ContractUpdated,
    ClientUpdated,
    TestimonialReceived,
    NotificationNew,
    ScopeCreepDetected,
}

impl EventName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ContractAnalyzed => "contract-analyzed",
            Self::ContractUpdated => "contract-updated",
            Self::ClientUpdated => "client-updated",
            Self::TestimonialReceived => "testimonial-received",
            Self::NotificationNew => "notification-new",
            Self::ScopeCreepDetected => "scope-creep-detected",
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Pub/sub REST endpoint. Events are only logged when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Public app key, echoed in channel auth signatures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Signing secret (env only)
    #[serde(skip)]
    pub app_secret: Option<String>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            app_key: None,
            timeout_secs: default_timeout_secs(),
            app_secret: None,
        }
    }
}

impl NotifyConfig {
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(endpoint) = std::env::var("PUBSUB_ENDPOINT") {
            self.endpoint = Some(endpoint);
        }
        if let Ok(key) = std::env::var("PUBSUB_APP_KEY") {
            self.app_key = Some(key);
        }
        if let Ok(secret) = std::env::var("PUBSUB_APP_SECRET") {
            self.app_secret = Some(secret);
        }
        self
    }
}

/// Publishes events and signs channel subscriptions.
pub struct Notifier {
    publisher: Arc<dyn EventPublisher>,
    app_key: Option<String>,
    app_secret: Option<String>,
}

impl Notifier {
    pub fn from_config(config: &NotifyConfig) -> Result<Self, NotifyError> {
        let publisher: Arc<dyn EventPublisher> = match &config.endpoint {
            Some(endpoint) => {
                let secret = config.app_secret.as_deref().ok_or_else(|| {
                    NotifyError::Config("PUBSUB_APP_SECRET is required with an endpoint".into())
                })?;
                Arc::new(HttpPublisher::new(endpoint, secret, config.timeout_secs)?)
            }
            None => Arc::new(LogPublisher),
        };
        info!("Notifier ready: publisher={}", publisher.name());

        Ok(Self {
            publisher,
            app_key: config.app_key.clone(),
            app_secret: config.app_secret.clone(),
        })
    }

    pub fn with_publisher(publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            publisher,
            app_key: None,
            app_secret: None,
        }
    }

    pub fn with_credentials(mut self, key: &str, secret: &str) -> Self {
        self.app_key = Some(key.to_string());
        self.app_secret = Some(secret.to_string());
        self
    }

    /// Best-effort publish. Never fails.
    pub async fn publish(&self, channel: &str, event: EventName, payload: Value) {
        if let Err(e) = self.publisher.publish(channel, event, &payload).await {
            warn!("Failed to publish {} to {}: {}", event.as_str(), channel, e);
        }
    }

    /// Publish on the user's private channel.
    pub async fn notify_user(&self, user_id: &str, event: EventName, payload: Value) {
        self.publish(&channel_for_user(user_id), event, payload).await
    }

    /// Sign a subscription request for the caller's own channel.
    pub fn authorize(
        &self,
        user_id: &str,
        socket_id: &str,
        channel: &str,
    ) -> Result<String, ChannelAuthError> {
        let (Some(key), Some(secret)) = (self.app_key.as_deref(), self.app_secret.as_deref())
        else {
            return Err(ChannelAuthError::NotConfigured);
        };
        authorize_channel(user_id, socket_id, channel, key, secret)
    }
}

static GLOBAL_NOTIFIER: OnceLock<Arc<Notifier>> = OnceLock::new();

/// Initialize the process-wide notifier. The first call wins.
pub fn init(config: &NotifyConfig) -> Result<Arc<Notifier>, NotifyError> {
    if let Some(existing) = GLOBAL_NOTIFIER.get() {
        warn!("Notifier already initialized; ignoring new configuration");
        return Ok(existing.clone());
    }

    let notifier = Arc::new(Notifier::from_config(config)?);
    Ok(GLOBAL_NOTIFIER.get_or_init(|| notifier).clone())
}

pub fn global() -> Option<Arc<Notifier>> {
    GLOBAL_NOTIFIER.get().cloned()
}
