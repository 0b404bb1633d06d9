//! Model client for document analysis.
//!
//! Supports the Gemini developer API and Vertex AI. Both speak the same
//! `generateContent` contract; the client picks one at construction time.

mod config;
mod gemini;
mod generate_content;
mod vertex;

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, info, warn};

pub use config::{LlmConfig, LlmProvider, VERTEX_LOCATION};
pub use gemini::GeminiBackend;
pub use vertex::VertexBackend;

/// Errors that can occur during model calls.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Transport failure, missing credentials or rejected credentials.
    #[error("Model unavailable: {0}")]
    Unavailable(String),
    /// The model endpoint answered with an error.
    #[error("Model error: {0}")]
    Api(String),
    /// Configuration cannot produce a working client.
    #[error("Invalid model configuration: {0}")]
    Config(String),
}

/// A hosted model that turns a prompt into raw text.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Short backend identifier for logs.
    fn name(&self) -> &str;

    /// Model the backend calls.
    fn model(&self) -> &str;

    /// Send one prompt. No retries: failures propagate immediately.
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Model client shared by all analysis engines.
pub struct LlmClient {
    config: LlmConfig,
    backend: Arc<dyn ModelBackend>,
}

impl LlmClient {
    /// Build the backend selected by configuration.
    pub fn from_config(config: LlmConfig) -> Result<Self, LlmError> {
        config.validate()?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| LlmError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let backend: Arc<dyn ModelBackend> = match config.resolved_provider() {
            LlmProvider::Gemini => Arc::new(GeminiBackend::new(&config, http)),
            LlmProvider::Vertex => Arc::new(VertexBackend::new(&config, http)?),
        };

        info!(
            "Model client ready: backend={} model={}",
            backend.name(),
            backend.model()
        );
        Ok(Self { config, backend })
    }

    /// Wrap an existing backend.
    pub fn with_backend(config: LlmConfig, backend: Arc<dyn ModelBackend>) -> Self {
        Self { config, backend }
    }

    /// Get the config.
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Send a rendered prompt and return the raw model output.
    pub async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        debug!(
            "Calling {} ({} prompt chars)",
            self.backend.name(),
            prompt.chars().count()
        );
        self.backend.generate(prompt).await
    }
}

static GLOBAL_CLIENT: OnceLock<Arc<LlmClient>> = OnceLock::new();

/// Initialize the process-wide model client.
///
/// The first successful call wins; later calls return the existing client
/// and ignore their configuration.
pub fn init(config: LlmConfig) -> Result<Arc<LlmClient>, LlmError> {
    if let Some(existing) = GLOBAL_CLIENT.get() {
        warn!("Model client already initialized; ignoring new configuration");
        return Ok(existing.clone());
    }

    let client = Arc::new(LlmClient::from_config(config)?);
    Ok(GLOBAL_CLIENT.get_or_init(|| client).clone())
}

/// The process-wide model client, if [`init`] has run.
pub fn global() -> Option<Arc<LlmClient>> {
    GLOBAL_CLIENT.get().cloned()
}
