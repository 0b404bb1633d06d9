//! Vertex AI enterprise backend.
//!
//! Addresses the model through a project/location/model triple and
//! authenticates with an OAuth bearer token (VERTEX_ACCESS_TOKEN). The
//! location is pinned to `global`.

use async_trait::async_trait;
use reqwest::Client;
use tracing::warn;

use super::config::VERTEX_LOCATION;
use super::generate_content::{self, GenerateRequest};
use super::{LlmConfig, LlmError, ModelBackend};

const DEFAULT_BASE_URL: &str = "https://aiplatform.googleapis.com";

/// Vertex AI backend.
pub struct VertexBackend {
    client: Client,
    base_url: String,
    project: String,
    access_token: Option<String>,
    model: String,
    temperature: f32,
    max_output_tokens: u32,
}

impl VertexBackend {
    pub fn new(config: &LlmConfig, client: Client) -> Result<Self, LlmError> {
        let project = config.project.clone().ok_or_else(|| {
            LlmError::Config("vertex backend requires a project (GOOGLE_CLOUD_PROJECT)".to_string())
        })?;

        if let Some(location) = config.location.as_deref() {
            if location != VERTEX_LOCATION {
                warn!(
                    "Ignoring Vertex location '{}': requests are routed through '{}'",
                    location, VERTEX_LOCATION
                );
            }
        }

        Ok(Self {
            client,
            base_url: config
                .endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            project,
            access_token: config.access_token.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.project,
            VERTEX_LOCATION,
            self.model
        )
    }
}

#[async_trait]
impl ModelBackend for VertexBackend {
    fn name(&self) -> &str {
        "vertex"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let token = self.access_token.as_ref().ok_or_else(|| {
            LlmError::Unavailable(
                "VERTEX_ACCESS_TOKEN not set. Run: gcloud auth print-access-token".to_string(),
            )
        })?;

        let request = GenerateRequest::new(prompt, self.temperature, self.max_output_tokens);
        let builder = self
            .client
            .post(self.url())
            .bearer_auth(token)
            .json(&request);

        generate_content::send("vertex", builder).await
    }
}
