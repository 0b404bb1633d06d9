//! Gemini developer API backend.
//!
//! Authenticates with an API key (GEMINI_API_KEY) against the public
//! generative language endpoint.

use async_trait::async_trait;
use reqwest::Client;

use super::generate_content::{self, GenerateRequest};
use super::{LlmConfig, LlmError, ModelBackend};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini backend using a developer API key.
pub struct GeminiBackend {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    max_output_tokens: u32,
}

impl GeminiBackend {
    pub fn new(config: &LlmConfig, client: Client) -> Self {
        Self {
            client,
            base_url: config
                .endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        }
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl ModelBackend for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            LlmError::Unavailable(
                "GEMINI_API_KEY not set. Get an API key from https://ai.google.dev/".to_string(),
            )
        })?;

        let request = GenerateRequest::new(prompt, self.temperature, self.max_output_tokens);
        let builder = self
            .client
            .post(self.url())
            .header("x-goog-api-key", api_key)
            .json(&request);

        generate_content::send("gemini", builder).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url() {
        let config = LlmConfig::default().with_model("gemini-1.5-flash");
        let backend = GeminiBackend::new(&config, Client::new());
        assert_eq!(
            backend.url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[tokio::test]
    async fn test_missing_api_key_is_unavailable() {
        let backend = GeminiBackend::new(&LlmConfig::default(), Client::new());
        let err = backend.generate("hi").await.unwrap_err();
        assert!(matches!(err, LlmError::Unavailable(_)));
    }
}
