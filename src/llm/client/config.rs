//! Model client configuration.
//!
//! Generation parameters (model, token limit, temperature, content budget)
//! are fixed per deployment and live in the config file. Credentials come
//! from the environment and are never serialized back out.
//!
//! Env vars: SOVEREIGN_LLM_PROVIDER, SOVEREIGN_LLM_MODEL, GEMINI_API_KEY,
//! GOOGLE_CLOUD_PROJECT, VERTEX_ACCESS_TOKEN, SOVEREIGN_LLM_ENDPOINT

use serde::{Deserialize, Serialize};

use super::LlmError;

/// Model backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Gemini developer API, authenticated with an API key.
    Gemini,
    /// Vertex AI enterprise endpoint, authenticated with an OAuth access token.
    Vertex,
}

impl LlmProvider {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "gemini" | "google" | "api-key" => Some(Self::Gemini),
            "vertex" | "vertexai" | "vertex-ai" => Some(Self::Vertex),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Vertex => "vertex",
        }
    }
}

/// Location the Vertex backend always routes through. Regional routing
/// rejects the default model, so this is not configurable.
pub const VERTEX_LOCATION: &str = "global";

/// Configuration for the model client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Explicit backend. When unset the backend is inferred (see `resolved_provider`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<LlmProvider>,
    /// Model name (default: gemini-2.0-flash)
    #[serde(default = "default_model")]
    pub model: String,
    /// Maximum tokens in response
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    /// Temperature for generation (0.0 - 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum characters of source text interpolated into a prompt
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Google Cloud project for the Vertex backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// Requested Vertex location. Anything other than `global` is ignored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Base URL override (for proxies and tests)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Gemini API key (env only)
    #[serde(skip)]
    pub api_key: Option<String>,
    /// Vertex OAuth access token (env only)
    #[serde(skip)]
    pub access_token: Option<String>,
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_max_output_tokens() -> u32 {
    8192
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_content_chars() -> usize {
    20_000
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: None,
            model: default_model(),
            max_output_tokens: default_max_output_tokens(),
            temperature: default_temperature(),
            max_content_chars: default_max_content_chars(),
            request_timeout_secs: default_request_timeout_secs(),
            project: None,
            location: None,
            endpoint: None,
            api_key: None,
            access_token: None,
        }
    }
}

impl LlmConfig {
    /// Apply environment variable overrides on top of file configuration.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(provider) = std::env::var("SOVEREIGN_LLM_PROVIDER")
            .ok()
            .and_then(|v| LlmProvider::from_str(&v))
        {
            self.provider = Some(provider);
        }
        if let Ok(model) = std::env::var("SOVEREIGN_LLM_MODEL") {
            self.model = model;
        }
        if let Ok(endpoint) = std::env::var("SOVEREIGN_LLM_ENDPOINT") {
            self.endpoint = Some(endpoint);
        }
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            self.api_key = Some(key);
        }
        if let Ok(project) = std::env::var("GOOGLE_CLOUD_PROJECT") {
            self.project = Some(project);
        }
        if let Ok(token) = std::env::var("VERTEX_ACCESS_TOKEN") {
            self.access_token = Some(token);
        }
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = Some(endpoint.to_string());
        self
    }

    /// Backend to use: explicit provider wins, then Vertex when a project
    /// is configured, otherwise Gemini.
    pub fn resolved_provider(&self) -> LlmProvider {
        match self.provider {
            Some(provider) => provider,
            None if self.project.is_some() => LlmProvider::Vertex,
            None => LlmProvider::Gemini,
        }
    }

    /// Reject settings the backends cannot honor.
    pub fn validate(&self) -> Result<(), LlmError> {
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(LlmError::Config(format!(
                "temperature must be within [0, 1], got {}",
                self.temperature
            )));
        }
        if self.model.trim().is_empty() {
            return Err(LlmError::Config("model name is empty".to_string()));
        }
        if self.max_output_tokens == 0 {
            return Err(LlmError::Config("max_output_tokens must be positive".to_string()));
        }
        if self.resolved_provider() == LlmProvider::Vertex && self.project.is_none() {
            return Err(LlmError::Config(
                "vertex backend requires a project (GOOGLE_CLOUD_PROJECT)".to_string(),
            ));
        }
        Ok(())
    }

    /// Provider-aware hint for missing credentials.
    pub fn availability_hint(&self) -> String {
        match self.resolved_provider() {
            LlmProvider::Gemini if self.api_key.is_none() => {
                "GEMINI_API_KEY not set. Get an API key from https://ai.google.dev/".to_string()
            }
            LlmProvider::Vertex if self.access_token.is_none() => {
                "VERTEX_ACCESS_TOKEN not set. Run: gcloud auth print-access-token".to_string()
            }
            provider => format!("{} backend configured (model: {})", provider.as_str(), self.model),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LlmConfig::default();
        assert_eq!(config.max_content_chars, 20_000);
        assert_eq!(config.resolved_provider(), LlmProvider::Gemini);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_provider_resolution() {
        let mut config = LlmConfig {
            project: Some("acme-prod".to_string()),
            ..Default::default()
        };
        assert_eq!(config.resolved_provider(), LlmProvider::Vertex);

        config.provider = Some(LlmProvider::Gemini);
        assert_eq!(config.resolved_provider(), LlmProvider::Gemini);
    }

    #[test]
    fn test_temperature_out_of_range() {
        let config = LlmConfig {
            temperature: 1.5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(LlmError::Config(_))));
    }

    #[test]
    fn test_vertex_requires_project() {
        let config = LlmConfig {
            provider: Some(LlmProvider::Vertex),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_credentials_not_serialized() {
        let config = LlmConfig {
            api_key: Some("secret".to_string()),
            ..Default::default()
        };
        let toml = toml::to_string(&config).unwrap();
        assert!(!toml.contains("secret"));

        let parsed: LlmConfig = toml::from_str("model = \"gemini-1.5-pro\"").unwrap();
        assert_eq!(parsed.model, "gemini-1.5-pro");
        assert_eq!(parsed.max_output_tokens, 8192);
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!(LlmProvider::from_str("Vertex-AI"), Some(LlmProvider::Vertex));
        assert_eq!(LlmProvider::from_str("gemini"), Some(LlmProvider::Gemini));
        assert_eq!(LlmProvider::from_str("ollama"), None);
    }
}
