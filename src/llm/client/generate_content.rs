//! `generateContent` wire format shared by the Gemini and Vertex backends.

use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::LlmError;

#[derive(Debug, Serialize)]
pub(super) struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

impl GenerateRequest {
    pub(super) fn new(prompt: &str, temperature: f32, max_output_tokens: u32) -> Self {
        Self {
            contents: vec![Content {
                role: "user",
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature,
                max_output_tokens,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl GenerateResponse {
    /// Concatenate the text parts of the first candidate.
    pub(super) fn into_text(self) -> Result<String, LlmError> {
        if let Some(error) = self.error {
            return Err(LlmError::Api(error.message));
        }

        let text: String = self
            .candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(LlmError::Api("model returned no candidates".to_string()));
        }
        Ok(text)
    }
}

/// Send a prepared request and decode the model output.
pub(super) async fn send(backend: &str, request: RequestBuilder) -> Result<String, LlmError> {
    let resp = request
        .send()
        .await
        .map_err(|e| LlmError::Unavailable(format!("{}: {}", backend, e)))?;

    let status = resp.status();
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        let body = resp.text().await.unwrap_or_default();
        return Err(LlmError::Unavailable(format!(
            "{} rejected credentials (HTTP {}): {}",
            backend, status, body
        )));
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(LlmError::Api(format!("{} HTTP {}: {}", backend, status, body)));
    }

    let parsed: GenerateResponse = resp
        .json()
        .await
        .map_err(|e| LlmError::Api(format!("{}: malformed response: {}", backend, e)))?;

    let text = parsed.into_text()?;
    debug!("{} returned {} chars", backend, text.len());
    Ok(text)
}
