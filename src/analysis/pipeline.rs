//! Extract -> prompt -> generate -> normalize -> decode.

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, info};

use super::extractor::{ExtractionError, SourceKind, TextExtractor};
use super::normalize::normalize;
use super::prompts::{PromptBuilder, PromptTemplate};
use super::results::{AnalysisResult, TemplateOutput};
use super::AnalysisError;
use crate::llm::LlmClient;

/// One unit of analysis work. Lives only for the request that built it.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub source_text: String,
    pub source_kind: SourceKind,
    pub template: PromptTemplate,
    /// Extra template variables, such as `tone`.
    pub vars: Vec<(String, String)>,
}

impl AnalysisRequest {
    /// Request over text supplied directly by the caller.
    pub fn from_text(text: impl Into<String>, template: PromptTemplate) -> Self {
        Self {
            source_text: text.into(),
            source_kind: SourceKind::RawString,
            template,
            vars: Vec::new(),
        }
    }

    pub fn with_var(mut self, name: &str, value: impl Into<String>) -> Self {
        self.vars.push((name.to_string(), value.into()));
        self
    }
}

/// The document analysis pipeline shared by every engine.
#[derive(Clone)]
pub struct AnalysisPipeline {
    extractor: TextExtractor,
    builder: PromptBuilder,
    llm: Arc<LlmClient>,
}

impl AnalysisPipeline {
    pub fn new(llm: Arc<LlmClient>) -> Self {
        let builder = PromptBuilder::new(llm.config().max_content_chars);
        Self {
            extractor: TextExtractor::new(),
            builder,
            llm,
        }
    }

    pub fn llm(&self) -> &LlmClient {
        &self.llm
    }

    /// Extract text from an upload on the blocking pool.
    pub async fn extract(
        &self,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> Result<(String, SourceKind), AnalysisError> {
        let kind = SourceKind::from_mime(mime_type)
            .ok_or_else(|| ExtractionError::UnsupportedFileType(mime_type.to_string()))?;

        let extractor = self.extractor.clone();
        let mime = mime_type.to_string();
        let text = tokio::task::spawn_blocking(move || extractor.extract(&bytes, &mime))
            .await
            .map_err(|e| ExtractionError::ExtractionFailed(format!("extraction task failed: {}", e)))??;

        debug!("Extracted {} chars from {} upload", text.chars().count(), kind.as_str());
        Ok((text, kind))
    }

    /// Build a request from an uploaded file.
    pub async fn request_from_file(
        &self,
        bytes: Vec<u8>,
        mime_type: &str,
        template: PromptTemplate,
    ) -> Result<AnalysisRequest, AnalysisError> {
        let (source_text, source_kind) = self.extract(bytes, mime_type).await?;
        Ok(AnalysisRequest {
            source_text,
            source_kind,
            template,
            vars: Vec::new(),
        })
    }

    /// Run the model and return the normalized JSON without decoding it.
    pub async fn run_raw(&self, request: &AnalysisRequest) -> Result<Value, AnalysisError> {
        if request.source_text.trim().is_empty() {
            return Err(AnalysisError::Validation(format!(
                "no text to analyze ({} source)",
                request.source_kind.as_str()
            )));
        }

        let vars: Vec<(&str, &str)> = request
            .vars
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let prompt = self
            .builder
            .build_with(request.template, &request.source_text, &vars);

        let start = Instant::now();
        let raw = self.llm.generate(&prompt).await?;
        info!(
            "{} analysis via {} finished in {:.1}s",
            request.template.as_str(),
            self.llm.backend_name(),
            start.elapsed().as_secs_f64()
        );

        normalize(&raw)
    }

    /// Run a request and decode into the template's result variant.
    pub async fn run(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        let value = self.run_raw(request).await?;
        AnalysisResult::from_value(request.template, value)
    }

    /// Run a template over raw text, decoding straight into its result type.
    pub async fn run_typed<T: TemplateOutput>(
        &self,
        text: &str,
        vars: &[(&str, &str)],
    ) -> Result<T, AnalysisError> {
        let request = vars.iter().fold(
            AnalysisRequest::from_text(text, T::TEMPLATE),
            |req, (k, v)| req.with_var(k, *v),
        );
        let value = self.run_raw(&request).await?;
        T::from_value(value)
    }
}
