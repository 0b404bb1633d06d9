//! Document analysis pipeline.
//!
//! Turns an upload or raw text into a typed analysis result:
//! - `extractor`: bytes + MIME type to plain text (pdftotext, DOCX, UTF-8)
//! - `prompts`: templates rendered with a bounded slice of the text
//! - `normalize`: fence stripping and strict JSON parsing of model output
//! - `results`: per-template result types with field validation
//!
//! `AnalysisPipeline` wires these together around the model client.

mod extractor;
mod normalize;
mod pipeline;
mod prompts;
mod results;

use thiserror::Error;

use crate::llm::LlmError;

pub use extractor::{ExtractionError, SourceKind, TextExtractor, MIME_DOCX, MIME_PDF, MIME_TEXT};
pub use normalize::{normalize, strip_code_fences};
pub use pipeline::{AnalysisPipeline, AnalysisRequest};
pub use prompts::{truncate_chars, PromptBuilder, PromptTemplate, DEFAULT_MAX_CONTENT_CHARS};
pub use results::{
    AnalysisResult, AssetKind, AssetMining, Clause, ClientSentiment, ContractAnalysis,
    MinedAsset, NegotiationEmail, QualifyingActivity, RiskLevel, RndCreditAudit,
    ScopeCreepCheck, SentimentRadar, SentimentStatus, TemplateOutput,
};

/// Errors from any pipeline stage.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Model(#[from] LlmError),

    #[error("Invalid AI response: {0}")]
    InvalidAiResponse(String),

    #[error("Validation error: {0}")]
    Validation(String),
}
