//! Hosted generative model access.
//!
//! A single [`LlmClient`] fronts one of two interchangeable backends
//! (Gemini developer API or Vertex AI) selected from configuration at
//! startup. The process-wide instance is created once through [`init`].

pub mod client;

pub use client::{
    global, init, GeminiBackend, LlmClient, LlmConfig, LlmError, LlmProvider, ModelBackend,
    VertexBackend,
};
