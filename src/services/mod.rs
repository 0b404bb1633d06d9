//! Service layer for Sovereign business logic.
//!
//! Each engine wraps the analysis pipeline with persistence and
//! notifications. Services are used by both the HTTP server and the CLI.

pub mod forge;
pub mod insights;
pub mod radar;
pub mod shield;

use thiserror::Error;

use crate::analysis::AnalysisError;
use crate::models::{TransitionError, ValidationError};
use crate::repository::DbError;

pub use forge::{ForgeService, IssuedTestimonial, TestimonialInvite};
pub use insights::{mine_assets, rnd_audit};
pub use radar::RadarService;
pub use shield::ShieldService;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use serde_json::Value;

    use crate::analysis::AnalysisPipeline;
    use crate::llm::{LlmClient, LlmConfig, LlmError, ModelBackend};
    use crate::notify::{EventName, EventPublisher, NotifyError};

    /// Model backend that answers every prompt with a fixed reply.
    pub struct ScriptedBackend {
        reply: Result<String, String>,
        pub prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ModelBackend for ScriptedBackend {
        fn name(&self) -> &str {
            "scripted"
        }

        fn model(&self) -> &str {
            "scripted-1"
        }

        async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone().map_err(LlmError::Unavailable)
        }
    }

    pub fn scripted_llm(reply: Result<&str, &str>) -> (Arc<LlmClient>, Arc<ScriptedBackend>) {
        let backend = Arc::new(ScriptedBackend {
            reply: reply.map(String::from).map_err(String::from),
            prompts: Mutex::new(Vec::new()),
        });
        let client = LlmClient::with_backend(LlmConfig::default(), backend.clone());
        (Arc::new(client), backend)
    }

    pub fn scripted_pipeline(reply: Result<&str, &str>) -> (AnalysisPipeline, Arc<ScriptedBackend>) {
        let (llm, backend) = scripted_llm(reply);
        (AnalysisPipeline::new(llm), backend)
    }

    #[derive(Default)]
    pub struct RecordingPublisher(pub Mutex<Vec<(String, EventName, Value)>>);

    impl RecordingPublisher {
        pub fn events(&self) -> Vec<EventName> {
            self.0.lock().unwrap().iter().map(|(_, e, _)| *e).collect()
        }
    }

    #[async_trait]
    impl EventPublisher for RecordingPublisher {
        fn name(&self) -> &str {
            "recording"
        }

        async fn publish(
            &self,
            channel: &str,
            event: EventName,
            payload: &Value,
        ) -> Result<(), NotifyError> {
            self.0
                .lock()
                .unwrap()
                .push((channel.to_string(), event, payload.clone()));
            Ok(())
        }
    }

    pub struct FailingPublisher;

    #[async_trait]
    impl EventPublisher for FailingPublisher {
        fn name(&self) -> &str {
            "failing"
        }

        async fn publish(&self, _: &str, _: EventName, _: &Value) -> Result<(), NotifyError> {
            Err(NotifyError::Transport("connection reset".to_string()))
        }
    }
}
