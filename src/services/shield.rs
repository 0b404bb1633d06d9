//! Shield: contract risk analysis, negotiation emails and scope checks.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info};

use super::ServiceError;
use crate::analysis::{
    truncate_chars, AnalysisPipeline, ContractAnalysis, NegotiationEmail, ScopeCreepCheck,
    DEFAULT_MAX_CONTENT_CHARS,
};
use crate::models::{Contract, NewContract, ValidationError};
use crate::notify::{EventName, Notifier};
use crate::repository::DbContext;

pub struct ShieldService {
    db: DbContext,
    pipeline: AnalysisPipeline,
    notifier: Arc<Notifier>,
}

impl ShieldService {
    pub fn new(db: DbContext, pipeline: AnalysisPipeline, notifier: Arc<Notifier>) -> Self {
        Self {
            db,
            pipeline,
            notifier,
        }
    }

    async fn owned_contract(&self, user_id: &str, contract_id: &str) -> Result<Contract, ServiceError> {
        self.db
            .contracts()
            .get(user_id, contract_id)
            .await?
            .ok_or(ServiceError::NotFound("contract"))
    }

    /// Store a draft contract. A linked client must belong to the caller.
    pub async fn create_contract(
        &self,
        user_id: &str,
        input: NewContract,
    ) -> Result<Contract, ServiceError> {
        input.validate()?;
        if let Some(client_id) = input.client_id.as_deref() {
            self.db
                .clients()
                .get(user_id, client_id)
                .await?
                .ok_or(ServiceError::NotFound("client"))?;
        }
        let contract = Contract::new(user_id, input);
        self.db.contracts().create(&contract).await?;

        self.notifier
            .notify_user(
                user_id,
                EventName::ContractUpdated,
                json!({ "contract_id": contract.id, "status": contract.status }),
            )
            .await;
        Ok(contract)
    }

    pub async fn get_contract(&self, user_id: &str, contract_id: &str) -> Result<Contract, ServiceError> {
        self.owned_contract(user_id, contract_id).await
    }

    pub async fn list_contracts(&self, user_id: &str) -> Result<Vec<Contract>, ServiceError> {
        Ok(self.db.contracts().list(user_id).await?)
    }

    /// Record that the contract was signed. Signing twice is a conflict.
    pub async fn sign_contract(&self, user_id: &str, contract_id: &str) -> Result<Contract, ServiceError> {
        let mut contract = self.owned_contract(user_id, contract_id).await?;
        if !contract.mark_signed() {
            return Err(ServiceError::Conflict("contract already signed".to_string()));
        }
        if !self.db.contracts().save(&contract).await? {
            return Err(ServiceError::NotFound("contract"));
        }

        self.notifier
            .notify_user(
                user_id,
                EventName::ContractUpdated,
                json!({ "contract_id": contract.id, "status": contract.status }),
            )
            .await;
        Ok(contract)
    }

    /// Analyze raw contract text.
    ///
    /// With a caller and a contract id the result is stored on that contract
    /// and `contract-analyzed` is published. The contract is checked before
    /// the model is called.
    pub async fn analyze_text(
        &self,
        user_id: Option<&str>,
        content: &str,
        contract_id: Option<&str>,
    ) -> Result<ContractAnalysis, ServiceError> {
        let target = match (user_id, contract_id) {
            (Some(user), Some(id)) => Some(self.owned_contract(user, id).await?),
            (None, Some(_)) => {
                return Err(ServiceError::Unauthorized(
                    "sign in to save an analysis to a contract".to_string(),
                ))
            }
            _ => None,
        };

        let analysis: ContractAnalysis = self.pipeline.run_typed(content, &[]).await?;

        if let Some(mut contract) = target {
            contract.record_analysis(analysis.clone());
            self.persist_and_notify(&contract).await?;
        }
        Ok(analysis)
    }

    /// Extract an uploaded contract, analyze it and store both text and result.
    pub async fn analyze_upload(
        &self,
        user_id: &str,
        contract_id: &str,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> Result<Contract, ServiceError> {
        let mut contract = self.owned_contract(user_id, contract_id).await?;

        let (text, kind) = self.pipeline.extract(bytes, mime_type).await?;
        debug!("Contract {} uploaded as {}", contract_id, kind.as_str());
        let analysis: ContractAnalysis = self.pipeline.run_typed(&text, &[]).await?;

        contract.content = Some(text);
        contract.record_analysis(analysis);
        self.persist_and_notify(&contract).await?;
        Ok(contract)
    }

    async fn persist_and_notify(&self, contract: &Contract) -> Result<(), ServiceError> {
        if !self.db.contracts().save(contract).await? {
            return Err(ServiceError::NotFound("contract"));
        }
        info!(
            "Contract {} analyzed: risk score {}",
            contract.id,
            contract.risk_score.unwrap_or_default()
        );
        self.notifier
            .notify_user(
                &contract.user_id,
                EventName::ContractAnalyzed,
                json!({
                    "contract_id": contract.id,
                    "risk_score": contract.risk_score,
                    "status": contract.status,
                }),
            )
            .await;
        Ok(())
    }

    /// Draft an email asking for the fixes in the stored analysis, in the
    /// user's preferred tone.
    pub async fn negotiation_email(
        &self,
        user_id: &str,
        contract_id: &str,
    ) -> Result<NegotiationEmail, ServiceError> {
        let contract = self.owned_contract(user_id, contract_id).await?;
        let analysis = contract
            .analysis
            .as_ref()
            .ok_or_else(|| ValidationError("contract has not been analyzed yet".to_string()))?;
        let settings = self.db.vault().get(user_id).await?;

        let review = serde_json::to_string_pretty(analysis)
            .map_err(|e| ServiceError::Conflict(format!("stored analysis unreadable: {}", e)))?;
        let email: NegotiationEmail = self
            .pipeline
            .run_typed(&review, &[("tone", settings.ai_tone.as_str())])
            .await?;
        Ok(email)
    }

    /// Compare a client message with the contract's scope.
    pub async fn scope_check(
        &self,
        user_id: &str,
        contract_id: &str,
        message: &str,
    ) -> Result<ScopeCreepCheck, ServiceError> {
        let contract = self.owned_contract(user_id, contract_id).await?;
        let scope = contract
            .content
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .or_else(|| contract.analysis.as_ref().map(|a| a.summary.as_str()))
            .ok_or_else(|| ValidationError("contract has no text to compare against".to_string()))?;
        let scope = truncate_chars(scope, DEFAULT_MAX_CONTENT_CHARS);

        let check: ScopeCreepCheck = self
            .pipeline
            .run_typed(message, &[("scope", scope)])
            .await?;

        if check.is_scope_creep {
            self.notifier
                .notify_user(
                    user_id,
                    EventName::ScopeCreepDetected,
                    json!({
                        "contract_id": contract.id,
                        "confidence": check.confidence,
                        "explanation": check.explanation,
                    }),
                )
                .await;
        }
        Ok(check)
    }
}
