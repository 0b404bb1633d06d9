//! Typed results for each prompt template.
//!
//! Model output is parsed into these structs and then validated. Optional
//! fields default; anything outside the declared shape is rejected.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::prompts::PromptTemplate;
use super::AnalysisError;

/// Accept an integer, a float (rounded) or a numeric string in 0..=100.
fn de_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = Value::deserialize(deserializer)?;
    let number = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| D::Error::custom(format!("expected a score, got {}", value)))?;

    if !(0.0..=100.0).contains(&number) {
        return Err(D::Error::custom(format!("score {} outside 0..=100", number)));
    }
    Ok(number.round() as u8)
}

/// A template's decoded output.
pub trait TemplateOutput: DeserializeOwned + Serialize {
    const TEMPLATE: PromptTemplate;

    /// Field rules serde cannot express.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }

    /// Decode and validate a normalized model response.
    fn from_value(value: Value) -> Result<Self, AnalysisError> {
        let parsed: Self = serde_json::from_value(value).map_err(|e| {
            AnalysisError::InvalidAiResponse(format!("{}: {}", Self::TEMPLATE.as_str(), e))
        })?;
        parsed.validate().map_err(|e| {
            AnalysisError::InvalidAiResponse(format!("{}: {}", Self::TEMPLATE.as_str(), e))
        })?;
        Ok(parsed)
    }
}

fn require(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} is empty", field))
    } else {
        Ok(())
    }
}

/// Clause risk rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(alias = "high", alias = "HIGH")]
    High,
    #[serde(alias = "medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "low", alias = "LOW")]
    Low,
}

/// One risky clause found in a contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    pub title: String,
    #[serde(default, alias = "quotedText", alias = "text", alias = "quote")]
    pub quoted_text: String,
    #[serde(alias = "riskLevel", alias = "risk_level")]
    pub risk: RiskLevel,
    #[serde(default)]
    pub explanation: String,
    #[serde(default, alias = "suggestedFix", alias = "fix")]
    pub suggested_fix: String,
}

/// Contract risk review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractAnalysis {
    #[serde(alias = "riskScore", deserialize_with = "de_score")]
    pub risk_score: u8,
    pub summary: String,
    #[serde(default, alias = "paymentTerms")]
    pub payment_terms: String,
    #[serde(default)]
    pub clauses: Vec<Clause>,
    #[serde(default, alias = "negotiationEmail")]
    pub negotiation_email: String,
}

impl TemplateOutput for ContractAnalysis {
    const TEMPLATE: PromptTemplate = PromptTemplate::ContractRisk;

    fn validate(&self) -> Result<(), String> {
        require("summary", &self.summary)?;
        for (i, clause) in self.clauses.iter().enumerate() {
            require(&format!("clauses[{}].title", i), &clause.title)?;
        }
        Ok(())
    }
}

impl ContractAnalysis {
    pub fn high_risk_count(&self) -> usize {
        self.clauses
            .iter()
            .filter(|c| c.risk == RiskLevel::High)
            .count()
    }
}

/// Drafted negotiation email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationEmail {
    pub subject: String,
    pub body: String,
}

impl TemplateOutput for NegotiationEmail {
    const TEMPLATE: PromptTemplate = PromptTemplate::NegotiationEmail;

    fn validate(&self) -> Result<(), String> {
        require("subject", &self.subject)?;
        require("body", &self.body)
    }
}

/// Verdict on whether a client request exceeds the agreed scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeCreepCheck {
    #[serde(alias = "isScopeCreep")]
    pub is_scope_creep: bool,
    #[serde(default, deserialize_with = "de_score")]
    pub confidence: u8,
    #[serde(default)]
    pub explanation: String,
    #[serde(default, alias = "suggestedReply")]
    pub suggested_reply: String,
}

impl TemplateOutput for ScopeCreepCheck {
    const TEMPLATE: PromptTemplate = PromptTemplate::ScopeCreep;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentStatus {
    #[serde(alias = "happy", alias = "HAPPY")]
    Happy,
    #[serde(alias = "neutral", alias = "NEUTRAL")]
    Neutral,
    #[serde(alias = "at_risk", alias = "atRisk", alias = "At Risk", alias = "AT_RISK")]
    AtRisk,
}

impl SentimentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Happy => "Happy",
            Self::Neutral => "Neutral",
            Self::AtRisk => "AtRisk",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientSentiment {
    #[serde(default, alias = "clientId")]
    pub client_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(alias = "sentimentScore", deserialize_with = "de_score")]
    pub sentiment_score: u8,
    pub status: SentimentStatus,
    #[serde(default)]
    pub signals: Vec<String>,
    #[serde(default, alias = "recommendedAction")]
    pub recommended_action: String,
}

/// Sentiment across a user's clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentRadar {
    pub clients: Vec<ClientSentiment>,
}

impl TemplateOutput for SentimentRadar {
    const TEMPLATE: PromptTemplate = PromptTemplate::ClientSentiment;

    fn validate(&self) -> Result<(), String> {
        for (i, client) in self.clients.iter().enumerate() {
            if client.client_id.trim().is_empty() && client.name.trim().is_empty() {
                return Err(format!("clients[{}] has neither client_id nor name", i));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetKind {
    #[serde(alias = "case_study", alias = "Case Study")]
    CaseStudy,
    #[serde(alias = "testimonial")]
    Testimonial,
    #[serde(alias = "portfolio_item", alias = "Portfolio Item")]
    PortfolioItem,
    #[serde(alias = "social_post", alias = "Social Post")]
    SocialPost,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinedAsset {
    pub title: String,
    pub kind: AssetKind,
    #[serde(default)]
    pub summary: String,
    #[serde(default, alias = "sourceQuote")]
    pub source_quote: String,
}

/// Marketing assets mined from project material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetMining {
    #[serde(default)]
    pub assets: Vec<MinedAsset>,
}

impl TemplateOutput for AssetMining {
    const TEMPLATE: PromptTemplate = PromptTemplate::AssetMining;

    fn validate(&self) -> Result<(), String> {
        for (i, asset) in self.assets.iter().enumerate() {
            require(&format!("assets[{}].title", i), &asset.title)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualifyingActivity {
    pub activity: String,
    #[serde(default)]
    pub rationale: String,
    #[serde(default, alias = "estimatedHours")]
    pub estimated_hours: f64,
}

/// R&D tax credit assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RndCreditAudit {
    #[serde(default)]
    pub eligible: bool,
    #[serde(default, alias = "estimatedCredit")]
    pub estimated_credit: f64,
    #[serde(default, alias = "qualifyingActivities")]
    pub qualifying_activities: Vec<QualifyingActivity>,
    #[serde(default)]
    pub summary: String,
    /// Set only on the fallback result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TemplateOutput for RndCreditAudit {
    const TEMPLATE: PromptTemplate = PromptTemplate::RndCreditAudit;

    fn validate(&self) -> Result<(), String> {
        if !self.estimated_credit.is_finite() || self.estimated_credit < 0.0 {
            return Err(format!("estimated_credit {} is invalid", self.estimated_credit));
        }
        if self
            .qualifying_activities
            .iter()
            .any(|a| !a.estimated_hours.is_finite() || a.estimated_hours < 0.0)
        {
            return Err("estimated_hours must be a non-negative number".to_string());
        }
        Ok(())
    }
}

impl RndCreditAudit {
    /// Zeroed result returned in place of a failed audit.
    pub fn fallback(error: impl Into<String>) -> Self {
        Self {
            eligible: false,
            estimated_credit: 0.0,
            qualifying_activities: Vec::new(),
            summary: "Audit could not be completed.".to_string(),
            error: Some(error.into()),
        }
    }
}

/// Output of any template.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalysisResult {
    Contract(ContractAnalysis),
    NegotiationEmail(NegotiationEmail),
    ScopeCreep(ScopeCreepCheck),
    Sentiment(SentimentRadar),
    Assets(AssetMining),
    RndAudit(RndCreditAudit),
}

impl AnalysisResult {
    /// Decode a normalized response into the template's result type.
    pub fn from_value(template: PromptTemplate, value: Value) -> Result<Self, AnalysisError> {
        Ok(match template {
            PromptTemplate::ContractRisk => Self::Contract(ContractAnalysis::from_value(value)?),
            PromptTemplate::NegotiationEmail => {
                Self::NegotiationEmail(NegotiationEmail::from_value(value)?)
            }
            PromptTemplate::ScopeCreep => Self::ScopeCreep(ScopeCreepCheck::from_value(value)?),
            PromptTemplate::ClientSentiment => Self::Sentiment(SentimentRadar::from_value(value)?),
            PromptTemplate::AssetMining => Self::Assets(AssetMining::from_value(value)?),
            PromptTemplate::RndCreditAudit => Self::RndAudit(RndCreditAudit::from_value(value)?),
        })
    }

    pub fn template(&self) -> PromptTemplate {
        match self {
            Self::Contract(_) => PromptTemplate::ContractRisk,
            Self::NegotiationEmail(_) => PromptTemplate::NegotiationEmail,
            Self::ScopeCreep(_) => PromptTemplate::ScopeCreep,
            Self::Sentiment(_) => PromptTemplate::ClientSentiment,
            Self::Assets(_) => PromptTemplate::AssetMining,
            Self::RndAudit(_) => PromptTemplate::RndCreditAudit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn contract_json() -> Value {
        json!({
            "risk_score": 82,
            "summary": "Payment and IP terms heavily favour the client.",
            "payment_terms": "Net-90",
            "clauses": [
                {
                    "title": "Payment",
                    "quotedText": "Payment due Net-90.",
                    "riskLevel": "High",
                    "explanation": "Ninety days is a long time to wait.",
                    "suggestedFix": "Payment due Net-15."
                },
                {
                    "title": "Liability",
                    "quoted_text": "Liability uncapped.",
                    "risk": "medium"
                }
            ]
        })
    }

    #[test]
    fn test_contract_accepts_alias_fields() {
        let analysis = ContractAnalysis::from_value(contract_json()).unwrap();
        assert_eq!(analysis.risk_score, 82);
        assert_eq!(analysis.clauses[0].risk, RiskLevel::High);
        assert_eq!(analysis.clauses[0].quoted_text, "Payment due Net-90.");
        assert_eq!(analysis.clauses[1].risk, RiskLevel::Medium);
        assert_eq!(analysis.negotiation_email, "");
        assert_eq!(analysis.high_risk_count(), 1);
    }

    #[test]
    fn test_clause_serializes_as_risk() {
        let analysis = ContractAnalysis::from_value(contract_json()).unwrap();
        let out = serde_json::to_value(&analysis).unwrap();
        assert_eq!(out["clauses"][0]["risk"], "High");
        assert!(out["clauses"][0].get("riskLevel").is_none());
    }

    #[test]
    fn test_risk_score_out_of_range() {
        let mut value = contract_json();
        value["risk_score"] = json!(140);
        let err = ContractAnalysis::from_value(value).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidAiResponse(_)));
    }

    #[test]
    fn test_risk_score_float_and_string() {
        let mut value = contract_json();
        value["risk_score"] = json!(71.6);
        assert_eq!(ContractAnalysis::from_value(value.clone()).unwrap().risk_score, 72);
        value["risk_score"] = json!("40");
        assert_eq!(ContractAnalysis::from_value(value).unwrap().risk_score, 40);
    }

    #[test]
    fn test_unknown_risk_level_rejected() {
        let mut value = contract_json();
        value["clauses"][0]["riskLevel"] = json!("Catastrophic");
        assert!(ContractAnalysis::from_value(value).is_err());
    }

    #[test]
    fn test_empty_summary_rejected() {
        let mut value = contract_json();
        value["summary"] = json!("  ");
        assert!(ContractAnalysis::from_value(value).is_err());
    }

    #[test]
    fn test_sentiment_status_variants() {
        let radar = SentimentRadar::from_value(json!({
            "clients": [
                {"client_id": "c1", "name": "Acme", "sentiment_score": 30, "status": "at_risk"},
                {"client_id": "c2", "sentiment_score": 90, "status": "Happy", "signals": ["paid early"]}
            ]
        }))
        .unwrap();
        assert_eq!(radar.clients[0].status, SentimentStatus::AtRisk);
        assert_eq!(radar.clients[1].signals, vec!["paid early"]);
    }

    #[test]
    fn test_rnd_fallback_is_zeroed() {
        let fallback = RndCreditAudit::fallback("model unavailable");
        let out = serde_json::to_value(&fallback).unwrap();
        assert_eq!(out["eligible"], false);
        assert_eq!(out["estimated_credit"], 0.0);
        assert_eq!(out["qualifying_activities"], json!([]));
        assert_eq!(out["error"], "model unavailable");
    }

    #[test]
    fn test_rnd_negative_credit_rejected() {
        let err = RndCreditAudit::from_value(json!({"eligible": true, "estimated_credit": -5}));
        assert!(err.is_err());
    }

    #[test]
    fn test_result_dispatch_by_template() {
        let result = AnalysisResult::from_value(
            PromptTemplate::NegotiationEmail,
            json!({"subject": "Contract terms", "body": "Hi Sam"}),
        )
        .unwrap();
        assert_eq!(result.template(), PromptTemplate::NegotiationEmail);
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"subject": "Contract terms", "body": "Hi Sam"})
        );

        let wrong_shape =
            AnalysisResult::from_value(PromptTemplate::ScopeCreep, json!({"subject": "x"}));
        assert!(wrong_shape.is_err());
    }
}
