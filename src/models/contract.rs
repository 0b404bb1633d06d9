//! Contracts and their latest risk review.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{require_text, ValidationError};
use crate::analysis::ContractAnalysis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    Draft,
    Analyzed,
    Signed,
}

impl ContractStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Analyzed => "analyzed",
            Self::Signed => "signed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "analyzed" => Some(Self::Analyzed),
            "signed" => Some(Self::Signed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contract {
    pub id: String,
    #[serde(skip_serializing)]
    pub user_id: String,
    pub client_id: Option<String>,
    pub title: String,
    pub content: Option<String>,
    pub status: ContractStatus,
    pub risk_score: Option<u8>,
    pub analysis: Option<ContractAnalysis>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for creating a contract.
#[derive(Debug, Clone, Deserialize)]
pub struct NewContract {
    pub title: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl NewContract {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title, 300)
    }
}

impl Contract {
    pub fn new(user_id: &str, input: NewContract) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            client_id: input.client_id,
            title: input.title.trim().to_string(),
            content: input.content,
            status: ContractStatus::Draft,
            risk_score: None,
            analysis: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach a fresh analysis, replacing any earlier one.
    pub fn record_analysis(&mut self, analysis: ContractAnalysis) {
        self.risk_score = Some(analysis.risk_score);
        self.analysis = Some(analysis);
        if self.status == ContractStatus::Draft {
            self.status = ContractStatus::Analyzed;
        }
        self.updated_at = Utc::now();
    }

    /// Mark the contract signed. Returns false if it already was.
    pub fn mark_signed(&mut self) -> bool {
        if self.status == ContractStatus::Signed {
            return false;
        }
        self.status = ContractStatus::Signed;
        self.updated_at = Utc::now();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis(score: u8) -> ContractAnalysis {
        ContractAnalysis {
            risk_score: score,
            summary: "ok".to_string(),
            payment_terms: String::new(),
            clauses: Vec::new(),
            negotiation_email: String::new(),
        }
    }

    #[test]
    fn test_record_analysis() {
        let mut contract = Contract::new(
            "u1",
            NewContract {
                title: "Website build".to_string(),
                client_id: None,
                content: None,
            },
        );
        assert_eq!(contract.status, ContractStatus::Draft);

        contract.record_analysis(analysis(64));
        assert_eq!(contract.status, ContractStatus::Analyzed);
        assert_eq!(contract.risk_score, Some(64));

        assert!(contract.mark_signed());
        assert!(!contract.mark_signed());
        contract.record_analysis(analysis(10));
        assert_eq!(contract.status, ContractStatus::Signed);
        assert_eq!(contract.risk_score, Some(10));
    }

    #[test]
    fn test_status_round_trip() {
        for status in [ContractStatus::Draft, ContractStatus::Analyzed, ContractStatus::Signed] {
            assert_eq!(ContractStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(ContractStatus::from_str("void"), None);
    }
}
