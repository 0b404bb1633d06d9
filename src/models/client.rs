//! Freelancer clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{check_email, require_text, ValidationError};
use crate::analysis::SentimentStatus;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Client {
    pub id: String,
    #[serde(skip_serializing)]
    pub user_id: String,
    pub name: String,
    pub email: Option<String>,
    pub company: Option<String>,
    pub notes: Option<String>,
    /// Latest Radar score (0-100).
    pub sentiment_score: Option<u8>,
    pub sentiment_status: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for creating a client.
#[derive(Debug, Clone, Deserialize)]
pub struct NewClient {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewClient {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name, 200)?;
        if let Some(email) = self.email.as_deref().filter(|e| !e.is_empty()) {
            check_email("email", email)?;
        }
        Ok(())
    }
}

impl Client {
    pub fn new(user_id: &str, input: NewClient) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: input.name.trim().to_string(),
            email: input.email.filter(|e| !e.is_empty()),
            company: input.company,
            notes: input.notes,
            sentiment_score: None,
            sentiment_status: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// One line per client, fed to the sentiment prompt.
    pub fn radar_line(&self) -> String {
        let mut line = format!("- client_id: {} | name: {}", self.id, self.name);
        if let Some(company) = &self.company {
            line.push_str(&format!(" | company: {}", company));
        }
        if let Some(notes) = self.notes.as_deref().filter(|n| !n.trim().is_empty()) {
            line.push_str(&format!(" | notes: {}", notes.trim()));
        }
        line
    }

    pub fn record_sentiment(&mut self, score: u8, status: SentimentStatus) {
        self.sentiment_score = Some(score.min(100));
        self.sentiment_status = Some(status.as_str().to_string());
        self.updated_at = Utc::now();
    }
}
