//! Per-user settings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ValidationError;

pub const DEFAULT_CURRENCY: &str = "USD";
pub const DEFAULT_AI_TONE: &str = "professional";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vault {
    #[serde(skip_serializing)]
    pub user_id: String,
    pub currency: String,
    pub hourly_rate: f64,
    /// Tone used when drafting emails on the user's behalf.
    pub ai_tone: String,
    pub updated_at: DateTime<Utc>,
}

impl Vault {
    /// Settings for a user who never saved any.
    pub fn defaults_for(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            currency: DEFAULT_CURRENCY.to_string(),
            hourly_rate: 0.0,
            ai_tone: DEFAULT_AI_TONE.to_string(),
            updated_at: DateTime::UNIX_EPOCH,
        }
    }

    pub fn apply(&mut self, update: VaultUpdate) -> Result<(), ValidationError> {
        update.validate()?;
        if let Some(currency) = update.currency {
            self.currency = currency.trim().to_uppercase();
        }
        if let Some(rate) = update.hourly_rate {
            self.hourly_rate = rate;
        }
        if let Some(tone) = update.ai_tone {
            self.ai_tone = tone.trim().to_string();
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Partial update; absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VaultUpdate {
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub hourly_rate: Option<f64>,
    #[serde(default)]
    pub ai_tone: Option<String>,
}

impl VaultUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(currency) = &self.currency {
            let c = currency.trim();
            if c.len() != 3 || !c.chars().all(|ch| ch.is_ascii_alphabetic()) {
                return Err(ValidationError(
                    "currency must be a 3-letter ISO code".to_string(),
                ));
            }
        }
        if let Some(rate) = self.hourly_rate {
            if !rate.is_finite() || rate < 0.0 {
                return Err(ValidationError(
                    "hourly_rate must be a non-negative number".to_string(),
                ));
            }
        }
        if let Some(tone) = &self.ai_tone {
            super::require_text("ai_tone", tone, 40)?;
        }
        Ok(())
    }
}
