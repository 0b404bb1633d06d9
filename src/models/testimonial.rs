//! Testimonial requests collected through magic links.
//!
//! `pending -> text | video -> approved`. The link token is single use: only
//! a pending request accepts a submission, and only before it expires.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::{check_email, require_text, ValidationError};

pub const TOKEN_LENGTH: usize = 32;
pub const TOKEN_TTL_DAYS: i64 = 30;
const TOKEN_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const MAX_TESTIMONIAL_CHARS: usize = 5_000;

/// Random 32-character `[a-z0-9]` token.
pub fn generate_token() -> String {
    let mut rng = rand::rng();
    (0..TOKEN_LENGTH)
        .map(|_| TOKEN_CHARSET[rng.random_range(0..TOKEN_CHARSET.len())] as char)
        .collect()
}

/// Shape check, so malformed tokens never reach the database.
pub fn is_valid_token(token: &str) -> bool {
    token.len() == TOKEN_LENGTH
        && token
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestimonialStatus {
    Pending,
    Text,
    Video,
    Approved,
}

impl TestimonialStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Text => "text",
            Self::Video => "video",
            Self::Approved => "approved",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "text" => Some(Self::Text),
            "video" => Some(Self::Video),
            "approved" => Some(Self::Approved),
            _ => None,
        }
    }

    pub fn is_awaiting_approval(&self) -> bool {
        matches!(self, Self::Text | Self::Video)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Testimonial already submitted")]
    AlreadySubmitted,

    #[error("Testimonial link expired")]
    Expired,

    #[error("Cannot approve a testimonial in state {0}")]
    NotAwaitingApproval(&'static str),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// What the client sends through the magic link.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TestimonialSubmission {
    Text { content: String },
    Video { video_url: String },
}

impl TestimonialSubmission {
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Text { content } => require_text("content", content, MAX_TESTIMONIAL_CHARS),
            Self::Video { video_url } => match url::Url::parse(video_url) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
                _ => Err(ValidationError(
                    "video_url must be an http(s) URL".to_string(),
                )),
            },
        }
    }
}

/// Request body for issuing a magic link.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTestimonial {
    pub client_name: String,
    pub client_email: String,
    #[serde(default)]
    pub project: Option<String>,
}

impl NewTestimonial {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("client_name", &self.client_name, 200)?;
        check_email("client_email", &self.client_email)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Testimonial {
    pub id: String,
    #[serde(skip_serializing)]
    pub user_id: String,
    pub client_name: String,
    pub client_email: String,
    pub project: Option<String>,
    #[serde(skip_serializing)]
    pub token: String,
    pub status: TestimonialStatus,
    pub content: Option<String>,
    pub video_url: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Testimonial {
    /// Issue a new pending request with a fresh token.
    pub fn issue(user_id: &str, input: NewTestimonial, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            client_name: input.client_name.trim().to_string(),
            client_email: input.client_email.trim().to_string(),
            project: input.project,
            token: generate_token(),
            status: TestimonialStatus::Pending,
            content: None,
            video_url: None,
            expires_at: now + Duration::days(TOKEN_TTL_DAYS),
            submitted_at: None,
            created_at: now,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Consume the token. Allowed once, from `pending`, before expiry.
    pub fn submit(
        &mut self,
        submission: TestimonialSubmission,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        if self.status != TestimonialStatus::Pending {
            return Err(TransitionError::AlreadySubmitted);
        }
        if self.is_expired(now) {
            return Err(TransitionError::Expired);
        }
        submission.validate()?;

        match submission {
            TestimonialSubmission::Text { content } => {
                self.content = Some(content.trim().to_string());
                self.status = TestimonialStatus::Text;
            }
            TestimonialSubmission::Video { video_url } => {
                self.video_url = Some(video_url);
                self.status = TestimonialStatus::Video;
            }
        }
        self.submitted_at = Some(now);
        Ok(())
    }

    pub fn approve(&mut self) -> Result<(), TransitionError> {
        if !self.status.is_awaiting_approval() {
            return Err(TransitionError::NotAwaitingApproval(self.status.as_str()));
        }
        self.status = TestimonialStatus::Approved;
        Ok(())
    }
}
