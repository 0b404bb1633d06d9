//! Forge: testimonial collection through magic links.

use std::sync::Arc;

use askama::Template;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use super::ServiceError;
use crate::email::{send_best_effort, EmailMessage, EmailSender};
use crate::models::{
    is_valid_token, NewTestimonial, Testimonial, TestimonialStatus, TestimonialSubmission,
    TransitionError,
};
use crate::notify::{EventName, Notifier};
use crate::repository::DbContext;

/// A freshly issued request and its link.
#[derive(Debug, Serialize)]
pub struct IssuedTestimonial {
    pub testimonial: Testimonial,
    pub magic_link: String,
    pub email_sent: bool,
}

/// What the magic-link page shows before submission.
#[derive(Debug, Serialize)]
pub struct TestimonialInvite {
    pub client_name: String,
    pub project: Option<String>,
    pub status: TestimonialStatus,
    pub expires_at: DateTime<Utc>,
}

pub struct ForgeService {
    db: DbContext,
    notifier: Arc<Notifier>,
    mailer: Arc<dyn EmailSender>,
    public_url: String,
}

impl ForgeService {
    pub fn new(
        db: DbContext,
        notifier: Arc<Notifier>,
        mailer: Arc<dyn EmailSender>,
        public_url: &str,
    ) -> Self {
        Self {
            db,
            notifier,
            mailer,
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn magic_link(&self, token: &str) -> String {
        format!("{}/testimonial/{}", self.public_url, token)
    }

    /// Issue a magic link and email it. Email failure does not fail issuance.
    pub async fn request(
        &self,
        user_id: &str,
        input: NewTestimonial,
    ) -> Result<IssuedTestimonial, ServiceError> {
        input.validate()?;
        let testimonial = Testimonial::issue(user_id, input, Utc::now());
        self.db.testimonials().create(&testimonial).await?;

        let magic_link = self.magic_link(&testimonial.token);
        let email_sent = match invite_html(&testimonial, &magic_link) {
            Ok(html) => {
                let message = EmailMessage {
                    to: testimonial.client_email.clone(),
                    subject: "Would you share a few words about our work together?".to_string(),
                    html,
                };
                send_best_effort(self.mailer.as_ref(), &message).await
            }
            Err(e) => {
                warn!("Failed to render invite for {}: {}", testimonial.id, e);
                false
            }
        };

        info!("Issued testimonial request {} (email sent: {})", testimonial.id, email_sent);
        Ok(IssuedTestimonial {
            testimonial,
            magic_link,
            email_sent,
        })
    }

    async fn by_token(&self, token: &str) -> Result<Testimonial, ServiceError> {
        if !is_valid_token(token) {
            return Err(ServiceError::NotFound("testimonial"));
        }
        self.db
            .testimonials()
            .get_by_token(token)
            .await?
            .ok_or(ServiceError::NotFound("testimonial"))
    }

    /// Describe a still-usable link.
    pub async fn describe(&self, token: &str) -> Result<TestimonialInvite, ServiceError> {
        let testimonial = self.by_token(token).await?;
        if testimonial.status != TestimonialStatus::Pending {
            return Err(TransitionError::AlreadySubmitted.into());
        }
        if testimonial.is_expired(Utc::now()) {
            return Err(TransitionError::Expired.into());
        }
        Ok(TestimonialInvite {
            client_name: testimonial.client_name,
            project: testimonial.project,
            status: testimonial.status,
            expires_at: testimonial.expires_at,
        })
    }

    /// Consume the token with a text or video testimonial.
    pub async fn submit(
        &self,
        token: &str,
        submission: TestimonialSubmission,
    ) -> Result<Testimonial, ServiceError> {
        let mut testimonial = self.by_token(token).await?;
        testimonial.submit(submission, Utc::now())?;

        if !self
            .db
            .testimonials()
            .transition(&testimonial, TestimonialStatus::Pending)
            .await?
        {
            return Err(TransitionError::AlreadySubmitted.into());
        }

        self.notifier
            .notify_user(
                &testimonial.user_id,
                EventName::TestimonialReceived,
                json!({
                    "testimonial_id": testimonial.id,
                    "client_name": testimonial.client_name,
                    "kind": testimonial.status,
                }),
            )
            .await;
        Ok(testimonial)
    }

    pub async fn approve(&self, user_id: &str, id: &str) -> Result<Testimonial, ServiceError> {
        let mut testimonial = self
            .db
            .testimonials()
            .get(user_id, id)
            .await?
            .ok_or(ServiceError::NotFound("testimonial"))?;
        let previous = testimonial.status;
        testimonial.approve()?;

        if !self.db.testimonials().transition(&testimonial, previous).await? {
            return Err(ServiceError::Conflict(
                "testimonial changed while approving".to_string(),
            ));
        }
        Ok(testimonial)
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<Testimonial>, ServiceError> {
        Ok(self.db.testimonials().list(user_id).await?)
    }
}

/// Invite email body. Askama escapes every interpolated value.
#[derive(Template)]
#[template(path = "testimonial_invite.html")]
struct InviteTemplate<'a> {
    client_name: &'a str,
    project: Option<&'a str>,
    link: &'a str,
    expires_on: String,
}

fn invite_html(testimonial: &Testimonial, link: &str) -> askama::Result<String> {
    InviteTemplate {
        client_name: &testimonial.client_name,
        project: testimonial.project.as_deref(),
        link,
        expires_on: testimonial.expires_at.format("%B %-d, %Y").to_string(),
    }
    .render()
}
