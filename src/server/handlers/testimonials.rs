//! Forge endpoints. The magic-link routes are public: the token is the
//! credential.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::super::auth::AuthUser;
use super::super::error::{ApiError, ApiJson};
use super::super::AppState;
use crate::models::{NewTestimonial, Testimonial, TestimonialStatus, TestimonialSubmission};
use crate::services::{IssuedTestimonial, TestimonialInvite};

/// What the submitting client gets back. Owner-side fields stay private.
#[derive(Debug, Serialize)]
pub struct SubmissionReceipt {
    pub status: TestimonialStatus,
    pub submitted_at: Option<DateTime<Utc>>,
}

pub async fn request_testimonial(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(input): ApiJson<NewTestimonial>,
) -> Result<(StatusCode, Json<IssuedTestimonial>), ApiError> {
    let issued = state.forge.request(&user, input).await?;
    Ok((StatusCode::CREATED, Json(issued)))
}

pub async fn list_testimonials(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Testimonial>>, ApiError> {
    Ok(Json(state.forge.list(&user).await?))
}

pub async fn describe_magic_link(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<TestimonialInvite>, ApiError> {
    Ok(Json(state.forge.describe(&token).await?))
}

pub async fn submit_magic_link(
    State(state): State<AppState>,
    Path(token): Path<String>,
    ApiJson(submission): ApiJson<TestimonialSubmission>,
) -> Result<Json<SubmissionReceipt>, ApiError> {
    let testimonial = state.forge.submit(&token, submission).await?;
    Ok(Json(SubmissionReceipt {
        status: testimonial.status,
        submitted_at: testimonial.submitted_at,
    }))
}

pub async fn approve_testimonial(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Testimonial>, ApiError> {
    Ok(Json(state.forge.approve(&user, &id).await?))
}
