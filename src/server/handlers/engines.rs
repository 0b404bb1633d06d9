//! Radar, Magnet and the R&D credit audit.

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use tracing::{debug, warn};

use super::super::auth::AuthUser;
use super::super::error::{ApiError, ApiJson};
use super::super::AppState;
use crate::analysis::{AssetMining, RndCreditAudit, SentimentRadar};
use crate::services;

#[derive(Debug, Default, Deserialize)]
pub struct RadarBody {
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ContentBody {
    pub content: String,
}

/// The body is optional; without one only stored client notes are read.
/// A body that is present must decode.
pub async fn radar_scan(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    body: Bytes,
) -> Result<Json<SentimentRadar>, ApiError> {
    let body = if body.iter().all(u8::is_ascii_whitespace) {
        RadarBody::default()
    } else {
        let Json(body) = Json::<RadarBody>::from_bytes(&body)?;
        body
    };
    Ok(Json(state.radar.scan(&user, body.notes.as_deref()).await?))
}

pub async fn mine_assets(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(body): ApiJson<ContentBody>,
) -> Result<Json<AssetMining>, ApiError> {
    let mined = services::mine_assets(&state.pipeline, &body.content).await?;
    debug!("Mined {} assets for {}", mined.assets.len(), user);
    Ok(Json(mined))
}

/// Always answers 200 for an authenticated caller; failures come back in
/// the result's `error` field.
pub async fn rnd_audit(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    body: Result<Json<ContentBody>, JsonRejection>,
) -> Json<RndCreditAudit> {
    match body {
        Ok(Json(body)) => Json(services::rnd_audit(&state.pipeline, &body.content).await),
        Err(rejection) => {
            warn!("R&D audit request unreadable: {}", rejection.body_text());
            Json(RndCreditAudit::fallback(rejection.body_text()))
        }
    }
}
