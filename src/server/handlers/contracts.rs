//! Shield endpoints.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::debug;

use super::super::auth::{AuthUser, MaybeUser};
use super::super::error::{ApiError, ApiJson};
use super::super::AppState;
use crate::analysis::{ContractAnalysis, NegotiationEmail, ScopeCreepCheck};
use crate::models::{Contract, NewContract};
use crate::utils::detect_mime;

/// Multipart field carrying the uploaded document.
const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Deserialize)]
pub struct AnalyzeContractBody {
    pub content: String,
    #[serde(default)]
    pub contract_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScopeCheckBody {
    pub message: String,
}

pub async fn analyze_contract(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    ApiJson(body): ApiJson<AnalyzeContractBody>,
) -> Result<Json<ContractAnalysis>, ApiError> {
    if body.content.trim().is_empty() {
        return Err(ApiError::BadRequest("content is required".to_string()));
    }
    let analysis = state
        .shield
        .analyze_text(user.as_deref(), &body.content, body.contract_id.as_deref())
        .await?;
    Ok(Json(analysis))
}

pub async fn upload_contract(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Contract>, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let declared = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;
        if bytes.is_empty() {
            return Err(ApiError::BadRequest("uploaded file is empty".to_string()));
        }

        let mime = detect_mime(&bytes, filename.as_deref(), declared.as_deref());
        debug!(
            "Upload for contract {}: {:?} ({}, {} bytes)",
            id,
            filename,
            mime,
            bytes.len()
        );
        let contract = state
            .shield
            .analyze_upload(&user, &id, bytes.to_vec(), &mime)
            .await?;
        return Ok(Json(contract));
    }
    Err(ApiError::BadRequest(format!(
        "multipart field '{}' is required",
        UPLOAD_FIELD
    )))
}

pub async fn negotiation_email(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<NegotiationEmail>, ApiError> {
    Ok(Json(state.shield.negotiation_email(&user, &id).await?))
}

pub async fn scope_check(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<ScopeCheckBody>,
) -> Result<Json<ScopeCreepCheck>, ApiError> {
    if body.message.trim().is_empty() {
        return Err(ApiError::BadRequest("message is required".to_string()));
    }
    Ok(Json(state.shield.scope_check(&user, &id, &body.message).await?))
}

pub async fn create_contract(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(input): ApiJson<NewContract>,
) -> Result<(StatusCode, Json<Contract>), ApiError> {
    let contract = state.shield.create_contract(&user, input).await?;
    Ok((StatusCode::CREATED, Json(contract)))
}

pub async fn list_contracts(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Contract>>, ApiError> {
    Ok(Json(state.shield.list_contracts(&user).await?))
}

pub async fn get_contract(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Contract>, ApiError> {
    Ok(Json(state.shield.get_contract(&user, &id).await?))
}

pub async fn sign_contract(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Contract>, ApiError> {
    Ok(Json(state.shield.sign_contract(&user, &id).await?))
}
