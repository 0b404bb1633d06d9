use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use super::super::auth::AuthUser;
use super::super::error::{ApiError, ApiJson};
use super::super::AppState;
use crate::models::{Client, NewClient};

pub async fn create_client(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(input): ApiJson<NewClient>,
) -> Result<(StatusCode, Json<Client>), ApiError> {
    let client = state.radar.add_client(&user, input).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

pub async fn list_clients(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Client>>, ApiError> {
    Ok(Json(state.radar.list_clients(&user).await?))
}
