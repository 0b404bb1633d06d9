use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::super::auth::AuthUser;
use super::super::error::{ApiError, ApiJson};
use super::super::AppState;

#[derive(Debug, Deserialize)]
pub struct ChannelAuthBody {
    pub socket_id: String,
    pub channel_name: String,
}

#[derive(Debug, Serialize)]
pub struct ChannelAuthResponse {
    pub auth: String,
}

/// Sign a private-channel subscription for the caller's own channel.
pub async fn channel_auth(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(body): ApiJson<ChannelAuthBody>,
) -> Result<Json<ChannelAuthResponse>, ApiError> {
    let auth = state
        .notifier
        .authorize(&user, &body.socket_id, &body.channel_name)?;
    Ok(Json(ChannelAuthResponse { auth }))
}
