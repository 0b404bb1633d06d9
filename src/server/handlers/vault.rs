use axum::extract::State;
use axum::Json;

use super::super::auth::AuthUser;
use super::super::error::{ApiError, ApiJson};
use super::super::AppState;
use crate::models::{Vault, VaultUpdate};

/// Stored settings, or the defaults when the user has none yet.
pub async fn get_vault(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vault>, ApiError> {
    Ok(Json(state.db.vault().get(&user).await?))
}

pub async fn update_vault(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(update): ApiJson<VaultUpdate>,
) -> Result<Json<Vault>, ApiError> {
    let repo = state.db.vault();
    let mut vault = repo.get(&user).await?;
    vault.apply(update)?;
    repo.save(&vault).await?;
    Ok(Json(vault))
}
