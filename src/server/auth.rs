//! Caller identity.
//!
//! The identity provider in front of the service verifies the session and
//! forwards the stable user id in `x-user-id`.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::async_trait;

use super::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
const MAX_USER_ID_LEN: usize = 128;

/// An authenticated caller. Missing identity rejects with 401.
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

/// A caller that may be anonymous. A header that is present but malformed
/// still rejects with 401.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<String>);

fn user_from_parts(parts: &Parts) -> Result<Option<String>, ApiError> {
    let Some(value) = parts.headers.get(USER_ID_HEADER) else {
        return Ok(None);
    };
    let id = value
        .to_str()
        .map(str::trim)
        .map_err(|_| ApiError::Unauthorized("invalid user identity".to_string()))?;
    let valid = !id.is_empty()
        && id.len() <= MAX_USER_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_.|@".contains(c));
    if !valid {
        return Err(ApiError::Unauthorized("invalid user identity".to_string()));
    }
    Ok(Some(id.to_string()))
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        user_from_parts(parts)?
            .map(AuthUser)
            .ok_or_else(|| ApiError::Unauthorized("authentication required".to_string()))
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(user_from_parts(parts)?))
    }
}
