//! JSON error responses.
//!
//! Every failure leaving the API is folded into [`ApiError`] and rendered as
//! `{"error": "<message>"}` with the matching status code. Server-side faults
//! are logged and answered with a generic message.

use axum::extract::rejection::JsonRejection;
use axum::extract::multipart::MultipartError;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{async_trait, Json};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::error;

use crate::analysis::{AnalysisError, ExtractionError};
use crate::llm::LlmError;
use crate::models::{TransitionError, ValidationError};
use crate::notify::ChannelAuthError;
use crate::repository::DbError;
use crate::services::ServiceError;

pub const INTERNAL_ERROR_MESSAGE: &str = "internal server error";

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    MethodNotAllowed,
    Conflict(String),
    Gone(String),
    UnsupportedMediaType(String),
    BadGateway(String),
    ServiceUnavailable(String),
    /// Detail is logged, never returned.
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Gone(_) => StatusCode::GONE,
            Self::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::BadGateway(_) => StatusCode::BAD_GATEWAY,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::BadRequest(m)
            | Self::Unauthorized(m)
            | Self::Forbidden(m)
            | Self::NotFound(m)
            | Self::Conflict(m)
            | Self::Gone(m)
            | Self::UnsupportedMediaType(m)
            | Self::BadGateway(m)
            | Self::ServiceUnavailable(m) => m.clone(),
            Self::MethodNotAllowed => "method not allowed".to_string(),
            Self::Internal(_) => INTERNAL_ERROR_MESSAGE.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(detail) = &self {
            error!("Request failed: {}", detail);
        }
        (self.status(), Json(json!({ "error": self.message() }))).into_response()
    }
}

impl From<ExtractionError> for ApiError {
    fn from(err: ExtractionError) -> Self {
        match err {
            ExtractionError::UnsupportedFileType(_) => Self::UnsupportedMediaType(err.to_string()),
            ExtractionError::ExtractionFailed(_) => Self::BadRequest(err.to_string()),
            ExtractionError::ToolNotFound(_) => Self::ServiceUnavailable(err.to_string()),
            ExtractionError::Io(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<LlmError> for ApiError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Unavailable(_) => Self::ServiceUnavailable(err.to_string()),
            LlmError::Api(_) => Self::BadGateway(err.to_string()),
            LlmError::Config(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::Extraction(e) => e.into(),
            AnalysisError::Model(e) => e.into(),
            AnalysisError::InvalidAiResponse(_) => Self::BadGateway(err.to_string()),
            AnalysisError::Validation(m) => Self::BadRequest(m),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::BadRequest(err.0)
    }
}

impl From<TransitionError> for ApiError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::AlreadySubmitted | TransitionError::NotAwaitingApproval(_) => {
                Self::Conflict(err.to_string())
            }
            TransitionError::Expired => Self::Gone(err.to_string()),
            TransitionError::Invalid(e) => e.into(),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        Self::Internal(format!("database: {}", err))
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Analysis(e) => e.into(),
            ServiceError::Transition(e) => e.into(),
            ServiceError::Validation(e) => e.into(),
            ServiceError::NotFound(_) => Self::NotFound(err.to_string()),
            ServiceError::Unauthorized(m) => Self::Unauthorized(m),
            ServiceError::Conflict(m) => Self::Conflict(m),
            ServiceError::Database(e) => e.into(),
        }
    }
}

impl From<ChannelAuthError> for ApiError {
    fn from(err: ChannelAuthError) -> Self {
        match err {
            ChannelAuthError::Forbidden(_) => Self::Forbidden(err.to_string()),
            ChannelAuthError::InvalidSocket(_) => Self::BadRequest(err.to_string()),
            ChannelAuthError::NotConfigured => Self::ServiceUnavailable(err.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::MissingJsonContentType(_) => {
                Self::UnsupportedMediaType(rejection.body_text())
            }
            _ => Self::BadRequest(rejection.body_text()),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::BadRequest(err.body_text())
    }
}

/// `Json<T>` whose rejections render as [`ApiError`].
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let unsupported: ApiError =
            AnalysisError::from(ExtractionError::UnsupportedFileType("image/png".into())).into();
        assert_eq!(unsupported.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let down: ApiError = AnalysisError::from(LlmError::Unavailable("timeout".into())).into();
        assert_eq!(down.status(), StatusCode::SERVICE_UNAVAILABLE);

        let garbled: ApiError = AnalysisError::InvalidAiResponse("hello".into()).into();
        assert_eq!(garbled.status(), StatusCode::BAD_GATEWAY);

        let gone: ApiError = ServiceError::from(TransitionError::Expired).into();
        assert_eq!(gone.status(), StatusCode::GONE);

        let twice: ApiError = ServiceError::from(TransitionError::AlreadySubmitted).into();
        assert_eq!(twice.status(), StatusCode::CONFLICT);

        let missing: ApiError = ServiceError::NotFound("contract").into();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let foreign: ApiError = ChannelAuthError::Forbidden("private-user-b".into()).into();
        assert_eq!(foreign.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_internal_detail_not_echoed() {
        let response = ApiError::Internal("disk I/O error at /var/db".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, json!({ "error": "internal server error" }));
    }
}
