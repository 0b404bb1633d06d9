//! Router configuration for the API server.

use std::any::Any;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, StatusCode};
use axum::middleware::map_response;
use axum::response::{IntoResponse, Response};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;

use super::error::ApiError;
use super::handlers;
use super::AppState;

/// Largest contract upload accepted.
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        // Shield
        .route("/api/analyze-contract", post(handlers::analyze_contract))
        .route(
            "/api/contracts",
            get(handlers::list_contracts).post(handlers::create_contract),
        )
        .route("/api/contracts/:id", get(handlers::get_contract))
        .route(
            "/api/contracts/:id/upload",
            post(handlers::upload_contract).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/api/contracts/:id/negotiation-email",
            post(handlers::negotiation_email),
        )
        .route("/api/contracts/:id/scope-check", post(handlers::scope_check))
        .route("/api/contracts/:id/sign", post(handlers::sign_contract))
        // Radar
        .route(
            "/api/clients",
            get(handlers::list_clients).post(handlers::create_client),
        )
        .route("/api/radar", post(handlers::radar_scan))
        // Magnet and finance
        .route("/api/magnet/mine", post(handlers::mine_assets))
        .route("/api/finance/rnd-audit", post(handlers::rnd_audit))
        // Vault
        .route(
            "/api/vault",
            get(handlers::get_vault).put(handlers::update_vault),
        )
        // Forge
        .route("/api/testimonials", get(handlers::list_testimonials))
        .route(
            "/api/testimonials/request",
            post(handlers::request_testimonial),
        )
        .route(
            "/api/testimonials/magic/:token",
            get(handlers::describe_magic_link).post(handlers::submit_magic_link),
        )
        .route(
            "/api/testimonials/:id/approve",
            post(handlers::approve_testimonial),
        )
        // Realtime
        .route("/api/realtime/auth", post(handlers::channel_auth))
        .fallback(not_found)
        .layer(map_response(json_method_not_allowed))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn not_found() -> ApiError {
    ApiError::NotFound("route not found".to_string())
}

/// Method mismatches come back from the router with an empty body.
async fn json_method_not_allowed(response: Response) -> Response {
    if response.status() != StatusCode::METHOD_NOT_ALLOWED
        || response.headers().contains_key(header::CONTENT_TYPE)
    {
        return response;
    }
    let allow = response.headers().get(header::ALLOW).cloned();
    let mut json = ApiError::MethodNotAllowed.into_response();
    if let Some(allow) = allow {
        json.headers_mut().insert(header::ALLOW, allow);
    }
    json
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| err.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "unknown panic payload".to_string());
    ApiError::Internal(format!("handler panicked: {}", detail)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_panic_response_is_generic_json() {
        let response = panic_response(Box::new("index out of bounds"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], br#"{"error":"internal server error"}"#);
    }
}
