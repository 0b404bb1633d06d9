use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use super::super::AppState;

/// Liveness check. Also reports which model backend is wired in.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "model_backend": state.pipeline.llm().backend_name(),
    }))
}
