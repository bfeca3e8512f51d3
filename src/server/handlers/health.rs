//! Liveness and welcome endpoints
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value as JsonValue};

use crate::server::AppState;

pub const SERVICE_NAME: &str = "Backend Oracle API";

/// `GET {prefix}/health`
pub async fn health() -> Json<JsonValue> {
    Json(json!({ "status": "healthy", "service": SERVICE_NAME }))
}

/// `GET /`
pub async fn root(State(state): State<AppState>) -> Json<JsonValue> {
    Json(json!({
        "message": format!("Welcome to {}", state.app.name),
        "version": state.app.version,
        "health": format!("{}/health", state.api_prefix),
    }))
}
