//! Chat completion endpoint
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde_json::Value as JsonValue;

use crate::chat::ChatRequest;
use crate::server::errors::ApiError;
use crate::server::AppState;

/// `POST {prefix}/chat`
///
/// Returns the upstream completion body unchanged.
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<JsonValue>, ApiError> {
    let Json(request) = payload?;
    let body = state.orchestrator.answer(&request.messages).await?;
    Ok(Json(body))
}
