//! Route table and middleware
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::server::handlers::{chat, health};
use crate::server::AppState;

pub fn build_router(state: AppState, cors_allow_any_origin: bool) -> Router {
    let api = Router::new()
        .route("/health", get(health::health))
        .route("/chat", post(chat::chat));

    let router = if state.api_prefix.is_empty() {
        Router::new().merge(api)
    } else {
        Router::new().nest(&state.api_prefix, api)
    };

    let router = router
        .route("/", get(health::root))
        .layer(TraceLayer::new_for_http());

    let router = if cors_allow_any_origin {
        router.layer(CorsLayer::permissive())
    } else {
        router
    };

    router.with_state(state)
}
