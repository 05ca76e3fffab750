//! Axum router configuration.

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use escapebot_core::llm::LlmProvider;
use escapebot_core::repository::SessionStore;
use escapebot_core::transport::ReplyTransport;

use crate::http::handlers;
use crate::state::AppState;

/// Build the webhook router with tracing middleware.
pub fn build_router<S, L, T>(state: AppState<S, L, T>) -> Router
where
    S: SessionStore + 'static,
    L: LlmProvider + 'static,
    T: ReplyTransport + 'static,
{
    Router::new()
        .route("/callback", post(handlers::webhook::callback::<S, L, T>))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
