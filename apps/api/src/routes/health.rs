use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status, version, live session count and whether the LLM is wired in.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let active_sessions = state.sessions.len().await;
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "talentscout-api",
        "active_sessions": active_sessions,
        "llm_enabled": state.responder.is_available(),
    }))
}
