pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::intake::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Intake API
        .route("/api/v1/sessions", post(handlers::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_delete_session),
        )
        .route(
            "/api/v1/sessions/:id/messages",
            post(handlers::handle_post_message),
        )
        .route(
            "/api/v1/sessions/:id/restart",
            post(handlers::handle_restart_session),
        )
        .route(
            "/api/v1/sessions/:id/snapshot",
            post(handlers::handle_save_snapshot),
        )
        .with_state(state)
}
