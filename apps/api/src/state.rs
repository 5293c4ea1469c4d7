use crate::config::Config;
use crate::intake::session::SessionStore;
use crate::llm_client::Responder;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    /// Disabled when no API key is configured; every turn then uses deterministic fallbacks.
    pub responder: Responder,
    pub config: Config,
}
