mod config;
mod errors;
mod intake;
mod llm_client;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::intake::session::SessionStore;
use crate::intake::snapshot::{PiiCipher, SnapshotSettings};
use crate::llm_client::{LlmClient, Responder};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // `talentscout generate-key` prints a fresh ENCRYPTION_KEY and exits
    if std::env::args().nth(1).as_deref() == Some("generate-key") {
        println!("{}", PiiCipher::generate_key());
        return Ok(());
    }

    // Load configuration first (fails only on malformed values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting TalentScout API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM responder (deterministic fallbacks when no key is set)
    let responder = match LlmClient::from_config(&config)? {
        Some(client) => {
            info!("LLM client initialized (model: {})", client.model());
            Responder::new(Arc::new(client))
        }
        None => {
            warn!("OPENAI_API_KEY not set; running with deterministic fallbacks only");
            Responder::disabled()
        }
    };

    // Snapshot misconfiguration only fails snapshot requests, so just surface it here
    match SnapshotSettings::from_config(&config) {
        Ok(settings) => info!(
            "Snapshots go to {} (encrypted: {})",
            settings.dir.display(),
            settings.cipher.is_some()
        ),
        Err(e) => warn!("Snapshots will fail until fixed: {e}"),
    }

    // Session store with idle eviction
    let sessions = SessionStore::new();
    sessions.spawn_idle_sweeper(Duration::from_secs(config.session_ttl_secs));
    info!("Idle sessions expire after {}s", config.session_ttl_secs);

    // Build app state
    let state = AppState {
        sessions,
        responder,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
