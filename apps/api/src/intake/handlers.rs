//! Axum route handlers for the Intake API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::intake::dialogue::{handle_turn, TurnOutcome};
use crate::intake::profile::{next_missing_field, CandidateProfile, Field, SummaryLine};
use crate::intake::session::{DialoguePhase, LogEntry, Session, SessionHandle};
use crate::intake::snapshot::{save_snapshot, SnapshotSettings};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub text: String,
}

/// Full view of a session: profile, summary card, and conversation log.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub phase: DialoguePhase,
    pub profile: CandidateProfile,
    pub summary: Vec<SummaryLine>,
    pub next_missing_field: Option<Field>,
    pub is_complete: bool,
    pub messages: Vec<LogEntry>,
    pub created_at: DateTime<Utc>,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.id,
            phase: session.phase,
            profile: session.profile.clone(),
            summary: session.profile.summary(),
            next_missing_field: next_missing_field(&session.profile),
            is_complete: session.profile.is_complete(),
            messages: session.log.clone(),
            created_at: session.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TurnResponse {
    pub session_id: Uuid,
    #[serde(flatten)]
    pub outcome: TurnOutcome,
    pub profile: CandidateProfile,
    /// Post-exit destination, present only once the session has ended.
    pub redirect_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SnapshotResponse {
    pub path: String,
    pub encrypted: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

async fn find_session(state: &AppState, id: Uuid) -> Result<SessionHandle, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
}

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionView>) {
    let handle = state.sessions.create().await;
    let session = handle.lock().await;
    info!(session_id = %session.id, "Session created");
    (StatusCode::CREATED, Json(SessionView::from(&*session)))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let handle = find_session(&state, id).await?;
    let session = handle.lock().await;
    Ok(Json(SessionView::from(&*session)))
}

/// POST /api/v1/sessions/:id/messages
///
/// Runs one dialogue turn. The session lock is held for the whole turn, so
/// concurrent messages to the same session are processed one at a time.
pub async fn handle_post_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<TurnResponse>, AppError> {
    let handle = find_session(&state, id).await?;
    let mut session = handle.lock().await;

    let outcome = handle_turn(&mut session, &request.text, &state.responder).await?;
    let redirect_url = if outcome.phase == DialoguePhase::Ended {
        state.config.exit_redirect_url.clone()
    } else {
        None
    };

    Ok(Json(TurnResponse {
        session_id: session.id,
        outcome,
        profile: session.profile.clone(),
        redirect_url,
    }))
}

/// POST /api/v1/sessions/:id/restart
pub async fn handle_restart_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let handle = find_session(&state, id).await?;
    let mut session = handle.lock().await;
    session.restart();
    info!(session_id = %session.id, "Session restarted");
    Ok(Json(SessionView::from(&*session)))
}

/// POST /api/v1/sessions/:id/snapshot
///
/// Only available once the profile is complete. Encryption misconfiguration
/// fails this request and nothing else.
pub async fn handle_save_snapshot(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SnapshotResponse>, AppError> {
    let handle = find_session(&state, id).await?;
    let profile = handle.lock().await.profile.clone();

    if !profile.is_complete() {
        return Err(AppError::Validation(
            "Profile is incomplete; a snapshot is available once every field is collected"
                .to_string(),
        ));
    }

    let settings = SnapshotSettings::from_config(&state.config)?;
    let path = save_snapshot(&profile, id, &settings).await?;

    Ok(Json(SnapshotResponse {
        path: path.display().to_string(),
        encrypted: settings.cipher.is_some(),
    }))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.sessions.remove(id).await {
        return Err(AppError::NotFound(format!("Session {id} not found")));
    }
    info!(session_id = %id, "Session deleted");
    Ok(StatusCode::NO_CONTENT)
}
