//! Per-conversation state and the in-memory store that isolates sessions.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::info;
use uuid::Uuid;

use crate::intake::profile::CandidateProfile;
use crate::llm_client::{ChatMessage, Role};

pub const GREETING: &str = "Hello! I'm TalentScout, your AI hiring assistant. \
    I'll collect your basic details (name, contact, experience, position, location, tech stack) \
    and then ask a few tailored technical questions. You can type 'exit' anytime to end.";

/// Where the conversation stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialoguePhase {
    /// At least one profile field is still missing.
    Collecting,
    /// Profile complete, tech questions sent, waiting for answers.
    AwaitingTechQuestions,
    /// Questions already asked; free-form follow-up.
    Done,
    /// Candidate exited. No further input until restart.
    Ended,
}

/// One entry of the append-only conversation log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub role: Role,
    pub content: String,
    pub at: DateTime<Utc>,
}

impl LogEntry {
    pub fn as_chat_message(&self) -> ChatMessage {
        ChatMessage::new(self.role, self.content.clone())
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub profile: CandidateProfile,
    pub log: Vec<LogEntry>,
    /// One-shot flag: the tech-question bundle goes out at most once.
    pub asked_tech_questions: bool,
    pub phase: DialoguePhase,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Empty profile, greeting as the only log entry.
    pub fn new(id: Uuid) -> Self {
        let mut session = Self {
            id,
            profile: CandidateProfile::default(),
            log: Vec::new(),
            asked_tech_questions: false,
            phase: DialoguePhase::Collecting,
            created_at: Utc::now(),
        };
        session.push(Role::Assistant, GREETING);
        session
    }

    /// Discards profile, log and flags, keeping the id.
    pub fn restart(&mut self) {
        *self = Session::new(self.id);
    }

    pub fn is_ended(&self) -> bool {
        self.phase == DialoguePhase::Ended
    }

    pub fn push(&mut self, role: Role, content: impl Into<String>) -> &LogEntry {
        self.log.push(LogEntry {
            role,
            content: content.into(),
            at: Utc::now(),
        });
        &self.log[self.log.len() - 1]
    }

    /// The last `n` log entries as chat messages, oldest first.
    pub fn recent_messages(&self, n: usize) -> Vec<ChatMessage> {
        let start = self.log.len().saturating_sub(n);
        self.log[start..]
            .iter()
            .map(LogEntry::as_chat_message)
            .collect()
    }
}

pub type SessionHandle = Arc<Mutex<Session>>;

/// Upper bound on how often the idle sweep runs.
const MAX_SWEEP_PERIOD: Duration = Duration::from_secs(60);

struct StoredSession {
    handle: SessionHandle,
    last_active: Instant,
}

/// Sessions keyed by id. Each session sits behind its own mutex so one turn
/// completes before the next starts; sessions never share state.
/// Every lookup refreshes the session's idle clock.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, StoredSession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self) -> SessionHandle {
        let id = Uuid::new_v4();
        let handle = Arc::new(Mutex::new(Session::new(id)));
        self.sessions.write().await.insert(
            id,
            StoredSession {
                handle: handle.clone(),
                last_active: Instant::now(),
            },
        );
        handle
    }

    pub async fn get(&self, id: Uuid) -> Option<SessionHandle> {
        let mut sessions = self.sessions.write().await;
        let stored = sessions.get_mut(&id)?;
        stored.last_active = Instant::now();
        Some(stored.handle.clone())
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops sessions untouched for longer than `ttl`. A turn already holding a
    /// handle finishes normally; the session is just no longer reachable.
    pub async fn evict_idle(&self, ttl: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, stored| stored.last_active.elapsed() <= ttl);
        before - sessions.len()
    }

    /// Background task that runs `evict_idle` every `min(ttl, 60s)`.
    pub fn spawn_idle_sweeper(&self, ttl: Duration) -> JoinHandle<()> {
        let store = self.clone();
        let period = ttl.min(MAX_SWEEP_PERIOD).max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let evicted = store.evict_idle(ttl).await;
                if evicted > 0 {
                    let active = store.len().await;
                    info!(evicted, active, "Evicted idle sessions");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_greeted_and_empty() {
        let session = Session::new(Uuid::new_v4());
        assert_eq!(session.log.len(), 1);
        assert_eq!(session.log[0].role, Role::Assistant);
        assert_eq!(session.log[0].content, GREETING);
        assert_eq!(session.profile, CandidateProfile::default());
        assert!(!session.asked_tech_questions);
        assert_eq!(session.phase, DialoguePhase::Collecting);
    }

    #[test]
    fn test_restart_clears_everything_but_id() {
        let id = Uuid::new_v4();
        let mut session = Session::new(id);
        session.profile.full_name = Some("Jane Roe".to_string());
        session.push(Role::User, "exit");
        session.asked_tech_questions = true;
        session.phase = DialoguePhase::Ended;

        session.restart();

        assert_eq!(session.id, id);
        assert_eq!(session.profile, CandidateProfile::default());
        assert_eq!(session.log.len(), 1);
        assert!(!session.asked_tech_questions);
        assert!(!session.is_ended());
    }

    #[test]
    fn test_recent_messages_window() {
        let mut session = Session::new(Uuid::new_v4());
        for i in 0..12 {
            session.push(Role::User, format!("turn {i}"));
        }
        let recent = session.recent_messages(10);
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].content, "turn 2");
        assert_eq!(recent[9].content, "turn 11");
        assert_eq!(session.recent_messages(100).len(), 13);
    }

    #[tokio::test]
    async fn test_store_isolates_sessions() {
        let store = SessionStore::new();
        let a = store.create().await;
        let b = store.create().await;
        let (a_id, b_id) = (a.lock().await.id, b.lock().await.id);
        assert_ne!(a_id, b_id);

        a.lock().await.profile.email = Some("a@x.com".to_string());
        let b_again = store.get(b_id).await.unwrap();
        assert!(b_again.lock().await.profile.email.is_none());
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_store_remove() {
        let store = SessionStore::new();
        let id = store.create().await.lock().await.id;
        assert!(store.remove(id).await);
        assert!(store.get(id).await.is_none());
        assert!(!store.remove(id).await);
    }

    const TTL: Duration = Duration::from_secs(30 * 60);

    #[tokio::test(start_paused = true)]
    async fn test_idle_sessions_are_evicted_after_ttl() {
        let store = SessionStore::new();
        let active = store.create().await.lock().await.id;
        let idle = store.create().await.lock().await.id;

        tokio::time::advance(Duration::from_secs(20 * 60)).await;
        assert!(store.get(active).await.is_some());
        tokio::time::advance(Duration::from_secs(15 * 60)).await;

        assert_eq!(store.evict_idle(TTL).await, 1);
        assert!(store.get(active).await.is_some());
        assert!(store.get(idle).await.is_none());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sessions_within_ttl_survive() {
        let store = SessionStore::new();
        store.create().await;
        tokio::time::advance(TTL - Duration::from_secs(1)).await;
        assert_eq!(store.evict_idle(TTL).await, 0);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_evicts_without_any_request() {
        let store = SessionStore::new();
        store.create().await;
        let sweeper = store.spawn_idle_sweeper(TTL);

        tokio::time::sleep(TTL + MAX_SWEEP_PERIOD * 2).await;

        assert_eq!(store.len().await, 0);
        sweeper.abort();
    }
}
