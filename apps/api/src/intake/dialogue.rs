//! Dialogue policy: the per-turn state transition.
//!
//! Flow per user message: exit check → accumulate fields → next missing field
//! → (ask for field | tech questions once | free-form follow-up).
//! The LLM is optional at every step; each call has a fixed deterministic fallback.

use serde::Serialize;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::intake::accumulate::accumulate;
use crate::intake::exit::detect_exit;
use crate::intake::profile::{next_missing_field, Field};
use crate::intake::questions::generate_tech_questions;
use crate::intake::sentiment::{rule_sentiment, Mood};
use crate::intake::session::{DialoguePhase, LogEntry, Session};
use crate::llm_client::prompts::{INTAKE_SYSTEM, TURN_CONTEXT_TEMPLATE};
use crate::llm_client::{ChatOutcome, ChatRequest, Responder, Role};

/// Number of log entries handed to the LLM as context.
pub const CONTEXT_WINDOW: usize = 10;

pub const TECH_QUESTIONS_INTRO: &str = "Great. Based on your tech stack, please answer these:";

const FOLLOW_UP_ACK: &str = "Thanks for your answers! Our recruiting team will review them \
    along with your profile. Type 'exit' whenever you're done.";

/// What one user turn produced.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    /// Assistant messages appended by this turn, in order.
    pub replies: Vec<LogEntry>,
    /// Profile fields filled by this turn.
    pub filled: Vec<Field>,
    pub phase: DialoguePhase,
    pub next_missing_field: Option<Field>,
}

/// Fixed question for each field, used whenever the LLM is unavailable.
pub fn field_prompt(field: Field) -> &'static str {
    match field {
        Field::FullName => "Could you share your full name?",
        Field::Email => "Please provide your email address.",
        Field::Phone => "What is your phone number (with country code if applicable)?",
        Field::Experience => {
            "How many years of professional experience do you have? (e.g., 2 or 2.5)"
        }
        Field::Position => "What role are you targeting? (e.g., Data Scientist, Backend Engineer)",
        Field::Location => "Where are you currently located (city, country)?",
        Field::TechStack => {
            "Please list your tech stack (languages, frameworks, databases, tools)."
        }
    }
}

pub fn closing_message(mood: Mood) -> String {
    format!(
        "Thank you for your time! {} We'll review your details and get back to you with next steps.",
        mood.tag()
    )
}

pub fn format_tech_questions(questions: &[String]) -> String {
    let numbered = questions
        .iter()
        .enumerate()
        .map(|(i, q)| format!("{}. {}", i + 1, q))
        .collect::<Vec<_>>()
        .join("\n");
    format!("{TECH_QUESTIONS_INTRO}\n{numbered}")
}

/// Handles one user message against the session and returns the assistant replies.
///
/// Ended sessions reject input until restarted. An exit turn appends exactly one
/// closing message and leaves the profile untouched.
pub async fn handle_turn(
    session: &mut Session,
    text: &str,
    responder: &Responder,
) -> Result<TurnOutcome, AppError> {
    if session.is_ended() {
        return Err(AppError::SessionEnded(
            "This conversation has ended. Restart the session to begin again.".to_string(),
        ));
    }

    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::Validation("text cannot be empty".to_string()));
    }

    session.push(Role::User, text);

    if detect_exit(text) {
        session.phase = DialoguePhase::Ended;
        let reply = session
            .push(Role::Assistant, closing_message(rule_sentiment(text)))
            .clone();
        info!(session_id = %session.id, "Candidate ended the conversation");
        return Ok(TurnOutcome {
            replies: vec![reply],
            filled: Vec::new(),
            phase: session.phase,
            next_missing_field: next_missing_field(&session.profile),
        });
    }

    let filled = accumulate(&mut session.profile, text);
    if !filled.is_empty() {
        // Field names only; values are PII.
        debug!(session_id = %session.id, ?filled, "Profile fields filled");
    }

    let reply = match next_missing_field(&session.profile) {
        Some(field) => {
            session.phase = DialoguePhase::Collecting;
            match responder.respond(&turn_request(session, Some(field))).await {
                ChatOutcome::Reply(text) => text,
                ChatOutcome::Unavailable(_) => field_prompt(field).to_string(),
            }
        }
        None if !session.asked_tech_questions => {
            let tech_stack = session.profile.tech_stack.clone().unwrap_or_default();
            let questions = generate_tech_questions(&tech_stack, responder).await;
            session.asked_tech_questions = true;
            session.phase = DialoguePhase::AwaitingTechQuestions;
            info!(
                session_id = %session.id,
                count = questions.len(),
                "Profile complete, tech questions sent"
            );
            format_tech_questions(&questions)
        }
        None => {
            session.phase = DialoguePhase::Done;
            match responder.respond(&turn_request(session, None)).await {
                ChatOutcome::Reply(text) => text,
                ChatOutcome::Unavailable(_) => FOLLOW_UP_ACK.to_string(),
            }
        }
    };

    let reply = session.push(Role::Assistant, reply).clone();

    Ok(TurnOutcome {
        replies: vec![reply],
        filled,
        phase: session.phase,
        next_missing_field: next_missing_field(&session.profile),
    })
}

/// System prompt with the current profile and open slot, plus the recent log.
fn turn_request(session: &Session, missing: Option<Field>) -> ChatRequest {
    let candidate_json = serde_json::to_string(&session.profile).unwrap_or_default();
    let context = TURN_CONTEXT_TEMPLATE
        .replace("{candidate_json}", &candidate_json)
        .replace("{missing_field}", missing.map_or("none", |f| f.as_str()));

    ChatRequest {
        system: format!("{INTAKE_SYSTEM}\n\n{context}"),
        messages: session.recent_messages(CONTEXT_WINDOW),
        temperature: 0.2,
        max_tokens: 400,
    }
}
