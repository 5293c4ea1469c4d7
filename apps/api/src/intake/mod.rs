// Candidate intake: field extraction, profile accumulation, dialogue policy,
// question generation, exit detection, sessions, and snapshots.
// LLM calls go through llm_client::Responder only.

pub mod accumulate;
pub mod dialogue;
pub mod exit;
pub mod extract;
pub mod handlers;
pub mod profile;
pub mod questions;
pub mod sentiment;
pub mod session;
pub mod snapshot;
