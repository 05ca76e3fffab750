//! Game orchestration logic and port trait definitions.
//!
//! This crate defines the "ports" (`SessionStore`, `LlmProvider`,
//! `ReplyTransport`) that the infrastructure layer implements, and the
//! business logic that drives a chat session through the game phases.
//! It depends only on `escapebot-types` -- never on `escapebot-infra` or
//! any database/IO crate.

pub mod error;
pub mod history;
pub mod llm;
pub mod phase;
pub mod repository;
pub mod router;
pub mod store;
pub mod transport;
pub mod turn;

#[cfg(test)]
pub(crate) mod testing;
