//! Infrastructure adapters for the escape-room chat game.
//!
//! Implements the ports defined in `escapebot-core`:
//! - [`sqlite::session::SqliteSessionStore`] for `SessionStore`
//! - [`llm::OpenAiProvider`] for `LlmProvider`
//! - [`line::LineReplyClient`] for `ReplyTransport`
//!
//! plus startup configuration loading in [`config`].

pub mod config;
pub mod line;
pub mod llm;
pub mod sqlite;
