//! Shared domain types for the escape-room chat game.
//!
//! This crate contains the types used across the workspace: game phases,
//! session records, talk history, LLM request/response shapes, the game
//! script configuration, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod config;
pub mod error;
pub mod llm;
pub mod phase;
pub mod session;
