//! Turn-level error type.
//!
//! Every component of a turn returns `TurnError`. The orchestrator decides per
//! variant whether the turn aborts silently or carries on degraded; the chat
//! user never sees any of these.

use escapebot_types::error::{PhaseError, RepositoryError, TransportError};
use escapebot_types::llm::LlmError;
use escapebot_types::phase::Phase;

#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("store operation '{action}' failed: {source}")]
    Store {
        action: &'static str,
        source: RepositoryError,
    },

    #[error("no prompt stored for phase '{0}'")]
    PromptMissing(Phase),

    #[error("invalid phase transition: {0}")]
    Phase(#[from] PhaseError),

    #[error("generation failed: {0}")]
    Generation(#[from] LlmError),

    #[error("generation returned neither text nor a function call")]
    EmptyGeneration,

    #[error("malformed call to '{name}': {reason}")]
    MalformedFunctionCall { name: String, reason: String },

    #[error("reply delivery failed: {0}")]
    Transport(#[from] TransportError),
}

impl TurnError {
    /// Short label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            TurnError::Store { .. } => "store",
            TurnError::PromptMissing(_) => "prompt_missing",
            TurnError::Phase(_) => "phase",
            TurnError::Generation(_) | TurnError::EmptyGeneration => "generation",
            TurnError::MalformedFunctionCall { .. } => "function_call",
            TurnError::Transport(_) => "transport",
        }
    }
}
