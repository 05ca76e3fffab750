use thiserror::Error;

use crate::phase::Phase;

/// Errors from repository operations (used by the store trait in escapebot-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors from forward phase transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhaseError {
    /// The phase is the last one in the forward sequence.
    #[error("no phase follows '{0}'")]
    NoNextPhase(Phase),

    /// The phase is not part of the forward sequence at all.
    #[error("phase '{0}' cannot be advanced")]
    InvalidPhase(Phase),
}

/// Errors from delivering a reply to the messaging platform.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("messaging platform rejected the reply (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

/// Errors while loading startup configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variables are not set: {}", .0.join(", "))]
    MissingEnv(Vec<String>),

    #[error("failed to read config file: {0}")]
    Io(String),

    #[error("failed to parse config file: {0}")]
    Parse(String),

    #[error("unknown timezone: '{0}'")]
    InvalidTimezone(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }

    #[test]
    fn test_phase_error_display() {
        assert_eq!(
            PhaseError::NoNextPhase(Phase::Outro).to_string(),
            "no phase follows 'outro'"
        );
        assert_eq!(
            PhaseError::InvalidPhase(Phase::End).to_string(),
            "phase 'end' cannot be advanced"
        );
    }

    #[test]
    fn test_missing_env_lists_every_name() {
        let err = ConfigError::MissingEnv(vec![
            "CHANNEL_SECRET".to_string(),
            "SECRET_KEY".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "required environment variables are not set: CHANNEL_SECRET, SECRET_KEY"
        );
    }
}
