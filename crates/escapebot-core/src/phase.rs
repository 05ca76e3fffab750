//! Phase state machine and counter thresholds.
//!
//! Forward advancement follows `PHASE_ORDER`. `End` is only reachable through
//! [`PhaseMachine::terminate`] and never advances.

use escapebot_types::error::PhaseError;
use escapebot_types::phase::Phase;
use escapebot_types::session::Session;
use tracing::{info, warn};

use crate::error::TurnError;
use crate::repository::SessionStore;
use crate::store::StoreAdapter;

/// Forward-only phase sequence.
pub const PHASE_ORDER: [Phase; 4] = [
    Phase::Intro,
    Phase::Investigation,
    Phase::Reasoning,
    Phase::Outro,
];

/// Intro turn count at which the player is warned to start the game.
pub const INTRO_WARNING_AT: u32 = 19;
/// Intro turn count at which the session is closed.
pub const INTRO_CUTOFF_AT: u32 = 21;

pub const TIME_HALF_AT: u32 = 15;
pub const TIME_WARNING_AT: u32 = 25;
/// Investigation time budget; reaching it moves the game to the reasoning.
pub const TIME_UP_AT: u32 = 30;

/// Successor of `current` in the forward sequence.
pub fn next_phase(current: Phase) -> Result<Phase, PhaseError> {
    let position = PHASE_ORDER
        .iter()
        .position(|phase| *phase == current)
        .ok_or(PhaseError::InvalidPhase(current))?;

    PHASE_ORDER
        .get(position + 1)
        .copied()
        .ok_or(PhaseError::NoNextPhase(current))
}

pub fn is_terminal(phase: Phase) -> bool {
    phase == Phase::End
}

/// What the intro counter means for this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntroBudget {
    Open,
    Warning,
    Exhausted,
}

pub fn intro_budget(count: u32) -> IntroBudget {
    match count {
        INTRO_WARNING_AT => IntroBudget::Warning,
        INTRO_CUTOFF_AT => IntroBudget::Exhausted,
        _ => IntroBudget::Open,
    }
}

/// Narrative-pressure notices tied to the investigation time budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeLimitNotice {
    Half,
    Warning,
    /// Also forces the investigation to end.
    TimeUp,
}

pub fn time_limit_notice(limit: u32) -> Option<TimeLimitNotice> {
    match limit {
        TIME_HALF_AT => Some(TimeLimitNotice::Half),
        TIME_WARNING_AT => Some(TimeLimitNotice::Warning),
        TIME_UP_AT => Some(TimeLimitNotice::TimeUp),
        _ => None,
    }
}

/// Applies phase transitions to a user's stored session.
pub struct PhaseMachine<'a, S: SessionStore> {
    store: &'a StoreAdapter<S>,
}

impl<'a, S: SessionStore> PhaseMachine<'a, S> {
    pub fn new(store: &'a StoreAdapter<S>) -> Self {
        Self { store }
    }

    /// Move the user one step forward from `current` and persist it.
    pub async fn advance(&self, user_id: &str, current: Phase) -> Result<Phase, TurnError> {
        let next = next_phase(current).inspect_err(|e| {
            warn!(user_id, phase = %current, error = %e, "phase transition rejected");
        })?;
        self.store.set_phase(user_id, next).await?;
        info!(user_id, from = %current, to = %next, "phase advanced");
        Ok(next)
    }

    /// Close the session. Setting `End` again is harmless.
    pub async fn terminate(&self, user_id: &str) -> Result<Session, TurnError> {
        let session = self.store.set_phase(user_id, Phase::End).await?;
        info!(user_id, "session terminated");
        Ok(session)
    }
}
