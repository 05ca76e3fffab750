//! Game phase enum.
//!
//! A session moves forward through `intro -> investigation -> reasoning -> outro`.
//! `end` sits outside that sequence: it is reached only through an explicit
//! termination and nothing follows it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Narrative phase of a user's game session.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (phase IN ('intro', 'investigation', 'reasoning', 'outro', 'end'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Intro,
    Investigation,
    Reasoning,
    Outro,
    End,
}

impl Phase {
    /// All phases, in declaration order.
    pub const ALL: [Phase; 5] = [
        Phase::Intro,
        Phase::Investigation,
        Phase::Reasoning,
        Phase::Outro,
        Phase::End,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Intro => "intro",
            Phase::Investigation => "investigation",
            Phase::Reasoning => "reasoning",
            Phase::Outro => "outro",
            Phase::End => "end",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "intro" => Ok(Phase::Intro),
            "investigation" => Ok(Phase::Investigation),
            "reasoning" => Ok(Phase::Reasoning),
            "outro" => Ok(Phase::Outro),
            "end" => Ok(Phase::End),
            other => Err(format!("invalid phase: '{other}'")),
        }
    }
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Intro
    }
}
