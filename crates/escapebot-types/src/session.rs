//! Session record and talk history types.
//!
//! One `Session` exists per chat user. `HistoryEntry` is the write shape of a
//! completed exchange; `HistoryRecord` is what the store hands back, with the
//! message and reply columns left optional so incomplete rows can be skipped
//! when building model context.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::phase::Phase;

/// Per-user game state.
///
/// `count` tracks interactions during the intro, `limit` tracks the
/// investigation time budget. Neither is reset on a phase change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub phase: Phase,
    pub count: u32,
    pub limit: u32,
}

impl Session {
    /// A fresh session for a user seen for the first time.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            phase: Phase::Intro,
            count: 0,
            limit: 0,
        }
    }
}

/// The two atomically incremented session counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Counter {
    Count,
    Limit,
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Counter::Count => write!(f, "count"),
            Counter::Limit => write!(f, "limit"),
        }
    }
}

impl FromStr for Counter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "count" => Ok(Counter::Count),
            "limit" => Ok(Counter::Limit),
            other => Err(format!("invalid counter: '{other}'")),
        }
    }
}

/// A completed exchange to append to the talk history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub user_id: String,
    /// Local time of the exchange in the configured game timezone.
    pub timestamp: DateTime<FixedOffset>,
    pub message: String,
    pub reply: String,
}

/// A stored exchange as read back from the talk history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub timestamp: Option<String>,
    pub message: Option<String>,
    pub reply: Option<String>,
}

impl From<HistoryEntry> for HistoryRecord {
    fn from(entry: HistoryEntry) -> Self {
        Self {
            timestamp: Some(entry.timestamp.to_rfc3339()),
            message: Some(entry.message),
            reply: Some(entry.reply),
        }
    }
}
