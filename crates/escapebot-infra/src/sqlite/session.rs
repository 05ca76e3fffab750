//! SQLite session store implementation.
//!
//! Implements `SessionStore` from `escapebot-core` using sqlx with split
//! read/write pools: raw queries, a private Row struct, reads on the reader
//! pool and every mutation on the single writer connection.

use chrono::Utc;
use escapebot_core::repository::SessionStore;
use escapebot_types::error::RepositoryError;
use escapebot_types::phase::Phase;
use escapebot_types::session::{Counter, HistoryEntry, HistoryRecord, Session};
use sqlx::Row;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `SessionStore`.
#[derive(Clone)]
pub struct SqliteSessionStore {
    pool: DatabasePool,
}

impl SqliteSessionStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Create or replace the prompt template of a phase.
    pub async fn set_prompt(&self, phase: Phase, prompt: &str) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO prompts (phase, prompt, updated_at) VALUES (?, ?, ?)
               ON CONFLICT(phase) DO UPDATE SET prompt = excluded.prompt, updated_at = excluded.updated_at"#,
        )
        .bind(phase.as_str())
        .bind(prompt)
        .bind(now())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        tracing::debug!(phase = %phase, "prompt template stored");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Private Row type for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct SessionRow {
    user_id: String,
    phase: String,
    turn_count: i64,
    limit_count: i64,
}

impl SessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            user_id: row.try_get("user_id")?,
            phase: row.try_get("phase")?,
            turn_count: row.try_get("turn_count")?,
            limit_count: row.try_get("limit_count")?,
        })
    }

    fn into_session(self) -> Result<Session, RepositoryError> {
        let phase: Phase = self
            .phase
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(Session {
            user_id: self.user_id,
            phase,
            count: to_counter(self.turn_count)?,
            limit: to_counter(self.limit_count)?,
        })
    }
}

fn to_counter(value: i64) -> Result<u32, RepositoryError> {
    u32::try_from(value).map_err(|_| RepositoryError::Query(format!("counter out of range: {value}")))
}

fn counter_column(counter: Counter) -> &'static str {
    match counter {
        Counter::Count => "turn_count",
        Counter::Limit => "limit_count",
    }
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

// ---------------------------------------------------------------------------
// SessionStore implementation
// ---------------------------------------------------------------------------

impl SessionStore for SqliteSessionStore {
    async fn get_session(&self, user_id: &str) -> Result<Option<Session>, RepositoryError> {
        let row = sqlx::query(
            "SELECT user_id, phase, turn_count, limit_count FROM sessions WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let session_row =
                    SessionRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(session_row.into_session()?))
            }
            None => Ok(None),
        }
    }

    async fn put_session(&self, session: &Session) -> Result<(), RepositoryError> {
        let timestamp = now();
        sqlx::query(
            r#"INSERT INTO sessions (user_id, phase, turn_count, limit_count, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?)
               ON CONFLICT(user_id) DO UPDATE SET
                   phase = excluded.phase,
                   turn_count = excluded.turn_count,
                   limit_count = excluded.limit_count,
                   updated_at = excluded.updated_at"#,
        )
        .bind(&session.user_id)
        .bind(session.phase.as_str())
        .bind(i64::from(session.count))
        .bind(i64::from(session.limit))
        .bind(&timestamp)
        .bind(&timestamp)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn increment_counter(
        &self,
        user_id: &str,
        counter: Counter,
    ) -> Result<u32, RepositoryError> {
        let column = counter_column(counter);
        // Single statement, so the read-modify-write is atomic per row.
        let query = format!(
            "UPDATE sessions SET {column} = {column} + 1, updated_at = ? WHERE user_id = ? RETURNING {column}"
        );

        let row = sqlx::query(&query)
            .bind(now())
            .bind(user_id)
            .fetch_optional(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?
            .ok_or(RepositoryError::NotFound)?;

        let value: i64 = row
            .try_get(column)
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        to_counter(value)
    }

    async fn set_phase(&self, user_id: &str, phase: Phase) -> Result<Session, RepositoryError> {
        let row = sqlx::query(
            r#"UPDATE sessions SET phase = ?, updated_at = ? WHERE user_id = ?
               RETURNING user_id, phase, turn_count, limit_count"#,
        )
        .bind(phase.as_str())
        .bind(now())
        .bind(user_id)
        .fetch_optional(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?
        .ok_or(RepositoryError::NotFound)?;

        SessionRow::from_row(&row)
            .map_err(|e| RepositoryError::Query(e.to_string()))?
            .into_session()
    }

    async fn append_history(&self, entry: &HistoryEntry) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO talk_history (user_id, recorded_at, message, reply) VALUES (?, ?, ?, ?)",
        )
        .bind(&entry.user_id)
        .bind(entry.timestamp.to_rfc3339())
        .bind(&entry.message)
        .bind(&entry.reply)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn query_history(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<HistoryRecord>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT recorded_at, message, reply FROM (
                   SELECT id, recorded_at, message, reply FROM talk_history
                   WHERE user_id = ? ORDER BY id DESC LIMIT ?
               ) ORDER BY id ASC"#,
        )
        .bind(user_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter()
            .map(|row| {
                Ok(HistoryRecord {
                    timestamp: row.try_get("recorded_at")?,
                    message: row.try_get("message")?,
                    reply: row.try_get("reply")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(|e| RepositoryError::Query(e.to_string()))
    }

    async fn get_prompt(&self, phase: Phase) -> Result<Option<String>, RepositoryError> {
        sqlx::query_scalar::<_, String>("SELECT prompt FROM prompts WHERE phase = ?")
            .bind(phase.as_str())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))
    }
}
