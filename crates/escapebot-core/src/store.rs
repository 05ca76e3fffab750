//! Result-wrapping adapter around a [`SessionStore`].
//!
//! Each call logs a failure once, with the action name and its parameters,
//! and hands back a tagged [`TurnError::Store`]. Callers then decide whether
//! the failure aborts the turn or is tolerated.

use escapebot_types::error::RepositoryError;
use escapebot_types::phase::Phase;
use escapebot_types::session::{Counter, HistoryEntry, HistoryRecord, Session};
use tracing::{error, info};

use crate::error::TurnError;
use crate::repository::SessionStore;

/// Logging, error-tagging facade over the session store.
pub struct StoreAdapter<S: SessionStore> {
    inner: S,
}

fn store_failure(action: &'static str, params: String, source: RepositoryError) -> TurnError {
    error!(action, params = %params, error = %source, "store operation failed");
    TurnError::Store { action, source }
}

impl<S: SessionStore> StoreAdapter<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    /// Access the wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Load the user's session, creating a default one on first contact.
    pub async fn load_or_create(&self, user_id: &str) -> Result<Session, TurnError> {
        if let Some(session) = self.get(user_id).await? {
            return Ok(session);
        }

        let fresh = Session::new(user_id);
        self.inner
            .put_session(&fresh)
            .await
            .map_err(|e| store_failure("put_session", format!("user_id={user_id}"), e))?;
        info!(user_id, "created session for new player");

        self.get(user_id).await?.ok_or_else(|| {
            store_failure(
                "get_session",
                format!("user_id={user_id}"),
                RepositoryError::NotFound,
            )
        })
    }

    /// Read the current phase straight from the store.
    pub async fn current_phase(&self, user_id: &str) -> Result<Phase, TurnError> {
        self.get(user_id)
            .await?
            .map(|session| session.phase)
            .ok_or_else(|| {
                store_failure(
                    "get_session",
                    format!("user_id={user_id}"),
                    RepositoryError::NotFound,
                )
            })
    }

    pub async fn increment(&self, user_id: &str, counter: Counter) -> Result<u32, TurnError> {
        self.inner
            .increment_counter(user_id, counter)
            .await
            .map_err(|e| {
                store_failure(
                    "increment_counter",
                    format!("user_id={user_id} counter={counter}"),
                    e,
                )
            })
    }

    pub async fn set_phase(&self, user_id: &str, phase: Phase) -> Result<Session, TurnError> {
        self.inner.set_phase(user_id, phase).await.map_err(|e| {
            store_failure("set_phase", format!("user_id={user_id} phase={phase}"), e)
        })
    }

    pub async fn append_history(&self, entry: &HistoryEntry) -> Result<(), TurnError> {
        self.inner.append_history(entry).await.map_err(|e| {
            store_failure(
                "append_history",
                format!("user_id={} timestamp={}", entry.user_id, entry.timestamp),
                e,
            )
        })
    }

    pub async fn recent_history(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<HistoryRecord>, TurnError> {
        self.inner.query_history(user_id, limit).await.map_err(|e| {
            store_failure(
                "query_history",
                format!("user_id={user_id} limit={limit}"),
                e,
            )
        })
    }

    /// Fetch the prompt template of a phase; a missing template is an error.
    pub async fn prompt_for(&self, phase: Phase) -> Result<String, TurnError> {
        let prompt = self
            .inner
            .get_prompt(phase)
            .await
            .map_err(|e| store_failure("get_prompt", format!("phase={phase}"), e))?;

        prompt.ok_or_else(|| {
            error!(phase = %phase, "no prompt stored for phase");
            TurnError::PromptMissing(phase)
        })
    }

    async fn get(&self, user_id: &str) -> Result<Option<Session>, TurnError> {
        self.inner
            .get_session(user_id)
            .await
            .map_err(|e| store_failure("get_session", format!("user_id={user_id}"), e))
    }
}
