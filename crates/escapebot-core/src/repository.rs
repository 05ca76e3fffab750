//! SessionStore trait definition.
//!
//! The storage interface for session records, talk history, and phase prompt
//! templates. Implementations live in escapebot-infra (e.g.,
//! `SqliteSessionStore`). Uses native async fn in traits (RPITIT).

use escapebot_types::error::RepositoryError;
use escapebot_types::phase::Phase;
use escapebot_types::session::{Counter, HistoryEntry, HistoryRecord, Session};

/// Repository trait for per-user game state.
///
/// Every operation is a single request/response against the backing store.
/// Counter increments must be atomic per user; nothing else is transactional.
pub trait SessionStore: Send + Sync {
    /// Get the session of a user, `None` if the user has never played.
    fn get_session(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Session>, RepositoryError>> + Send;

    /// Create or overwrite a session record.
    fn put_session(
        &self,
        session: &Session,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Atomically add one to a counter and return the new value.
    ///
    /// Returns `NotFound` if the user has no session.
    fn increment_counter(
        &self,
        user_id: &str,
        counter: Counter,
    ) -> impl std::future::Future<Output = Result<u32, RepositoryError>> + Send;

    /// Set the phase of a session and return the updated record.
    fn set_phase(
        &self,
        user_id: &str,
        phase: Phase,
    ) -> impl std::future::Future<Output = Result<Session, RepositoryError>> + Send;

    /// Append a completed exchange to the user's talk history.
    fn append_history(
        &self,
        entry: &HistoryEntry,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get the `limit` most recent exchanges of a user, oldest first.
    fn query_history(
        &self,
        user_id: &str,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<HistoryRecord>, RepositoryError>> + Send;

    /// Get the system prompt template for a phase, `None` if none is stored.
    fn get_prompt(
        &self,
        phase: Phase,
    ) -> impl std::future::Future<Output = Result<Option<String>, RepositoryError>> + Send;
}
