//! Application state wiring the game together.
//!
//! `Runtime` holds the process-wide resources every command needs. The
//! webhook server and console play each pin a [`TurnOrchestrator`] to the
//! SQLite store and the OpenAI-compatible provider, differing only in how
//! replies leave the process.

use std::path::PathBuf;
use std::sync::Arc;

use chrono_tz::Tz;
use secrecy::SecretString;

use escapebot_core::llm::LlmProvider;
use escapebot_core::repository::SessionStore;
use escapebot_core::transport::ReplyTransport;
use escapebot_core::turn::TurnOrchestrator;
use escapebot_infra::config::{
    Credentials, game_config_path, load_game_config, resolve_timezone,
};
use escapebot_infra::line::LineReplyClient;
use escapebot_infra::llm::OpenAiProvider;
use escapebot_infra::sqlite::pool::{DatabasePool, data_dir, database_url};
use escapebot_infra::sqlite::session::SqliteSessionStore;
use escapebot_types::config::GameConfig;

/// Orchestrator pinned to the concrete store and provider.
pub type LiveOrchestrator<T> = TurnOrchestrator<SqliteSessionStore, OpenAiProvider, T>;

/// Webhook state pinned to the concrete infra implementations.
pub type LiveState = AppState<SqliteSessionStore, OpenAiProvider, LineReplyClient>;

/// Resources shared by every command.
pub struct Runtime {
    pub data_dir: PathBuf,
    pub store: SqliteSessionStore,
    pub config: GameConfig,
    pub timezone: Tz,
}

impl Runtime {
    /// Create the data directory, open the database, and load the game script.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let pool = DatabasePool::new(&database_url(&data_dir)).await?;
        let config = load_game_config(&game_config_path(&data_dir)).await;
        let timezone = resolve_timezone(&config.timezone)?;

        tracing::debug!(data_dir = %data_dir.display(), %timezone, "runtime initialized");

        Ok(Self {
            data_dir,
            store: SqliteSessionStore::new(pool),
            config,
            timezone,
        })
    }

    /// Generation backend, honoring `OPENAI_BASE_URL` when set.
    pub fn provider(&self, secret_key: SecretString) -> OpenAiProvider {
        let provider = OpenAiProvider::new(secret_key);
        match env_override("OPENAI_BASE_URL") {
            Some(url) => provider.with_base_url(url),
            None => provider,
        }
    }

    pub fn orchestrator<T: ReplyTransport>(
        &self,
        secret_key: SecretString,
        transport: T,
    ) -> LiveOrchestrator<T> {
        TurnOrchestrator::new(
            self.store.clone(),
            self.provider(secret_key),
            transport,
            self.config.clone(),
        )
    }

    /// State for the webhook server. Needs every credential.
    pub fn live_state(&self, credentials: Credentials) -> LiveState {
        let client = LineReplyClient::new(credentials.channel_access_token);
        let client = match env_override("LINE_API_BASE_URL") {
            Some(url) => client.with_base_url(url),
            None => client,
        };

        AppState::new(
            self.orchestrator(credentials.secret_key, client),
            credentials.channel_secret,
            self.timezone,
        )
    }
}

fn env_override(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Shared state handed to the HTTP handlers.
pub struct AppState<S: SessionStore, L: LlmProvider, T: ReplyTransport> {
    pub orchestrator: Arc<TurnOrchestrator<S, L, T>>,
    pub channel_secret: Arc<SecretString>,
    pub timezone: Tz,
}

impl<S: SessionStore, L: LlmProvider, T: ReplyTransport> AppState<S, L, T> {
    pub fn new(
        orchestrator: TurnOrchestrator<S, L, T>,
        channel_secret: SecretString,
        timezone: Tz,
    ) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            channel_secret: Arc::new(channel_secret),
            timezone,
        }
    }
}

// Manual impl: the derive would require the type parameters to be Clone.
impl<S: SessionStore, L: LlmProvider, T: ReplyTransport> Clone for AppState<S, L, T> {
    fn clone(&self) -> Self {
        Self {
            orchestrator: Arc::clone(&self.orchestrator),
            channel_secret: Arc::clone(&self.channel_secret),
            timezone: self.timezone,
        }
    }
}
