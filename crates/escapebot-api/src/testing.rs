//! Test harness for the binary: a real SQLite store in a temp directory, a provider
//! answering from a script, and a transport that records what it was asked
//! to send.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use secrecy::SecretString;
use tempfile::TempDir;

use escapebot_core::llm::LlmProvider;
use escapebot_core::repository::SessionStore;
use escapebot_core::transport::ReplyTransport;
use escapebot_core::turn::TurnOrchestrator;
use escapebot_infra::sqlite::pool::{DatabasePool, database_url};
use escapebot_infra::sqlite::session::SqliteSessionStore;
use escapebot_types::config::GameConfig;
use escapebot_types::error::TransportError;
use escapebot_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, StopReason, Usage,
};
use escapebot_types::phase::Phase;
use escapebot_types::session::Session;

use crate::state::AppState;

pub const CHANNEL_SECRET: &str = "test-channel-secret";

/// Provider answering each request with the next scripted text.
pub struct ScriptedText(Mutex<VecDeque<String>>);

impl LlmProvider for ScriptedText {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, _request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let content = self.0.lock().unwrap().pop_front().ok_or_else(|| LlmError::Provider {
            message: "script exhausted".to_string(),
        })?;
        Ok(CompletionResponse {
            id: "scripted".to_string(),
            content,
            function_call: None,
            model: "scripted".to_string(),
            stop_reason: StopReason::EndTurn,
            usage: Usage::default(),
        })
    }
}

/// Transport keeping every `(reply_token, segments)` pair it was given.
#[derive(Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<(String, Vec<String>)>>>);

impl ReplyTransport for Recorder {
    async fn send_reply(&self, reply_token: &str, segments: &[String]) -> Result<(), TransportError> {
        self.0
            .lock()
            .unwrap()
            .push((reply_token.to_string(), segments.to_vec()));
        Ok(())
    }
}

pub struct TestHarness {
    _dir: TempDir,
    store: SqliteSessionStore,
    recorder: Recorder,
    state: AppState<SqliteSessionStore, ScriptedText, Recorder>,
}

impl TestHarness {
    /// Every phase gets a prompt; `script` holds the model's answers in order.
    pub async fn new(script: &[&str]) -> Self {
        let dir = TempDir::new().unwrap();
        let store = SqliteSessionStore::new(
            DatabasePool::new(&database_url(dir.path())).await.unwrap(),
        );
        for phase in Phase::ALL {
            store.set_prompt(phase, &format!("prompt:{phase}")).await.unwrap();
        }

        let provider = ScriptedText(Mutex::new(script.iter().map(|s| s.to_string()).collect()));
        let recorder = Recorder::default();
        let orchestrator = TurnOrchestrator::new(
            store.clone(),
            provider,
            recorder.clone(),
            GameConfig::default(),
        );
        let state = AppState::new(
            orchestrator,
            SecretString::from(CHANNEL_SECRET.to_string()),
            chrono_tz::Asia::Tokyo,
        );

        Self {
            _dir: dir,
            store,
            recorder,
            state,
        }
    }

    pub fn state(&self) -> AppState<SqliteSessionStore, ScriptedText, Recorder> {
        self.state.clone()
    }

    pub fn store(&self) -> &SqliteSessionStore {
        &self.store
    }

    pub fn sent(&self) -> Vec<(String, Vec<String>)> {
        self.recorder.0.lock().unwrap().clone()
    }

    pub async fn session(&self, user_id: &str) -> Option<Session> {
        self.store.get_session(user_id).await.unwrap()
    }
}

/// A webhook body carrying one text message from `user_id`.
pub fn text_event_body(user_id: &str, reply_token: &str, text: &str) -> String {
    serde_json::json!({
        "destination": "Ubot",
        "events": [{
            "type": "message",
            "replyToken": reply_token,
            "timestamp": 1709294400000i64,
            "source": { "type": "user", "userId": user_id },
            "message": { "id": "m1", "type": "text", "text": text }
        }]
    })
    .to_string()
}
