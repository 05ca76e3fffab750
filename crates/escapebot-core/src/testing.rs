//! In-memory fakes of the ports, shared by the unit tests of this crate.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use escapebot_types::error::{RepositoryError, TransportError};
use escapebot_types::llm::{
    CompletionRequest, CompletionResponse, FunctionCall, LlmError, StopReason, Usage,
};
use escapebot_types::phase::Phase;
use escapebot_types::session::{Counter, HistoryEntry, HistoryRecord, Session};

use crate::llm::LlmProvider;
use crate::repository::SessionStore;
use crate::transport::ReplyTransport;

/// HashMap-backed store. Operations named in `fail_on` return a query error.
#[derive(Default)]
pub struct InMemoryStore {
    sessions: Mutex<HashMap<String, Session>>,
    history: Mutex<HashMap<String, Vec<HistoryRecord>>>,
    prompts: HashMap<Phase, String>,
    failing: HashSet<&'static str>,
    /// Operations that fail once they have succeeded this many times.
    failing_after: HashMap<&'static str, usize>,
    calls: Mutex<HashMap<&'static str, usize>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prompt(mut self, phase: Phase, prompt: &str) -> Self {
        self.prompts.insert(phase, prompt.to_string());
        self
    }

    /// A prompt `"prompt:{phase}"` for every phase.
    pub fn with_all_prompts(self) -> Self {
        Phase::ALL.into_iter().fold(self, |store, phase| {
            let prompt = format!("prompt:{phase}");
            store.with_prompt(phase, &prompt)
        })
    }

    pub fn with_session(self, session: Session) -> Self {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.user_id.clone(), session);
        self
    }

    pub fn with_history(self, user_id: &str, records: Vec<HistoryRecord>) -> Self {
        self.history
            .lock()
            .unwrap()
            .entry(user_id.to_string())
            .or_default()
            .extend(records);
        self
    }

    pub fn fail_on(mut self, action: &'static str) -> Self {
        self.failing.insert(action);
        self
    }

    pub fn fail_after(mut self, action: &'static str, successes: usize) -> Self {
        self.failing_after.insert(action, successes);
        self
    }

    pub fn session(&self, user_id: &str) -> Option<Session> {
        self.sessions.lock().unwrap().get(user_id).cloned()
    }

    pub fn history(&self, user_id: &str) -> Vec<HistoryRecord> {
        self.history
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    fn check(&self, action: &'static str) -> Result<(), RepositoryError> {
        let calls = {
            let mut calls = self.calls.lock().unwrap();
            let count = calls.entry(action).or_default();
            *count += 1;
            *count
        };
        let exhausted = self
            .failing_after
            .get(action)
            .is_some_and(|successes| calls > *successes);
        if exhausted || self.failing.contains(action) {
            return Err(RepositoryError::Query(format!("injected failure in {action}")));
        }
        Ok(())
    }
}

impl SessionStore for InMemoryStore {
    async fn get_session(&self, user_id: &str) -> Result<Option<Session>, RepositoryError> {
        self.check("get_session")?;
        Ok(self.session(user_id))
    }

    async fn put_session(&self, session: &Session) -> Result<(), RepositoryError> {
        self.check("put_session")?;
        self.sessions
            .lock()
            .unwrap()
            .insert(session.user_id.clone(), session.clone());
        Ok(())
    }

    async fn increment_counter(
        &self,
        user_id: &str,
        counter: Counter,
    ) -> Result<u32, RepositoryError> {
        self.check("increment_counter")?;
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions.get_mut(user_id).ok_or(RepositoryError::NotFound)?;
        let value = match counter {
            Counter::Count => &mut session.count,
            Counter::Limit => &mut session.limit,
        };
        *value += 1;
        Ok(*value)
    }

    async fn set_phase(&self, user_id: &str, phase: Phase) -> Result<Session, RepositoryError> {
        self.check("set_phase")?;
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions.get_mut(user_id).ok_or(RepositoryError::NotFound)?;
        session.phase = phase;
        Ok(session.clone())
    }

    async fn append_history(&self, entry: &HistoryEntry) -> Result<(), RepositoryError> {
        self.check("append_history")?;
        self.history
            .lock()
            .unwrap()
            .entry(entry.user_id.clone())
            .or_default()
            .push(entry.clone().into());
        Ok(())
    }

    async fn query_history(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<HistoryRecord>, RepositoryError> {
        self.check("query_history")?;
        let records = self.history(user_id);
        let skip = records.len().saturating_sub(limit as usize);
        Ok(records.into_iter().skip(skip).collect())
    }

    async fn get_prompt(&self, phase: Phase) -> Result<Option<String>, RepositoryError> {
        self.check("get_prompt")?;
        Ok(self.prompts.get(&phase).cloned())
    }
}

/// Provider answering from a queue. An exhausted queue is a provider error.
#[derive(Default)]
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<CompletionResponse>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(self, content: &str) -> Self {
        self.push(content.to_string(), None, StopReason::EndTurn)
    }

    pub fn function_call(self, name: &str, arguments: serde_json::Value) -> Self {
        let call = FunctionCall {
            name: name.to_string(),
            arguments,
        };
        self.push(String::new(), Some(call), StopReason::FunctionCall)
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn push(
        self,
        content: String,
        function_call: Option<FunctionCall>,
        stop_reason: StopReason,
    ) -> Self {
        {
            let mut responses = self.responses.lock().unwrap();
            let id = format!("scripted-{}", responses.len());
            responses.push_back(CompletionResponse {
                id,
                content,
                function_call,
                model: "scripted".to_string(),
                stop_reason,
                usage: Usage::default(),
            });
        }
        self
    }
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LlmError::Provider {
                message: "no scripted response left".to_string(),
            })
    }
}

/// Transport that records every reply it is asked to send.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<(String, Vec<String>)>>,
    failing: bool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<(String, Vec<String>)> {
        self.sent.lock().unwrap().clone()
    }
}

impl ReplyTransport for RecordingTransport {
    async fn send_reply(&self, reply_token: &str, segments: &[String]) -> Result<(), TransportError> {
        self.sent
            .lock()
            .unwrap()
            .push((reply_token.to_string(), segments.to_vec()));
        if self.failing {
            return Err(TransportError::Rejected {
                status: 400,
                body: "invalid reply token".to_string(),
            });
        }
        Ok(())
    }
}
