//! Turn orchestrator.
//!
//! One inbound chat message is one turn: load the session, answer fixed
//! keywords directly, otherwise update the counters, ask the model, apply
//! any requested function, resolve endings and clue documents, record the
//! exchange, and send the collected reply segments in a single call.
//!
//! Failures never reach the player. Each step either aborts the turn, in
//! which case nothing is sent, or is tolerated and the turn carries on
//! without that step's effect.

use chrono::{DateTime, FixedOffset};
use escapebot_types::config::GameConfig;
use escapebot_types::llm::Message;
use escapebot_types::phase::Phase;
use escapebot_types::session::{Counter, HistoryEntry, Session};
use tracing::{Instrument, error, info, info_span, warn};

use crate::error::TurnError;
use crate::history;
use crate::llm::{Generator, LlmProvider, Variant};
use crate::phase::{IntroBudget, PhaseMachine, TimeLimitNotice, intro_budget, time_limit_notice};
use crate::repository::SessionStore;
use crate::router::{FunctionRouter, game_functions};
use crate::store::StoreAdapter;
use crate::transport::ReplyTransport;

/// A text message received from a player.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub user_id: String,
    pub reply_token: String,
    pub text: String,
    /// Receive time in the game timezone; stamped on the history entry.
    pub received_at: DateTime<FixedOffset>,
}

/// How a turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// A fixed line was sent without consulting the model.
    ShortCircuited { replies: Vec<String>, delivered: bool },
    /// The model was consulted and its answer sent.
    Answered { replies: Vec<String>, delivered: bool },
    /// The turn failed and nothing was sent.
    Aborted,
}

impl TurnOutcome {
    pub fn replies(&self) -> &[String] {
        match self {
            TurnOutcome::ShortCircuited { replies, .. } | TurnOutcome::Answered { replies, .. } => {
                replies
            }
            TurnOutcome::Aborted => &[],
        }
    }
}

/// Result of the keyword checks made before any generation.
enum Gate {
    Reply(Vec<String>),
    Proceed(Phase),
}

enum Computed {
    Fixed(Vec<String>),
    Generated(Vec<String>),
}

/// Log a failed step the turn can live without.
fn tolerate<T>(result: Result<T, TurnError>, step: &'static str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(step, kind = e.kind(), error = %e, "continuing turn without step");
            None
        }
    }
}

/// Drives every turn against injected store, model, and transport handles.
pub struct TurnOrchestrator<S: SessionStore, L: LlmProvider, T: ReplyTransport> {
    store: StoreAdapter<S>,
    generator: Generator<L>,
    transport: T,
    config: GameConfig,
}

impl<S: SessionStore, L: LlmProvider, T: ReplyTransport> TurnOrchestrator<S, L, T> {
    pub fn new(store: S, provider: L, transport: T, config: GameConfig) -> Self {
        let generator = Generator::new(provider, config.generation.clone(), game_functions());
        Self {
            store: StoreAdapter::new(store),
            generator,
            transport,
            config,
        }
    }

    pub fn store(&self) -> &S {
        self.store.inner()
    }

    pub fn provider(&self) -> &L {
        self.generator.provider()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Process one inbound message end to end.
    pub async fn handle_turn(&self, inbound: &InboundMessage) -> TurnOutcome {
        let span = info_span!("turn", user_id = %inbound.user_id);

        async {
            match self.compute(inbound).await {
                Ok(Computed::Fixed(replies)) => {
                    let delivered = self.deliver(inbound, &replies).await;
                    TurnOutcome::ShortCircuited { replies, delivered }
                }
                Ok(Computed::Generated(replies)) => {
                    let delivered = self.deliver(inbound, &replies).await;
                    TurnOutcome::Answered { replies, delivered }
                }
                Err(e) => {
                    error!(kind = e.kind(), error = %e, "turn aborted, no reply sent");
                    TurnOutcome::Aborted
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn compute(&self, inbound: &InboundMessage) -> Result<Computed, TurnError> {
        let session = self.store.load_or_create(&inbound.user_id).await?;
        info!(phase = %session.phase, count = session.count, limit = session.limit, "turn started");

        let phase = match self.gate(&session, &inbound.text).await? {
            Gate::Reply(replies) => return Ok(Computed::Fixed(replies)),
            Gate::Proceed(phase) => phase,
        };

        self.generate_reply(inbound, phase).await.map(Computed::Generated)
    }

    async fn gate(&self, session: &Session, query: &str) -> Result<Gate, TurnError> {
        let user_id = session.user_id.as_str();
        let keywords = &self.config.keywords;
        let lines = &self.config.lines;
        let machine = PhaseMachine::new(&self.store);

        let gate = match session.phase {
            Phase::Investigation if keywords.is_meta_query(query) => {
                info!("meta question deflected");
                Gate::Reply(vec![lines.deflection.clone()])
            }
            Phase::Intro if keywords.is_ready_query(query) => {
                tolerate(machine.advance(user_id, Phase::Intro).await, "start investigation");
                Gate::Reply(vec![lines.opening.clone()])
            }
            Phase::Outro if keywords.is_finish_query(query) => {
                let terminated = tolerate(machine.terminate(user_id).await, "finish session");
                let current = match (self.store.current_phase(user_id).await, terminated) {
                    (Ok(phase), _) => phase,
                    (Err(_), Some(_)) => Phase::End,
                    (Err(e), None) => return Err(e),
                };
                match current {
                    Phase::End => Gate::Reply(vec![lines.survey.clone()]),
                    Phase::Outro => Gate::Reply(vec![lines.finish_reading.clone()]),
                    other => Gate::Proceed(other),
                }
            }
            Phase::Outro => Gate::Reply(vec![lines.finish_reading.clone()]),
            Phase::End => Gate::Reply(vec![lines.survey.clone()]),
            phase => Gate::Proceed(phase),
        };
        Ok(gate)
    }

    async fn generate_reply(
        &self,
        inbound: &InboundMessage,
        phase: Phase,
    ) -> Result<Vec<String>, TurnError> {
        let user_id = inbound.user_id.as_str();
        let lines = &self.config.lines;
        let machine = PhaseMachine::new(&self.store);

        let mut replies = Vec::new();
        // `phase` picks the prompt and request shape for the whole turn;
        // `resulting_phase` follows the transitions made along the way.
        let mut resulting_phase = phase;

        let count = tolerate(self.store.increment(user_id, Counter::Count).await, "count turn");
        if phase == Phase::Intro {
            match count.map(intro_budget) {
                Some(IntroBudget::Warning) => replies.push(lines.intro_warning.clone()),
                Some(IntroBudget::Exhausted) => {
                    // Applies from the next turn; this one is still answered.
                    if tolerate(machine.terminate(user_id).await, "close intro").is_some() {
                        resulting_phase = Phase::End;
                    }
                }
                Some(IntroBudget::Open) | None => {}
            }
        }

        // Set on the turn that uses up the investigation time. The advance
        // waits until the function call is routed, so the router still sees
        // `investigation`.
        let mut time_up = false;
        if phase == Phase::Investigation {
            let limit = tolerate(self.store.increment(user_id, Counter::Limit).await, "count time");
            match limit.and_then(time_limit_notice) {
                Some(TimeLimitNotice::Half) => replies.push(lines.time_half.clone()),
                Some(TimeLimitNotice::Warning) => replies.push(lines.time_warning.clone()),
                Some(TimeLimitNotice::TimeUp) => {
                    replies.push(lines.time_up.clone());
                    time_up = true;
                }
                None => {}
            }
        }

        let messages = self.build_context(user_id, phase, &inbound.text).await?;

        let variant = if phase == Phase::Reasoning {
            Variant::Reasoning
        } else {
            Variant::FunctionCalling
        };
        let response = self.generator.generate(&messages, variant).await?;
        if response.is_empty() {
            return Err(TurnError::EmptyGeneration);
        }

        let mut answer = response.content.trim().to_string();
        let mut primary_url: Option<String> = None;
        let mut explanation_url: Option<String> = None;

        if let Some(call) = &response.function_call {
            let router = FunctionRouter::new(&self.store, &self.generator, &self.config.urls);
            let outcome = router.route(user_id, call, &messages).await?;
            if let Some(follow_up) = outcome.answer {
                answer = follow_up;
            }
            primary_url = outcome.location_url;
            if let Some(advanced) = outcome.advanced_to {
                resulting_phase = advanced;
            }
        }

        if time_up && resulting_phase == Phase::Investigation {
            if let Some(next) = tolerate(machine.advance(user_id, phase).await, "end investigation") {
                resulting_phase = next;
            }
        }

        if answer.is_empty() {
            return Err(TurnError::EmptyGeneration);
        }
        replies.push(answer.clone());

        if phase == Phase::Reasoning {
            if let Some(keyword) = self.config.keywords.find_ending(&answer) {
                info!(keyword, "ending reached");
                replies.push(lines.ending_marker.clone());
                primary_url = self.config.urls.ending_url(keyword).map(str::to_string);
                if primary_url.is_none() {
                    warn!(keyword, "no ending document configured");
                }
                if let Some(next) = tolerate(machine.advance(user_id, phase).await, "enter outro") {
                    resulting_phase = next;
                }
                explanation_url = Some(self.config.urls.explanation.clone());
            }
        }

        if let Some(url) = primary_url {
            replies.push(url);
        } else if let Some(url) = explanation_url {
            replies.push(lines.explanation_label.clone());
            replies.push(url);
        }

        if resulting_phase != Phase::Intro {
            let entry = HistoryEntry {
                user_id: user_id.to_string(),
                timestamp: inbound.received_at,
                message: inbound.text.clone(),
                reply: answer,
            };
            tolerate(self.store.append_history(&entry).await, "record exchange");
        }

        info!(
            phase = %phase,
            resulting_phase = %resulting_phase,
            segments = replies.len(),
            "turn answered"
        );
        Ok(replies)
    }

    /// System prompt, then replayed history, then the player's message.
    async fn build_context(
        &self,
        user_id: &str,
        phase: Phase,
        query: &str,
    ) -> Result<Vec<Message>, TurnError> {
        let prompt = self.store.prompt_for(phase).await?;
        let mut messages = vec![Message::system(prompt)];

        if phase != Phase::Reasoning {
            let window = self.config.history_window;
            let records = tolerate(
                self.store.recent_history(user_id, window).await,
                "load history",
            )
            .unwrap_or_default();
            messages.extend(history::window(records, window as usize));
        }

        messages.push(Message::user(query));
        Ok(messages)
    }

    async fn deliver(&self, inbound: &InboundMessage, replies: &[String]) -> bool {
        match self.transport.send_reply(&inbound.reply_token, replies).await {
            Ok(()) => {
                info!(segments = replies.len(), "reply sent");
                true
            }
            Err(e) => {
                warn!(error = %e, delivered = false, "reply delivery failed");
                false
            }
        }
    }
}
