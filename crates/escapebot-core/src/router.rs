//! Handling of function calls requested by the model.
//!
//! The model may answer the first generation call with one of two game
//! functions instead of text. The router applies the function's effect and,
//! when the function is honored, asks the model again without functions to
//! get the words actually sent to the player.

use escapebot_types::config::UrlConfig;
use escapebot_types::llm::{FunctionCall, FunctionSchema, Message};
use escapebot_types::phase::Phase;
use serde_json::json;
use tracing::{info, warn};

use crate::error::TurnError;
use crate::llm::{Generator, LlmProvider, Variant};
use crate::phase::PhaseMachine;
use crate::repository::SessionStore;
use crate::store::StoreAdapter;

pub const SURVEY_LOCATION: &str = "want_survey_location";
pub const ADVANCE_INVESTIGATION: &str = "update_user_phase_investigation";

/// Schemas of the functions offered on function-calling requests.
pub fn game_functions() -> Vec<FunctionSchema> {
    vec![
        FunctionSchema {
            name: SURVEY_LOCATION.to_string(),
            description: "Called when the player asks to search or examine a specific place."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "location_name": {
                        "type": "string",
                        "description": "Name of the place the player wants to search."
                    }
                },
                "required": ["location_name"]
            }),
        },
        FunctionSchema {
            name: ADVANCE_INVESTIGATION.to_string(),
            description:
                "Called when the player says they have finished investigating and want to present their deduction."
                    .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {}
            }),
        },
    ]
}

/// Effects of a routed function call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteOutcome {
    /// Replacement answer from the follow-up generation, if one was made and
    /// produced text.
    pub answer: Option<String>,
    /// Clue document resolved for a searched location.
    pub location_url: Option<String>,
    /// Phase the session was moved to by the call.
    pub advanced_to: Option<Phase>,
}

pub struct FunctionRouter<'a, S: SessionStore, L: LlmProvider> {
    store: &'a StoreAdapter<S>,
    generator: &'a Generator<L>,
    urls: &'a UrlConfig,
}

impl<'a, S: SessionStore, L: LlmProvider> FunctionRouter<'a, S, L> {
    pub fn new(store: &'a StoreAdapter<S>, generator: &'a Generator<L>, urls: &'a UrlConfig) -> Self {
        Self {
            store,
            generator,
            urls,
        }
    }

    /// Apply `call` for the user and produce the follow-up answer.
    ///
    /// `messages` is the context of the first generation call and is reused
    /// unchanged for the follow-up call.
    pub async fn route(
        &self,
        user_id: &str,
        call: &FunctionCall,
        messages: &[Message],
    ) -> Result<RouteOutcome, TurnError> {
        // Re-read: a concurrent turn may have moved the phase since the turn began.
        let phase = self.store.current_phase(user_id).await?;
        info!(user_id, function = %call.name, phase = %phase, "routing function call");

        match call.name.as_str() {
            ADVANCE_INVESTIGATION => self.advance_investigation(user_id, phase, messages).await,
            SURVEY_LOCATION => self.survey_location(user_id, phase, call, messages).await,
            other => {
                warn!(user_id, function = other, "ignoring unrecognized function call");
                Ok(RouteOutcome::default())
            }
        }
    }

    async fn advance_investigation(
        &self,
        user_id: &str,
        phase: Phase,
        messages: &[Message],
    ) -> Result<RouteOutcome, TurnError> {
        let mut outcome = RouteOutcome::default();

        if phase == Phase::Investigation {
            match PhaseMachine::new(self.store).advance(user_id, phase).await {
                Ok(next) => outcome.advanced_to = Some(next),
                Err(e) => warn!(user_id, error = %e, "continuing without phase advance"),
            }
        } else {
            warn!(
                user_id,
                phase = %phase,
                "phase advance requested outside investigation, answering without it"
            );
        }

        outcome.answer = self.generator.generate_text(messages, Variant::FollowUp).await?;
        Ok(outcome)
    }

    async fn survey_location(
        &self,
        user_id: &str,
        phase: Phase,
        call: &FunctionCall,
        messages: &[Message],
    ) -> Result<RouteOutcome, TurnError> {
        if phase != Phase::Investigation {
            warn!(user_id, phase = %phase, "location survey outside investigation ignored");
            return Ok(RouteOutcome::default());
        }

        let location_name =
            call.string_arg("location_name")
                .ok_or_else(|| TurnError::MalformedFunctionCall {
                    name: call.name.clone(),
                    reason: "missing location_name".to_string(),
                })?;

        let location_url = self.urls.location_url(location_name).map(str::to_string);
        if location_url.is_none() {
            info!(user_id, location_name, "no clue document for location");
        }

        let answer = self.generator.generate_text(messages, Variant::FollowUp).await?;
        Ok(RouteOutcome {
            answer,
            location_url,
            advanced_to: None,
        })
    }
}
