//! LlmProvider trait and the game's generation variants.
//!
//! The provider is the port the infrastructure layer implements. `Generator`
//! sits on top of it and knows the three request shapes a turn needs: the
//! first call that may answer with a function call, the follow-up call made
//! after a function was handled, and the reasoning verdict that is cut short
//! at the first sentence end.

use escapebot_types::config::GenerationConfig;
use escapebot_types::llm::{
    CompletionRequest, CompletionResponse, FunctionSchema, LlmError, Message,
};
use tracing::{debug, error};

use crate::error::TurnError;

/// Trait for chat-completion backends.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
/// Implementations live in escapebot-infra (e.g., `OpenAiProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "openai").
    fn name(&self) -> &str;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}

/// Shape of a generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Functions offered, no stop sequences.
    FunctionCalling,
    /// No functions, stops at the follow-up stop sequences.
    FollowUp,
    /// No functions, stops at the reasoning stop sequences.
    Reasoning,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::FunctionCalling => "function_calling",
            Variant::FollowUp => "follow_up",
            Variant::Reasoning => "reasoning",
        }
    }
}

/// Builds requests from the configured sampling parameters and sends them.
pub struct Generator<L: LlmProvider> {
    provider: L,
    config: GenerationConfig,
    functions: Vec<FunctionSchema>,
}

impl<L: LlmProvider> Generator<L> {
    pub fn new(provider: L, config: GenerationConfig, functions: Vec<FunctionSchema>) -> Self {
        Self {
            provider,
            config,
            functions,
        }
    }

    pub fn provider(&self) -> &L {
        &self.provider
    }

    /// Build the request for a variant without sending it.
    pub fn build_request(&self, messages: &[Message], variant: Variant) -> CompletionRequest {
        let (functions, stop) = match variant {
            Variant::FunctionCalling => (self.functions.clone(), None),
            Variant::FollowUp => (Vec::new(), non_empty(&self.config.followup_stop)),
            Variant::Reasoning => (Vec::new(), non_empty(&self.config.reasoning_stop)),
        };

        CompletionRequest {
            model: self.config.model.clone(),
            messages: messages.to_vec(),
            max_tokens: self.config.max_tokens,
            temperature: Some(self.config.temperature),
            top_p: Some(self.config.top_p),
            stop_sequences: stop,
            functions,
        }
    }

    /// Send one generation request.
    pub async fn generate(
        &self,
        messages: &[Message],
        variant: Variant,
    ) -> Result<CompletionResponse, TurnError> {
        debug!(
            provider = self.provider.name(),
            variant = variant.as_str(),
            message_count = messages.len(),
            messages = ?messages,
            "sending generation request"
        );

        let request = self.build_request(messages, variant);
        match self.provider.complete(&request).await {
            Ok(response) => {
                debug!(
                    variant = variant.as_str(),
                    stop_reason = ?response.stop_reason,
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    function_call = response.function_call.as_ref().map(|c| c.name.as_str()),
                    "generation completed"
                );
                Ok(response)
            }
            Err(e) => {
                error!(
                    provider = self.provider.name(),
                    variant = variant.as_str(),
                    error = %e,
                    "generation failed"
                );
                Err(TurnError::Generation(e))
            }
        }
    }

    /// Send a text-only request and return the trimmed text, `None` if blank.
    pub async fn generate_text(
        &self,
        messages: &[Message],
        variant: Variant,
    ) -> Result<Option<String>, TurnError> {
        let response = self.generate(messages, variant).await?;
        let text = response.content.trim();
        Ok((!text.is_empty()).then(|| text.to_string()))
    }
}

fn non_empty(stop: &[String]) -> Option<Vec<String>> {
    (!stop.is_empty()).then(|| stop.to_vec())
}
