//! OpenAiProvider -- concrete [`LlmProvider`] for OpenAI-compatible
//! Chat Completions endpoints.
//!
//! Game functions are offered as `tools` with `tool_choice: "auto"`. The first
//! tool call of the answer (or the legacy `function_call` field) becomes the
//! response's [`FunctionCall`].
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is never logged
//! or included in `Debug` output.

pub mod types;

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use escapebot_core::llm::LlmProvider;
use escapebot_types::llm::{
    CompletionRequest, CompletionResponse, FunctionCall, LlmError, StopReason, Usage,
};

use self::types::{
    ChatFunction, ChatFunctionCall, ChatMessage, ChatRequest, ChatResponse, ChatTool,
};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI-compatible chat completion provider.
///
/// Does NOT derive Debug, so the key cannot leak through `{:?}`.
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    timeout: Duration,
}

impl OpenAiProvider {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Override the base URL (proxies, compatible servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

/// Convert a generic [`CompletionRequest`] into a [`ChatRequest`].
pub(crate) fn to_chat_request(request: &CompletionRequest) -> ChatRequest {
    let messages = request
        .messages
        .iter()
        .map(|m| ChatMessage {
            role: m.role.as_str().to_string(),
            content: m.content.clone(),
        })
        .collect();

    let tools: Vec<ChatTool> = request
        .functions
        .iter()
        .map(|f| ChatTool {
            kind: "function".to_string(),
            function: ChatFunction {
                name: f.name.clone(),
                description: f.description.clone(),
                parameters: f.parameters.clone(),
            },
        })
        .collect();
    let tool_choice = (!tools.is_empty()).then(|| "auto".to_string());

    ChatRequest {
        model: request.model.clone(),
        messages,
        max_tokens: request.max_tokens,
        temperature: request.temperature,
        top_p: request.top_p,
        stop: request.stop_sequences.clone(),
        tools,
        tool_choice,
    }
}

fn parse_function_call(call: ChatFunctionCall) -> Result<FunctionCall, LlmError> {
    let arguments = if call.arguments.trim().is_empty() {
        serde_json::json!({})
    } else {
        serde_json::from_str(&call.arguments).map_err(|e| {
            LlmError::Deserialization(format!("invalid arguments for '{}': {e}", call.name))
        })?
    };

    Ok(FunctionCall {
        name: call.name,
        arguments,
    })
}

fn map_finish_reason(reason: Option<&str>, has_call: bool) -> StopReason {
    match reason {
        Some("length") => StopReason::MaxTokens,
        Some("content_filter") => StopReason::ContentFilter,
        Some("tool_calls") | Some("function_call") => StopReason::FunctionCall,
        _ if has_call => StopReason::FunctionCall,
        _ => StopReason::EndTurn,
    }
}

/// `Retry-After` in milliseconds, when given in whole seconds.
fn retry_after_ms(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(|secs| secs.saturating_mul(1000))
}

/// Map a [`ChatResponse`] to the provider-agnostic [`CompletionResponse`].
pub(crate) fn from_chat_response(response: ChatResponse) -> Result<CompletionResponse, LlmError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::Deserialization("response has no choices".to_string()))?;

    let message = choice.message;
    let raw_call = message
        .tool_calls
        .into_iter()
        .next()
        .map(|tool| tool.function)
        .or(message.function_call);
    let function_call = raw_call.map(parse_function_call).transpose()?;

    let stop_reason = map_finish_reason(choice.finish_reason.as_deref(), function_call.is_some());
    let usage = response
        .usage
        .map(|u| Usage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        })
        .unwrap_or_default();

    Ok(CompletionResponse {
        id: response.id,
        content: message.content.unwrap_or_default(),
        function_call,
        model: response.model,
        stop_reason,
        usage,
    })
}

impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = to_chat_request(request);

        let response = self
            .client
            .post(self.url())
            .bearer_auth(self.api_key.expose_secret())
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Provider {
                message: format!("HTTP request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_ms = retry_after_ms(response.headers());
            let error_body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 => LlmError::AuthenticationFailed,
                429 => LlmError::RateLimited { retry_after_ms },
                400 => LlmError::InvalidRequest(error_body),
                _ => LlmError::Provider {
                    message: format!("HTTP {status}: {error_body}"),
                },
            });
        }

        let raw = response
            .text()
            .await
            .map_err(|e| LlmError::Provider {
                message: format!("failed to read response: {e}"),
            })?;
        tracing::debug!(response = %raw, "raw completion response");

        let chat: ChatResponse = serde_json::from_str(&raw)
            .map_err(|e| LlmError::Deserialization(format!("failed to parse response: {e}")))?;
        from_chat_response(chat)
    }
}
