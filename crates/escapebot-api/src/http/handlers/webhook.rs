//! Chat platform webhook receiver.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use secrecy::ExposeSecret;
use tracing::Instrument;
use uuid::Uuid;

use escapebot_core::llm::LlmProvider;
use escapebot_core::repository::SessionStore;
use escapebot_core::transport::ReplyTransport;
use escapebot_core::turn::TurnOutcome;
use escapebot_infra::config::local_now;
use escapebot_infra::line::signature::{SIGNATURE_HEADER, verify_signature};
use escapebot_infra::line::types::{WebhookBody, extract_text_messages};

use crate::http::error::AppError;
use crate::state::AppState;

/// POST /callback - Receive message events.
///
/// The raw body must carry a valid `x-line-signature`. Each text message is
/// then played as one turn, in delivery order. Once the request is
/// authenticated the response is always `200 OK`, whatever the turns did.
pub async fn callback<S, L, T>(
    State(state): State<AppState<S, L, T>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<&'static str, AppError>
where
    S: SessionStore + 'static,
    L: LlmProvider + 'static,
    T: ReplyTransport + 'static,
{
    let request_id = Uuid::now_v7();

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::MissingSignature)?;
    verify_signature(state.channel_secret.expose_secret().as_bytes(), &body, signature)?;

    let payload: WebhookBody =
        serde_json::from_slice(&body).map_err(|e| AppError::InvalidBody(e.to_string()))?;
    let messages = extract_text_messages(payload, local_now(state.timezone));

    let span = tracing::info_span!("webhook", %request_id, messages = messages.len());
    async {
        for inbound in &messages {
            let outcome = state.orchestrator.handle_turn(inbound).await;
            tracing::debug!(
                user_id = %inbound.user_id,
                outcome = outcome_label(&outcome),
                segments = outcome.replies().len(),
                "turn finished"
            );
        }
    }
    .instrument(span)
    .await;

    Ok("OK")
}

fn outcome_label(outcome: &TurnOutcome) -> &'static str {
    match outcome {
        TurnOutcome::ShortCircuited { .. } => "short_circuited",
        TurnOutcome::Answered { .. } => "answered",
        TurnOutcome::Aborted => "aborted",
    }
}
