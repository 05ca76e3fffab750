//! Messaging API webhook and reply payloads.

use chrono::{DateTime, FixedOffset};
use escapebot_core::turn::InboundMessage;
use serde::{Deserialize, Serialize};

/// Body of a webhook delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookBody {
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

/// One webhook event. Only the fields the game reads are modelled.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub reply_token: Option<String>,
    pub source: Option<EventSource>,
    pub message: Option<EventMessage>,
    #[serde(default)]
    pub timestamp: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSource {
    #[serde(rename = "type")]
    pub kind: String,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

/// Turn text message events into inbound messages.
///
/// Events of other kinds, non-text messages, and events without a user or a
/// reply token are skipped.
pub fn extract_text_messages(
    body: WebhookBody,
    received_at: DateTime<FixedOffset>,
) -> Vec<InboundMessage> {
    body.events
        .into_iter()
        .filter(|event| event.kind == "message")
        .filter_map(|event| {
            let message = event.message.filter(|m| m.kind == "text")?;
            let user_id = event.source.and_then(|s| s.user_id)?;
            let reply_token = event.reply_token?;
            Some(InboundMessage {
                user_id,
                reply_token,
                text: message.text?,
                received_at,
            })
        })
        .collect()
}

/// Body of `POST /v2/bot/message/reply`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRequest {
    pub reply_token: String,
    pub messages: Vec<TextMessage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextMessage {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

impl TextMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            kind: "text",
            text: text.into(),
        }
    }
}
