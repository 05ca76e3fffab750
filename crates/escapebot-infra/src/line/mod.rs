//! LINE Messaging API transport.
//!
//! `LineReplyClient` implements [`ReplyTransport`] on top of the reply
//! endpoint. Webhook parsing and signature checks live in [`types`] and
//! [`signature`].

pub mod signature;
pub mod types;

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use escapebot_core::transport::ReplyTransport;
use escapebot_types::error::TransportError;

use self::types::{ReplyRequest, TextMessage};

pub const DEFAULT_API_BASE_URL: &str = "https://api.line.me";

/// Most messages a single reply call may carry.
pub const MAX_REPLY_MESSAGES: usize = 5;

/// Reply client authenticated with the channel access token.
///
/// Does NOT derive Debug, so the token cannot leak through `{:?}`.
pub struct LineReplyClient {
    client: reqwest::Client,
    access_token: SecretString,
    base_url: String,
}

impl LineReplyClient {
    pub fn new(access_token: SecretString) -> Self {
        Self {
            client: reqwest::Client::new(),
            access_token,
            base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self) -> String {
        format!("{}/v2/bot/message/reply", self.base_url)
    }
}

/// Build the reply body, keeping at most [`MAX_REPLY_MESSAGES`] segments.
pub fn build_reply(reply_token: &str, segments: &[String]) -> Result<ReplyRequest, TransportError> {
    if reply_token.is_empty() {
        return Err(TransportError::InvalidPayload("empty reply token".to_string()));
    }
    if segments.is_empty() {
        return Err(TransportError::InvalidPayload("no reply segments".to_string()));
    }
    if segments.len() > MAX_REPLY_MESSAGES {
        tracing::warn!(
            segments = segments.len(),
            max = MAX_REPLY_MESSAGES,
            "dropping reply segments over the platform limit"
        );
    }

    Ok(ReplyRequest {
        reply_token: reply_token.to_string(),
        messages: segments
            .iter()
            .take(MAX_REPLY_MESSAGES)
            .map(TextMessage::new)
            .collect(),
    })
}

impl ReplyTransport for LineReplyClient {
    async fn send_reply(&self, reply_token: &str, segments: &[String]) -> Result<(), TransportError> {
        let body = build_reply(reply_token, segments)?;

        let response = self
            .client
            .post(self.url())
            .bearer_auth(self.access_token.expose_secret())
            .timeout(Duration::from_secs(10))
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(messages = body.messages.len(), "reply accepted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("segment {i}")).collect()
    }

    #[test]
    fn test_build_reply_keeps_order() {
        let reply = build_reply("r1", &segments(3)).unwrap();
        let texts: Vec<&str> = reply.messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["segment 0", "segment 1", "segment 2"]);
    }

    #[test]
    fn test_build_reply_truncates_to_platform_limit() {
        let reply = build_reply("r1", &segments(7)).unwrap();
        assert_eq!(reply.messages.len(), MAX_REPLY_MESSAGES);
        assert_eq!(reply.messages[4].text, "segment 4");
    }

    #[test]
    fn test_build_reply_rejects_empty_input() {
        assert!(matches!(
            build_reply("", &segments(1)),
            Err(TransportError::InvalidPayload(_))
        ));
        assert!(matches!(
            build_reply("r1", &[]),
            Err(TransportError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_base_url_override() {
        let client = LineReplyClient::new(SecretString::from("token".to_string()))
            .with_base_url("http://localhost:9000/");
        assert_eq!(client.url(), "http://localhost:9000/v2/bot/message/reply");
    }
}
