//! ReplyTransport trait definition.

use escapebot_types::error::TransportError;

/// Delivers reply segments to the messaging platform.
///
/// `reply_token` is the single-use token of the inbound message; each segment
/// becomes one chat bubble, in order. Implementations live in
/// escapebot-infra (`LineReplyClient`) and escapebot-api (console transport).
pub trait ReplyTransport: Send + Sync {
    fn send_reply(
        &self,
        reply_token: &str,
        segments: &[String],
    ) -> impl std::future::Future<Output = Result<(), TransportError>> + Send;
}
