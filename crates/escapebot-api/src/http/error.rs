//! Webhook error type mapping to HTTP status codes and envelope format.
//!
//! Only the request boundary can fail: turn failures are handled inside the
//! orchestrator and never become an HTTP error.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use escapebot_infra::line::signature::SignatureError;

#[derive(Debug)]
pub enum AppError {
    /// No `x-line-signature` header, or it is not valid UTF-8.
    MissingSignature,
    /// The signature does not authenticate the body.
    InvalidSignature(SignatureError),
    /// The signed body is not a webhook payload.
    InvalidBody(String),
}

impl From<SignatureError> for AppError {
    fn from(e: SignatureError) -> Self {
        AppError::InvalidSignature(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (code, message) = match &self {
            AppError::MissingSignature => {
                ("MISSING_SIGNATURE", "x-line-signature header is required".to_string())
            }
            AppError::InvalidSignature(e) => ("INVALID_SIGNATURE", e.to_string()),
            AppError::InvalidBody(msg) => ("INVALID_BODY", msg.clone()),
        };

        tracing::warn!(code, %message, "webhook request rejected");

        let body = json!({
            "data": null,
            "meta": {
                "timestamp": chrono::Utc::now().to_rfc3339(),
            },
            "errors": [{
                "code": code,
                "message": message,
            }]
        });

        (
            StatusCode::BAD_REQUEST,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}
