//! `x-line-signature` verification.
//!
//! The platform signs the raw request body with HMAC-SHA256 keyed by the
//! channel secret and sends the base64 digest in the header.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-line-signature";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature is not valid base64")]
    Malformed,

    #[error("signature does not match the request body")]
    Mismatch,

    #[error("invalid channel secret: {0}")]
    InvalidKey(String),
}

/// Verify a base64 HMAC-SHA256 signature against a request body.
///
/// Comparison is constant-time (via hmac's `verify_slice`).
pub fn verify_signature(
    channel_secret: &[u8],
    body: &[u8],
    signature_b64: &str,
) -> Result<(), SignatureError> {
    let expected = STANDARD
        .decode(signature_b64.trim())
        .map_err(|_| SignatureError::Malformed)?;

    let mut mac = HmacSha256::new_from_slice(channel_secret)
        .map_err(|e| SignatureError::InvalidKey(e.to_string()))?;
    mac.update(body);

    mac.verify_slice(&expected)
        .map_err(|_| SignatureError::Mismatch)
}

/// Compute the signature the platform would send for `body`.
pub fn sign(channel_secret: &[u8], body: &[u8]) -> Result<String, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(channel_secret)
        .map_err(|e| SignatureError::InvalidKey(e.to_string()))?;
    mac.update(body);
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}
