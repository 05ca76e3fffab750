//! Webhook boundary.
//!
//! `POST /callback` receives signed message events from the chat platform
//! and runs one game turn per text message; `GET /health` reports liveness.

pub mod error;
pub mod handlers;
pub mod router;
