//! LLM provider implementations.
//!
//! Concrete implementations of the [`escapebot_core::llm::LlmProvider`]
//! trait. The game talks to one OpenAI-compatible endpoint.

pub mod openai;

pub use self::openai::OpenAiProvider;
