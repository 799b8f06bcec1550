//! HTTP classification client for OpenAI-compatible chat-completions endpoints.

pub mod chat;

pub use chat::{ChatClient, DEFAULT_BASE_URL, DEFAULT_MODEL};
