/// Language model client module.
///
/// This module provides a blocking HTTP client for Groq's OpenAI-compatible
/// chat-completions API, including error handling, opt-in retry logic, and
/// timeout configuration.
mod client;

pub use client::{
    CompletionClient, DEFAULT_BASE_URL, DEFAULT_MODEL, GroqClient, GroqClientBuilder, LlmError,
    MAX_RETRY_DELAY, RetryPolicy, retry_with_backoff,
};
