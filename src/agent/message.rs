//! Vendor-neutral message types for LLM communication.
//!
//! Agents build [`ChatRequest`]s from these types and receive
//! [`ChatResponse`]s; each provider translates them to and from its own
//! wire format.

use serde::{Deserialize, Serialize};

use super::config::Vendor;

/// Default sampling temperature applied when a request leaves it unset.
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
/// Default response length cap applied when a request leaves it unset.
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

/// Role of a chat message participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions.
    System,
    /// User input.
    User,
    /// Assistant response.
    Assistant,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: Role,
    /// Message content.
    pub content: String,
}

/// A chat completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    /// Ordered conversation messages.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature; [`DEFAULT_TEMPERATURE`] when unset.
    pub temperature: Option<f32>,
    /// Response length cap; [`DEFAULT_MAX_TOKENS`] when unset.
    pub max_tokens: Option<u32>,
    /// Streaming flag, forwarded to vendors that accept it.
    pub stream: bool,
    /// Per-call vendor override. `None` uses the configured default.
    pub provider: Option<Vendor>,
}

impl ChatRequest {
    /// Creates a request with default sampling and no vendor override.
    #[must_use]
    pub const fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            temperature: None,
            max_tokens: None,
            stream: false,
            provider: None,
        }
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub const fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the response length cap.
    #[must_use]
    pub const fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Routes this call to a specific vendor.
    #[must_use]
    pub const fn provider(mut self, vendor: Vendor) -> Self {
        self.provider = Some(vendor);
        self
    }

    /// Temperature with the default applied.
    #[must_use]
    pub fn effective_temperature(&self) -> f32 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    /// Length cap with the default applied.
    #[must_use]
    pub fn effective_max_tokens(&self) -> u32 {
        self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }
}

/// Token usage statistics from a completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens consumed by the prompt.
    pub prompt_tokens: u32,
    /// Tokens generated in the completion.
    pub completion_tokens: u32,
    /// Total tokens used.
    pub total_tokens: u32,
}

/// A normalized chat completion response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatResponse {
    /// Generated text content.
    pub content: String,
    /// Token usage statistics.
    pub usage: TokenUsage,
    /// Model identifier reported by the vendor.
    pub model: String,
}

/// Creates a system message.
#[must_use]
pub fn system_message(content: &str) -> ChatMessage {
    ChatMessage {
        role: Role::System,
        content: content.to_string(),
    }
}

/// Creates a user message.
#[must_use]
pub fn user_message(content: &str) -> ChatMessage {
    ChatMessage {
        role: Role::User,
        content: content.to_string(),
    }
}
