//! Pluggable LLM provider trait.
//!
//! Implementations translate vendor-neutral [`ChatRequest`]/[`ChatResponse`]
//! into one vendor's wire format. Callers never see which vendor answered
//! except through [`ChatResponse::model`].

use async_trait::async_trait;

use super::message::{ChatRequest, ChatResponse};
use crate::error::LlmError;

/// Trait for LLM vendor backends.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Vendor name (e.g., `"zhipu"`, `"qwen"`).
    fn name(&self) -> &'static str;

    /// Executes a chat completion request.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Upstream`] on transport failures, timeouts or
    /// vendor payloads that cannot be mapped onto [`ChatResponse`].
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError>;
}
