//! Agent trait definition.
//!
//! Every agent turns a rendered prompt into one gateway call and parses a
//! JSON object out of the reply. The per-call sampling parameters live in
//! an [`AgentCall`] constant next to each agent.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use super::gateway::LlmGateway;
use super::json::parse_json;
use super::message::{ChatRequest, ChatResponse, system_message, user_message};
use super::prompt::PromptSet;
use crate::error::LlmError;

/// Fixed parameters of one kind of agent call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentCall {
    /// Short label used in logs (e.g. `"analyze"`).
    pub label: &'static str,
    /// System message sent ahead of the rendered template.
    pub system_prompt: &'static str,
    /// Sampling temperature.
    pub temperature: f32,
    /// Response length cap.
    pub max_tokens: u32,
}

impl AgentCall {
    /// Builds the gateway request for a rendered user message.
    #[must_use]
    pub fn request(&self, user_msg: &str) -> ChatRequest {
        ChatRequest::new(vec![
            system_message(self.system_prompt),
            user_message(user_msg),
        ])
        .temperature(self.temperature)
        .max_tokens(self.max_tokens)
    }
}

/// Trait implemented by all agents in the system.
///
/// Agents share one gateway and one prompt set; [`Agent::execute`] sends a
/// rendered prompt with the configured retry budget.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Agent name for logging and identification.
    fn name(&self) -> &'static str;

    /// Gateway used for every call.
    fn gateway(&self) -> &LlmGateway;

    /// Templates the agent renders.
    fn prompts(&self) -> &PromptSet;

    /// Sends `user_msg` with `call`'s parameters and returns the raw reply.
    ///
    /// # Errors
    ///
    /// Returns the gateway's [`LlmError`] once retries are exhausted.
    async fn execute(&self, call: &AgentCall, user_msg: &str) -> Result<ChatResponse, LlmError> {
        self.gateway()
            .send_with_default_retry(&call.request(user_msg))
            .await
    }
}

/// Executes `call` and parses the reply as `T`.
///
/// Failures are logged with the agent and call names and returned
/// unchanged. Parse failures are not retried.
///
/// # Errors
///
/// - [`LlmError::Upstream`] / [`LlmError::Configuration`] from the gateway
/// - [`LlmError::Parse`] if the reply holds no JSON of the expected shape
pub async fn complete_json<A, T>(agent: &A, call: &AgentCall, user_msg: &str) -> Result<T, LlmError>
where
    A: Agent + ?Sized,
    T: DeserializeOwned,
{
    debug!(agent = agent.name(), call = call.label, "agent call started");
    let result = match agent.execute(call, user_msg).await {
        Ok(response) => parse_json(&response.content),
        Err(e) => Err(e),
    };
    if let Err(e) = &result {
        error!(agent = agent.name(), call = call.label, error = %e, "agent call failed");
    }
    result
}

/// Gateway and prompts shared by the four agents.
#[derive(Debug, Clone)]
pub struct AgentContext {
    /// Shared gateway.
    pub gateway: Arc<LlmGateway>,
    /// Shared templates.
    pub prompts: Arc<PromptSet>,
}

impl AgentContext {
    /// Bundles a gateway with a prompt set.
    #[must_use]
    pub const fn new(gateway: Arc<LlmGateway>, prompts: Arc<PromptSet>) -> Self {
        Self { gateway, prompts }
    }
}
