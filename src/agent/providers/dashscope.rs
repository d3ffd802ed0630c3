//! Qwen provider using the `DashScope` text-generation API.
//!
//! POST `{base_url}/services/aigc/text-generation/generation`
//!
//! - Body: `{ model, input: { messages }, parameters: { temperature, max_tokens, result_format: "message" } }`
//! - Reply: `{ output: { choices: [{ message: { content } }] }, usage: { input_tokens, output_tokens, total_tokens } }`

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::agent::config::{Vendor, VendorSettings};
use crate::agent::message::{ChatMessage, ChatRequest, ChatResponse, TokenUsage};
use crate::agent::provider::LlmProvider;
use crate::agent::transport::HttpTransport;
use crate::error::LlmError;

#[derive(Debug, Serialize)]
struct GenerationBody<'a> {
    model: &'a str,
    input: GenerationInput<'a>,
    parameters: GenerationParameters,
}

#[derive(Debug, Serialize)]
struct GenerationInput<'a> {
    messages: &'a [ChatMessage],
}

#[derive(Debug, Serialize)]
struct GenerationParameters {
    temperature: f32,
    max_tokens: u32,
    result_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerationReply {
    output: Option<GenerationOutput>,
    #[serde(default)]
    usage: Option<GenerationUsage>,
    // Present on API-level failures, sometimes with a 200 status.
    code: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerationOutput {
    #[serde(default)]
    choices: Vec<GenerationChoice>,
    // Older `result_format: text` replies.
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerationChoice {
    message: GenerationMessage,
}

#[derive(Debug, Deserialize)]
struct GenerationMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GenerationUsage {
    input_tokens: u32,
    output_tokens: u32,
    total_tokens: Option<u32>,
}

/// Qwen provider speaking the `DashScope` generation protocol.
pub struct DashScopeProvider {
    api_key: String,
    model: String,
    endpoint: String,
    transport: Arc<dyn HttpTransport>,
}

impl DashScopeProvider {
    /// Creates the provider.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Configuration`] if `settings` carries no API key.
    pub fn new(
        settings: &VendorSettings,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, LlmError> {
        let api_key = settings
            .api_key
            .clone()
            .ok_or_else(|| LlmError::Configuration {
                provider: Vendor::Qwen.as_str(),
            })?;
        Ok(Self {
            api_key,
            model: settings.model.clone(),
            endpoint: format!(
                "{}/services/aigc/text-generation/generation",
                settings.base_url.trim_end_matches('/')
            ),
            transport,
        })
    }
}

impl std::fmt::Debug for DashScopeProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashScopeProvider")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl LlmProvider for DashScopeProvider {
    fn name(&self) -> &'static str {
        Vendor::Qwen.as_str()
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
        let body = serde_json::to_value(GenerationBody {
            model: &self.model,
            input: GenerationInput {
                messages: &request.messages,
            },
            parameters: GenerationParameters {
                temperature: request.effective_temperature(),
                max_tokens: request.effective_max_tokens(),
                result_format: "message",
            },
        })
        .map_err(|e| LlmError::upstream(format!("failed to encode request: {e}")))?;

        debug!(vendor = "qwen", model = %self.model, "generation request");
        let raw = self
            .transport
            .post_json(&self.endpoint, &self.api_key, &body)
            .await?;

        let reply: GenerationReply = serde_json::from_value(raw)
            .map_err(|e| LlmError::upstream(format!("unexpected qwen response shape: {e}")))?;
        if let Some(code) = reply.code.filter(|c| !c.is_empty()) {
            return Err(LlmError::upstream(format!(
                "qwen error {code}: {}",
                reply.message.unwrap_or_default()
            )));
        }

        let output = reply
            .output
            .ok_or_else(|| LlmError::upstream("qwen response missing 'output'"))?;
        let content = output
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .or(output.text)
            .ok_or_else(|| LlmError::upstream("qwen returned no choices"))?;

        let usage = reply.usage.unwrap_or_default();
        Ok(ChatResponse {
            content,
            usage: TokenUsage {
                prompt_tokens: usage.input_tokens,
                completion_tokens: usage.output_tokens,
                total_tokens: usage
                    .total_tokens
                    .unwrap_or(usage.input_tokens.saturating_add(usage.output_tokens)),
            },
            model: self.model.clone(),
        })
    }
}
