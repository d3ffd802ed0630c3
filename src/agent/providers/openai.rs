//! Chat-completions provider for `OpenAI` and Zhipu GLM.
//!
//! Both vendors accept the `OpenAI` chat completion body at
//! `{base_url}/chat/completions`; they differ only in endpoint, key and
//! model name.

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
struct CompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CompletionReply {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

/// Provider for vendors speaking the `OpenAI` chat completions protocol.
pub struct OpenAiCompatibleProvider {
    vendor: Vendor,
    api_key: String,
    model: String,
    endpoint: String,
    transport: Arc<dyn HttpTransport>,
}

impl OpenAiCompatibleProvider {
    /// Creates a provider for `vendor`.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Configuration`] if `settings` carries no API key.
    pub fn new(
        vendor: Vendor,
        settings: &VendorSettings,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, LlmError> {
        let api_key = settings
            .api_key
            .clone()
            .ok_or_else(|| LlmError::Configuration {
                provider: vendor.as_str(),
            })?;
        Ok(Self {
            vendor,
            api_key,
            model: settings.model.clone(),
            endpoint: format!(
                "{}/chat/completions",
                settings.base_url.trim_end_matches('/')
            ),
            transport,
        })
    }
}

impl std::fmt::Debug for OpenAiCompatibleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatibleProvider")
            .field("vendor", &self.vendor)
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &'static str {
        self.vendor.as_str()
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
        let body = serde_json::to_value(CompletionBody {
            model: &self.model,
            messages: &request.messages,
            temperature: request.effective_temperature(),
            max_tokens: request.effective_max_tokens(),
            stream: request.stream,
        })
        .map_err(|e| LlmError::upstream(format!("failed to encode request: {e}")))?;

        debug!(vendor = %self.vendor, model = %self.model, "chat completion request");
        let raw = self
            .transport
            .post_json(&self.endpoint, &self.api_key, &body)
            .await?;

        let reply: CompletionReply = serde_json::from_value(raw).map_err(|e| {
            LlmError::upstream(format!("unexpected {} response shape: {e}", self.vendor))
        })?;
        let content = reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::upstream(format!("{} returned no choices", self.vendor)))?;
        let usage = reply.usage.unwrap_or_default();

        Ok(ChatResponse {
            content,
            usage: TokenUsage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
            },
            model: reply.model.unwrap_or_else(|| self.model.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::config::LlmConfig;
    use crate::agent::message::{system_message, user_message};
    use crate::agent::testing::{ScriptedTransport, openai_reply};
    use serde_json::json;

    fn config() -> LlmConfig {
        LlmConfig::builder()
            .api_key(Vendor::Zhipu, "zk")
            .api_key(Vendor::OpenAi, "ok")
            .build()
            .unwrap_or_else(|_| unreachable!())
    }

    #[tokio::test]
    async fn test_zhipu_request_shape_and_response_mapping() {
        let transport = ScriptedTransport::new(vec![Ok(openai_reply("{\"a\":1}"))]);
        let config = config();
        let provider = OpenAiCompatibleProvider::new(
            Vendor::Zhipu,
            config.vendor(Vendor::Zhipu),
            transport.clone(),
        )
        .unwrap_or_else(|_| unreachable!());

        let request = ChatRequest::new(vec![system_message("sys"), user_message("hi")])
            .temperature(0.2)
            .max_tokens(1000);
        let response = provider
            .chat(&request)
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(response.content, "{\"a\":1}");
        assert_eq!(response.usage.total_tokens, 20);
        assert_eq!(response.model, "glm-4");

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].url,
            "https://open.bigmodel.cn/api/paas/v4/chat/completions"
        );
        assert_eq!(calls[0].bearer, "zk");
        assert_eq!(calls[0].body["model"], "glm-4");
        assert_eq!(calls[0].body["max_tokens"], 1000);
        assert_eq!(calls[0].body["stream"], false);
        assert_eq!(calls[0].body["messages"][0]["role"], "system");
    }

    #[tokio::test]
    async fn test_missing_key_is_configuration_error() {
        let config = LlmConfig::builder()
            .build()
            .unwrap_or_else(|_| unreachable!());
        let result = OpenAiCompatibleProvider::new(
            Vendor::OpenAi,
            config.vendor(Vendor::OpenAi),
            ScriptedTransport::new(Vec::new()),
        );
        assert!(matches!(
            result,
            Err(LlmError::Configuration { provider: "openai" })
        ));
    }

    #[tokio::test]
    async fn test_empty_choices_is_upstream_error() {
        let transport = ScriptedTransport::new(vec![Ok(json!({"choices": []}))]);
        let config = config();
        let provider = OpenAiCompatibleProvider::new(
            Vendor::OpenAi,
            config.vendor(Vendor::OpenAi),
            transport,
        )
        .unwrap_or_else(|_| unreachable!());
        let err = provider
            .chat(&ChatRequest::new(vec![user_message("hi")]))
            .await;
        assert!(matches!(err, Err(LlmError::Upstream { .. })));
    }

    #[tokio::test]
    async fn test_missing_usage_defaults_to_zero_and_configured_model() {
        let transport = ScriptedTransport::new(vec![Ok(json!({
            "choices": [{"message": {"content": "ok"}}]
        }))]);
        let config = config();
        let provider = OpenAiCompatibleProvider::new(
            Vendor::OpenAi,
            config.vendor(Vendor::OpenAi),
            transport,
        )
        .unwrap_or_else(|_| unreachable!());
        let response = provider
            .chat(&ChatRequest::new(vec![user_message("hi")]))
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(response.usage, TokenUsage::default());
        assert_eq!(response.model, "gpt-4");
    }
}
