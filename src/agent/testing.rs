//! Scripted doubles for the transport and backoff seams.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use super::config::{LlmConfig, Vendor};
use super::gateway::{LlmGateway, Sleeper};
use super::prompt::PromptSet;
use super::traits::AgentContext;
use super::transport::HttpTransport;
use crate::error::LlmError;

/// One recorded POST.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub url: String,
    pub bearer: String,
    pub body: Value,
}

/// Replays queued replies in order and records every call. An exhausted
/// queue answers with an upstream error.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<Value, LlmError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Result<Value, LlmError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn post_json(&self, url: &str, bearer: &str, body: &Value) -> Result<Value, LlmError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                url: url.to_string(),
                bearer: bearer.to_string(),
                body: body.clone(),
            });
        }
        self.replies
            .lock()
            .ok()
            .and_then(|mut r| r.pop_front())
            .unwrap_or_else(|| Err(LlmError::upstream("no scripted reply")))
    }
}

/// Records requested delays instead of sleeping.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, delay: Duration) {
        if let Ok(mut delays) = self.delays.lock() {
            delays.push(delay);
        }
    }
}

/// An OpenAI-shaped completion reply carrying `content`.
pub fn openai_reply(content: &str) -> Value {
    json!({
        "model": "glm-4",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}],
        "usage": {"prompt_tokens": 12, "completion_tokens": 8, "total_tokens": 20}
    })
}

/// An [`AgentContext`] whose gateway replays `replies` with the default
/// templates and a recording sleeper.
pub fn agent_context(replies: Vec<Result<Value, LlmError>>) -> (AgentContext, Arc<ScriptedTransport>) {
    let transport = ScriptedTransport::new(replies);
    let config = LlmConfig::builder()
        .api_key(Vendor::Zhipu, "test-key")
        .build()
        .unwrap_or_else(|_| unreachable!());
    let gateway = LlmGateway::with_transport(config, transport.clone())
        .with_sleeper(Arc::new(RecordingSleeper::default()));
    let ctx = AgentContext::new(Arc::new(gateway), Arc::new(PromptSet::defaults()));
    (ctx, transport)
}

/// The user message of a recorded OpenAI-shaped call.
pub fn user_prompt(call: &RecordedCall) -> String {
    call.body["messages"][1]["content"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}
