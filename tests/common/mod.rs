//! Fixtures shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use daily_english::agent::gateway::Sleeper;
use daily_english::agent::{
    AgentContext, AgentStages, HttpTransport, LlmConfig, LlmGateway, PromptSet, Vendor,
};
use daily_english::core::{Difficulty, Domain, NewArticle};
use daily_english::error::LlmError;
use daily_english::service::Services;
use daily_english::storage::SqliteStorage;

pub const CLASSIFY_REPLY: &str = r#"{"domain": "finance", "difficulty": "advanced",
    "wordCount": 40, "coreTopics": ["rates"], "keyReasoning": "cause and effect"}"#;

pub const MAP_REPLY: &str = r#"Here is the map:
```json
{"coreQuestion": "Will rate cuts revive lending?", "mainConclusion": "Only slowly.",
 "argumentStructure": ["claim", "evidence", "counterpoint", "conclusion"]}
```"#;

pub const PARAGRAPHS_REPLY: &str = r#"{"keyParagraphs": [
    {"paragraphIndex": 0, "text": "Central banks cut rates.", "role": "definition",
     "keySentences": ["Central banks cut rates."]},
    {"paragraphIndex": 2, "text": "Banks remain cautious.", "role": "refutation",
     "keySentences": ["Banks remain cautious."]}
]}"#;

pub const LANGUAGE_REPLY: &str = r#"{"languageBreakdown": [
    {"expression": "in turn", "explanation": "links a consequence",
     "transferable": true, "category": "causality", "examples": ["Costs rose; prices, in turn, followed."]}
]}"#;

pub const QUESTIONS_REPLY: &str = r#"{"questions": [
    {"question": "Why is lending slow to respond?", "purpose": "conclusion", "sampleAnswer": "Caution."}
]}"#;

pub const FEEDBACK_REPLY: &str = r#"{"feedback": {"logicScore": 5, "toneScore": 4,
    "clarityScore": 4, "strengths": ["direct"], "logicFeedback": "coherent",
    "toneFeedback": "professional", "suggestions": [], "overallAssessment": "strong"}}"#;

pub const ARTICLE_TEXT: &str = "Central banks cut rates.\n\nCheaper money should help borrowers.\n\n\
    Banks remain cautious.\n\nLending may recover only slowly.";

/// Replays queued vendor replies in order and counts calls.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<Value, LlmError>>>,
    calls: Mutex<usize>,
}

impl ScriptedTransport {
    pub fn calls(&self) -> usize {
        self.calls.lock().map(|c| *c).unwrap_or_default()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn post_json(&self, _url: &str, _bearer: &str, _body: &Value) -> Result<Value, LlmError> {
        if let Ok(mut calls) = self.calls.lock() {
            *calls += 1;
        }
        self.replies
            .lock()
            .ok()
            .and_then(|mut r| r.pop_front())
            .unwrap_or_else(|| Err(LlmError::upstream("no scripted reply")))
    }
}

/// Backoff that returns immediately.
#[derive(Debug, Default)]
pub struct NoSleep;

#[async_trait]
impl Sleeper for NoSleep {
    async fn sleep(&self, _delay: Duration) {}
}

/// An OpenAI-shaped completion carrying `content`.
pub fn completion(content: &str) -> Value {
    json!({
        "model": "glm-4",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
    })
}

/// Replies for one full pipeline run, in call order.
pub fn pipeline_replies() -> Vec<Result<Value, LlmError>> {
    [
        CLASSIFY_REPLY,
        MAP_REPLY,
        PARAGRAPHS_REPLY,
        LANGUAGE_REPLY,
        QUESTIONS_REPLY,
    ]
    .into_iter()
    .map(|reply| Ok(completion(reply)))
    .collect()
}

/// Services over an in-memory store whose gateway replays `replies`.
pub fn services(replies: Vec<Result<Value, LlmError>>) -> (Services, Arc<ScriptedTransport>) {
    let transport = Arc::new(ScriptedTransport {
        replies: Mutex::new(replies.into()),
        calls: Mutex::new(0),
    });
    let config = LlmConfig::builder()
        .api_key(Vendor::Zhipu, "test-key")
        .build()
        .unwrap_or_else(|_| unreachable!());
    let gateway = LlmGateway::with_transport(config, transport.clone())
        .with_sleeper(Arc::new(NoSleep));
    let ctx = AgentContext::new(Arc::new(gateway), Arc::new(PromptSet::defaults()));
    let storage = SqliteStorage::in_memory().unwrap_or_else(|_| unreachable!());
    let services = Services::new(Arc::new(storage), Arc::new(AgentStages::new(&ctx)));
    (services, transport)
}

pub fn new_article(title: &str) -> NewArticle {
    NewArticle {
        title: title.to_string(),
        domain: Domain::Economics,
        difficulty: Difficulty::Intermediate,
        content: ARTICLE_TEXT.to_string(),
        word_count: 19,
        source_url: Some("https://example.com/rates".into()),
        author: None,
        tags: vec!["monetary policy".into()],
        scheduled_for: None,
    }
}
