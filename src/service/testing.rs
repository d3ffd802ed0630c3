//! Fixtures shared by the service tests.

use std::sync::Arc;

use serde_json::Value;

use super::Services;
use crate::agent::AgentStages;
use crate::agent::testing::{ScriptedTransport, agent_context, openai_reply};
use crate::core::{Difficulty, Domain, NewArticle};
use crate::error::LlmError;
use crate::storage::{SqliteStorage, Storage};

pub const CLASSIFY_REPLY: &str = r#"{"domain": "ai", "difficulty": "advanced",
    "wordCount": 120, "coreTopics": ["triage"], "keyReasoning": "yes"}"#;

pub const MAP_REPLY: &str = r#"```json
{"coreQuestion": "Should hospitals adopt AI triage?", "mainConclusion": "Gradually.",
 "argumentStructure": ["benefit", "risk", "safeguard", "conclusion"]}
```"#;

pub const PARAGRAPHS_REPLY: &str = r#"{"keyParagraphs": [
    {"paragraphIndex": 0, "text": "AI triage is spreading.", "role": "definition",
     "keySentences": ["AI triage is spreading."]},
    {"paragraphIndex": 1, "text": "It shortens queues.", "role": "argument",
     "keySentences": ["It shortens queues."]}
]}"#;

pub const LANGUAGE_REPLY: &str = r#"{"languageBreakdown": [
    {"expression": "it follows that", "explanation": "draws a conclusion",
     "transferable": true, "category": "causality", "examples": []}
]}"#;

pub const QUESTIONS_REPLY: &str = r#"{"questions": [
    {"question": "Why gradually?", "purpose": "conclusion", "sampleAnswer": "Risk."}
]}"#;

pub const FEEDBACK_REPLY: &str = r#"{"feedback": {"logicScore": 4, "toneScore": 3,
    "clarityScore": 5, "strengths": ["clear claim"], "logicFeedback": "sound",
    "toneFeedback": "a little casual", "suggestions": [], "overallAssessment": "good"}}"#;

pub const ARTICLE_TEXT: &str = "AI triage is spreading.\n\nIt shortens queues.\n\n\
    Critics worry about bias.\n\nRegulators want audits.";

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
    .map(|reply| Ok(openai_reply(reply)))
    .collect()
}

/// Services over a fresh in-memory store whose gateway replays `replies`.
pub fn services(
    replies: Vec<Result<Value, LlmError>>,
) -> (Services, Arc<SqliteStorage>, Arc<ScriptedTransport>) {
    let storage = Arc::new(SqliteStorage::in_memory().unwrap_or_else(|_| unreachable!()));
    let (ctx, transport) = agent_context(replies);
    let dyn_storage: Arc<dyn Storage> = storage.clone();
    let services = Services::new(dyn_storage, Arc::new(AgentStages::new(&ctx)));
    (services, storage, transport)
}

pub fn new_article(title: &str) -> NewArticle {
    NewArticle {
        title: title.to_string(),
        domain: Domain::Ai,
        difficulty: Difficulty::Intermediate,
        content: ARTICLE_TEXT.to_string(),
        word_count: 15,
        source_url: None,
        author: Some("Staff".into()),
        tags: vec!["health".into()],
        scheduled_for: None,
    }
}
