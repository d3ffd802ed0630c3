//! Argument-Mapper agent: reading map, then key paragraphs.

use tracing::info;

use super::analysis::{ArgumentMap, KeyParagraphsReply};
use super::gateway::LlmGateway;
use super::json::to_prompt_json;
use super::prompt::{PromptSet, render};
use super::traits::{Agent, AgentCall, AgentContext, complete_json};
use crate::core::article::{KeyParagraph, ReadingMap};
use crate::error::LlmError;

const SYSTEM_PROMPT: &str = "You are an expert in analyzing argument structure.";

const READING_MAP: AgentCall = AgentCall {
    label: "reading-map",
    system_prompt: SYSTEM_PROMPT,
    temperature: 0.3,
    max_tokens: 1000,
};

const KEY_PARAGRAPHS: AgentCall = AgentCall {
    label: "key-paragraphs",
    system_prompt: "You are an expert at identifying critical content.",
    temperature: 0.3,
    max_tokens: 2000,
};

/// Maps an article's argument.
#[derive(Debug, Clone)]
pub struct ArgumentMapperAgent {
    ctx: AgentContext,
}

impl ArgumentMapperAgent {
    /// Creates the agent.
    #[must_use]
    pub const fn new(ctx: AgentContext) -> Self {
        Self { ctx }
    }

    /// Extracts the core question, conclusion and argument steps.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] on gateway or parse failure.
    pub async fn extract_reading_map(&self, article: &str) -> Result<ReadingMap, LlmError> {
        let prompt = render(&self.prompts().argument_extract, &[("article", article)]);
        let map: ReadingMap = complete_json(self, &READING_MAP, &prompt).await?;
        info!(
            steps = map.argument_structure.len(),
            "reading map extracted"
        );
        Ok(map)
    }

    /// Selects the paragraphs that carry the argument, guided by `reading_map`.
    ///
    /// A reply without a `keyParagraphs` list yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] on gateway or parse failure.
    pub async fn identify_key_paragraphs(
        &self,
        article: &str,
        reading_map: &ReadingMap,
    ) -> Result<Vec<KeyParagraph>, LlmError> {
        let map_json = to_prompt_json(reading_map);
        let prompt = render(
            &self.prompts().argument_key_paragraphs,
            &[("article", article), ("readingMap", &map_json)],
        );
        let reply: KeyParagraphsReply = complete_json(self, &KEY_PARAGRAPHS, &prompt).await?;
        info!(count = reply.key_paragraphs.len(), "key paragraphs identified");
        Ok(reply.key_paragraphs)
    }

    /// Runs both calls in order.
    ///
    /// # Errors
    ///
    /// Returns the first [`LlmError`]; no key paragraphs are requested if
    /// the reading map fails.
    pub async fn analyze(&self, article: &str) -> Result<ArgumentMap, LlmError> {
        let reading_map = self.extract_reading_map(article).await?;
        let key_paragraphs = self.identify_key_paragraphs(article, &reading_map).await?;
        Ok(ArgumentMap {
            reading_map,
            key_paragraphs,
        })
    }
}

impl Agent for ArgumentMapperAgent {
    fn name(&self) -> &'static str {
        "argument-mapper"
    }

    fn gateway(&self) -> &LlmGateway {
        &self.ctx.gateway
    }

    fn prompts(&self) -> &PromptSet {
        &self.ctx.prompts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::{agent_context, openai_reply, user_prompt};
    use crate::core::article::ParagraphRole;

    const MAP_REPLY: &str = r#"Here is the map:
```json
{"coreQuestion": "Can AI improve diagnosis?", "mainConclusion": "Yes, with oversight.",
 "argumentStructure": ["claim", "evidence", "limits", "conclusion"]}
```"#;

    const PARAGRAPHS_REPLY: &str = r#"{"keyParagraphs": [
        {"paragraphIndex": 0, "text": "AI is reshaping diagnostics.", "role": "definition",
         "keySentences": ["AI is reshaping diagnostics."]},
        {"paragraphIndex": 2, "text": "Critics disagree.", "role": "refutation", "keySentences": []}
    ]}"#;

    #[tokio::test]
    async fn test_analyze_feeds_map_into_second_call() {
        let (ctx, transport) = agent_context(vec![
            Ok(openai_reply(MAP_REPLY)),
            Ok(openai_reply(PARAGRAPHS_REPLY)),
        ]);
        let agent = ArgumentMapperAgent::new(ctx);

        let map = agent
            .analyze("AI is reshaping diagnostics.")
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(map.reading_map.core_question, "Can AI improve diagnosis?");
        assert_eq!(map.key_paragraphs.len(), 2);
        assert_eq!(map.key_paragraphs[1].role, ParagraphRole::Refutation);

        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        let second = user_prompt(&calls[1]);
        assert!(second.contains(r#""coreQuestion":"Can AI improve diagnosis?""#));
        assert_eq!(calls[1].body["max_tokens"], 2000);
    }

    fn empty_map() -> ReadingMap {
        ReadingMap {
            core_question: "q".into(),
            main_conclusion: "c".into(),
            argument_structure: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_missing_list_is_empty() {
        let (ctx, _) = agent_context(vec![Ok(openai_reply("{}"))]);
        let paragraphs = ArgumentMapperAgent::new(ctx)
            .identify_key_paragraphs("text", &empty_map())
            .await
            .unwrap_or_else(|_| unreachable!());
        assert!(paragraphs.is_empty());
    }

    #[tokio::test]
    async fn test_capitalized_role_and_string_index() {
        let reply = r#"{"keyParagraphs": [
            {"paragraphIndex": "2", "text": "It shortens queues.", "role": "Argument",
             "keySentences": ["It shortens queues."]}
        ]}"#;
        let (ctx, _) = agent_context(vec![Ok(openai_reply(reply))]);
        let paragraphs = ArgumentMapperAgent::new(ctx)
            .identify_key_paragraphs("text", &empty_map())
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(paragraphs[0].paragraph_index, 2);
        assert_eq!(paragraphs[0].role, ParagraphRole::Argument);
    }

    #[tokio::test]
    async fn test_map_failure_skips_second_call() {
        let (ctx, transport) = agent_context(vec![Ok(openai_reply("no idea"))]);
        let result = ArgumentMapperAgent::new(ctx).analyze("text").await;
        assert!(matches!(result, Err(LlmError::Parse { .. })));
        assert_eq!(transport.calls().len(), 1);
    }
}
