//! Domain-Curator agent: classification and the content-quality gate.

use tracing::info;

use super::analysis::{ContentValidation, DomainAnalysis};
use super::gateway::LlmGateway;
use super::prompt::{PromptSet, render};
use super::traits::{Agent, AgentCall, AgentContext, complete_json};
use crate::error::LlmError;

const ANALYZE: AgentCall = AgentCall {
    label: "analyze",
    system_prompt: "You are a domain curator expert for professional English content.",
    temperature: 0.2,
    max_tokens: 1000,
};

const VALIDATE: AgentCall = AgentCall {
    label: "validate",
    system_prompt: "You are a content quality expert.",
    temperature: 0.2,
    max_tokens: 800,
};

/// Classifies articles by domain and difficulty.
#[derive(Debug, Clone)]
pub struct DomainCuratorAgent {
    ctx: AgentContext,
}

impl DomainCuratorAgent {
    /// Creates the agent.
    #[must_use]
    pub const fn new(ctx: AgentContext) -> Self {
        Self { ctx }
    }

    /// Classifies `article` and estimates auxiliary metadata.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] on gateway or parse failure.
    pub async fn analyze_article(&self, article: &str) -> Result<DomainAnalysis, LlmError> {
        let prompt = render(&self.prompts().domain_analyze, &[("article", article)]);
        let analysis: DomainAnalysis = complete_json(self, &ANALYZE, &prompt).await?;
        info!(
            domain = %analysis.domain,
            difficulty = %analysis.difficulty,
            "article analyzed"
        );
        Ok(analysis)
    }

    /// Judges whether `article` is suitable course material.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] on gateway or parse failure.
    pub async fn validate_content(&self, article: &str) -> Result<ContentValidation, LlmError> {
        let prompt = render(&self.prompts().domain_validate, &[("article", article)]);
        let validation: ContentValidation = complete_json(self, &VALIDATE, &prompt).await?;
        info!(approved = validation.approved, "content validated");
        Ok(validation)
    }
}

impl Agent for DomainCuratorAgent {
    fn name(&self) -> &'static str {
        "domain-curator"
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

    #[tokio::test]
    async fn test_analyze_article() {
        let reply = "```json\n{\"domain\": \"AI\", \"difficulty\": \"intermediate\", \
                     \"wordCount\": 640, \"coreTopics\": [\"diagnostics\"], \
                     \"recommendedDeepDiveRatio\": 40, \"keyReasoning\": true}\n```";
        let (ctx, transport) = agent_context(vec![Ok(openai_reply(reply))]);
        let agent = DomainCuratorAgent::new(ctx);

        let analysis = agent
            .analyze_article("AI is reshaping diagnostics in hospitals.")
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(analysis.domain, "AI");
        assert_eq!(analysis.word_count, Some(640));
        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert!(user_prompt(&calls[0]).contains("AI is reshaping diagnostics"));
        assert_eq!(calls[0].body["max_tokens"], 1000);
        assert_eq!(
            calls[0].body["messages"][0]["content"],
            ANALYZE.system_prompt
        );
    }

    #[tokio::test]
    async fn test_validate_content() {
        let reply = r#"{"isApproved": false, "reasons": ["too short"], "suggestions": "expand"}"#;
        let (ctx, _) = agent_context(vec![Ok(openai_reply(reply))]);
        let validation = DomainCuratorAgent::new(ctx)
            .validate_content("Short.")
            .await
            .unwrap_or_else(|_| unreachable!());
        assert!(!validation.approved);
        assert_eq!(validation.reasons, vec!["too short"]);
        assert_eq!(validation.suggestions.as_deref(), Some("expand"));
    }

    #[tokio::test]
    async fn test_prose_reply_is_parse_error() {
        let (ctx, transport) =
            agent_context(vec![Ok(openai_reply("Sorry, I cannot classify this."))]);
        let err = DomainCuratorAgent::new(ctx).analyze_article("x").await;
        assert!(matches!(err, Err(LlmError::Parse { .. })));
        assert_eq!(transport.calls().len(), 1);
    }
}
