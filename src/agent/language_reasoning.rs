//! Language-Reasoning agent.

use std::fmt::Write as _;

use tracing::info;

use super::analysis::{ExplainedExpression, ExplainedExpressionsReply, LanguageBreakdownReply};
use super::gateway::LlmGateway;
use super::json::to_prompt_json_pretty;
use super::prompt::{PromptSet, render};
use super::traits::{Agent, AgentCall, AgentContext, complete_json};
use crate::core::article::{KeyParagraph, LanguageBreakdown};
use crate::error::LlmError;

const EXTRACT: AgentCall = AgentCall {
    label: "language-breakdown",
    system_prompt: "You are an expert in teaching professional English for reasoning and argumentation.",
    temperature: 0.3,
    max_tokens: 1500,
};

const EXPLAIN: AgentCall = AgentCall {
    label: "explain-expressions",
    system_prompt: "You are helping English learners understand professional reasoning language.",
    temperature: 0.3,
    max_tokens: 1500,
};

/// Extracts and explains reasoning expressions.
#[derive(Debug, Clone)]
pub struct LanguageReasoningAgent {
    ctx: AgentContext,
}

impl LanguageReasoningAgent {
    /// Creates the agent.
    #[must_use]
    pub const fn new(ctx: AgentContext) -> Self {
        Self { ctx }
    }

    /// Picks the reasoning expressions worth teaching from `article`,
    /// focusing on `key_paragraphs`.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] on gateway or parse failure.
    pub async fn extract_language_breakdown(
        &self,
        article: &str,
        key_paragraphs: &[KeyParagraph],
    ) -> Result<Vec<LanguageBreakdown>, LlmError> {
        let paragraphs_json = to_prompt_json_pretty(key_paragraphs);
        let prompt = render(
            &self.prompts().language_extract,
            &[("keyParagraphs", &paragraphs_json), ("article", article)],
        );
        let reply: LanguageBreakdownReply = complete_json(self, &EXTRACT, &prompt).await?;
        info!(
            count = reply.language_breakdown.len(),
            "language breakdown extracted"
        );
        Ok(reply.language_breakdown)
    }

    /// Produces learner-facing explanations for `expressions`.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] on gateway or parse failure.
    pub async fn explain_expressions(
        &self,
        expressions: &[LanguageBreakdown],
    ) -> Result<Vec<ExplainedExpression>, LlmError> {
        let prompt = render(
            &self.prompts().language_explain,
            &[("expressions", &expression_list(expressions))],
        );
        let reply: ExplainedExpressionsReply = complete_json(self, &EXPLAIN, &prompt).await?;
        info!(
            count = reply.explained_expressions.len(),
            "expressions explained"
        );
        Ok(reply.explained_expressions)
    }
}

/// One `- expression: explanation` line per entry.
fn expression_list(expressions: &[LanguageBreakdown]) -> String {
    let mut out = String::new();
    for (i, e) in expressions.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = write!(out, "- {}: {}", e.expression, e.explanation);
    }
    out
}

impl Agent for LanguageReasoningAgent {
    fn name(&self) -> &'static str {
        "language-reasoning"
    }

    fn gateway(&self) -> &LlmGateway {
        &self.ctx.gateway
    }

    fn prompts(&self) -> &PromptSet {
        &self.ctx.prompts
    }
}
