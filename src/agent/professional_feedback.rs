//! Professional-Feedback agent: output scoring and comprehension questions.

use tracing::info;

use super::analysis::{FeedbackReply, QuestionsReply};
use super::gateway::LlmGateway;
use super::json::to_prompt_json;
use super::prompt::{PromptSet, render};
use super::traits::{Agent, AgentCall, AgentContext, complete_json};
use crate::core::article::{ReadingMap, UnderstandingQuestion};
use crate::core::output::Feedback;
use crate::error::LlmError;

const EVALUATE: AgentCall = AgentCall {
    label: "evaluate",
    system_prompt: "You are an expert in professional communication providing constructive feedback.",
    temperature: 0.4,
    max_tokens: 1500,
};

const QUESTIONS: AgentCall = AgentCall {
    label: "questions",
    system_prompt: "You are an expert in creating comprehension questions for professional articles.",
    temperature: 0.4,
    max_tokens: 1000,
};

/// Scores learner writing and writes comprehension questions.
#[derive(Debug, Clone)]
pub struct ProfessionalFeedbackAgent {
    ctx: AgentContext,
}

impl ProfessionalFeedbackAgent {
    /// Creates the agent.
    #[must_use]
    pub const fn new(ctx: AgentContext) -> Self {
        Self { ctx }
    }

    /// Scores `user_output`, written in answer to `prompt`, against the
    /// article's argument. Scores are clamped to 1..=5.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] on gateway or parse failure, including a reply
    /// without a `feedback` object.
    pub async fn evaluate_output(
        &self,
        article: &str,
        reading_map: &ReadingMap,
        prompt: &str,
        user_output: &str,
    ) -> Result<Feedback, LlmError> {
        let map_json = to_prompt_json(reading_map);
        let text = render(
            &self.prompts().feedback_evaluate,
            &[
                ("article", article),
                ("readingMap", &map_json),
                ("prompt", prompt),
                ("userOutput", user_output),
            ],
        );
        let reply: FeedbackReply = complete_json(self, &EVALUATE, &text).await?;
        info!(
            logic = reply.feedback.logic_score,
            tone = reply.feedback.tone_score,
            clarity = reply.feedback.clarity_score,
            "user output evaluated"
        );
        Ok(reply.feedback)
    }

    /// Writes open-ended comprehension questions from the reading map.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] on gateway or parse failure.
    pub async fn generate_understanding_questions(
        &self,
        article: &str,
        reading_map: &ReadingMap,
    ) -> Result<Vec<UnderstandingQuestion>, LlmError> {
        let map_json = to_prompt_json(reading_map);
        let text = render(
            &self.prompts().feedback_questions,
            &[("article", article), ("readingMap", &map_json)],
        );
        let reply: QuestionsReply = complete_json(self, &QUESTIONS, &text).await?;
        info!(count = reply.questions.len(), "understanding questions generated");
        Ok(reply.questions)
    }
}

impl Agent for ProfessionalFeedbackAgent {
    fn name(&self) -> &'static str {
        "professional-feedback"
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

    fn map() -> ReadingMap {
        ReadingMap {
            core_question: "Should hospitals adopt AI triage?".into(),
            main_conclusion: "Gradually.".into(),
            argument_structure: vec!["benefit".into(), "risk".into()],
        }
    }

    #[tokio::test]
    async fn test_evaluate_output_without_scores_is_parse_error() {
        for reply in [
            r#"{"feedback": {}}"#,
            r#"{"feedback": {"logicScore": "excellent", "toneScore": -4, "clarityScore": 3}}"#,
        ] {
            let (ctx, transport) = agent_context(vec![Ok(openai_reply(reply))]);
            let result = ProfessionalFeedbackAgent::new(ctx)
                .evaluate_output("article", &map(), "Summarize", "text")
                .await;
            assert!(matches!(result, Err(LlmError::Parse { .. })), "{reply}");
            assert_eq!(transport.calls().len(), 1);
        }
    }

    #[tokio::test]
    async fn test_evaluate_output_clamps_scores() {
        let reply = r#"```json
{"feedback": {"logicScore": 7, "toneScore": "3", "clarityScore": 0,
  "strengths": ["clear claim"], "logicFeedback": "ok", "toneFeedback": "ok",
  "suggestions": [{"original": "I think", "improvement": "The data suggests", "reason": "hedge"}],
  "overallAssessment": "good start"}}
```"#;
        let (ctx, transport) = agent_context(vec![Ok(openai_reply(reply))]);

        let feedback = ProfessionalFeedbackAgent::new(ctx)
            .evaluate_output("article", &map(), "Summarize", "I think AI helps.")
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(feedback.logic_score, 5);
        assert_eq!(feedback.tone_score, 3);
        assert_eq!(feedback.clarity_score, 1);
        assert_eq!(feedback.suggestions[0].improvement, "The data suggests");

        let call = &transport.calls()[0];
        let prompt = user_prompt(call);
        assert!(prompt.contains("I think AI helps."));
        assert!(prompt.contains("Should hospitals adopt AI triage?"));
        assert_eq!(call.body["max_tokens"], 1500);
    }

    #[tokio::test]
    async fn test_evaluate_without_feedback_object_fails() {
        let (ctx, _) = agent_context(vec![Ok(openai_reply(r#"{"score": 4}"#))]);
        let result = ProfessionalFeedbackAgent::new(ctx)
            .evaluate_output("a", &map(), "p", "u")
            .await;
        assert!(matches!(result, Err(LlmError::Parse { .. })));
    }

    #[tokio::test]
    async fn test_generate_questions() {
        let reply = r#"{"questions": [
            {"question": "Why gradually?", "purpose": "conclusion", "sampleAnswer": "Risk."},
            {"question": "What is the main risk?", "sampleAnswer": "Bias."}
        ]}"#;
        let (ctx, _) = agent_context(vec![Ok(openai_reply(reply))]);
        let questions = ProfessionalFeedbackAgent::new(ctx)
            .generate_understanding_questions("article", &map())
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[1].purpose, None);
    }
}
