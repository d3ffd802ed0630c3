//! Learner-written responses and their professional feedback.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use super::{ServiceResult, new_id};
use crate::agent::AgentStages;
use crate::core::{Feedback, NewUserOutput, UserOutput};
use crate::error::ServiceError;
use crate::storage::Storage;

const NOT_FOUND: &str = "User output not found";

/// An output stored by [`UserOutputService::submit`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedOutput {
    /// The stored output, with feedback when generation succeeded.
    #[serde(flatten)]
    pub output: UserOutput,
    /// Whether feedback still has to be generated.
    pub feedback_pending: bool,
}

/// User output operations. Every operation is scoped to one user.
#[derive(Clone)]
pub struct UserOutputService {
    storage: Arc<dyn Storage>,
    agents: Arc<AgentStages>,
}

impl UserOutputService {
    /// Creates the service.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, agents: Arc<AgentStages>) -> Self {
        Self { storage, agents }
    }

    /// Stores a response without feedback.
    ///
    /// # Errors
    ///
    /// [`ServiceError::BadRequest`] for a blank response,
    /// [`ServiceError::NotFound`] if the article does not exist.
    pub fn create(&self, user_id: &str, new: NewUserOutput) -> ServiceResult<UserOutput> {
        if new.user_output.trim().is_empty() {
            return Err(ServiceError::bad_request("Output text must not be empty"));
        }
        if self.storage.get_article(&new.article_id)?.is_none() {
            return Err(ServiceError::not_found("Article not found"));
        }
        let output = UserOutput {
            id: new_id(),
            user_id: user_id.to_string(),
            article_id: new.article_id,
            session_id: new.session_id,
            prompt: new.prompt,
            user_output: new.user_output,
            submitted_at: Utc::now(),
            ai_feedback: None,
            feedback_generated_at: None,
        };
        self.storage.insert_output(&output)?;
        info!(output_id = %output.id, user_id, article_id = %output.article_id, "user output stored");
        Ok(output)
    }

    /// Generates feedback for a stored response. Feedback is generated at
    /// most once; later calls return the stored feedback.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] for an unknown output or article,
    /// [`ServiceError::BadRequest`] if the article has no reading map,
    /// [`ServiceError::Llm`] on agent failure.
    pub async fn generate_feedback(&self, user_id: &str, id: &str) -> ServiceResult<UserOutput> {
        let mut output = self.find_one(user_id, id)?;
        if output.ai_feedback.is_some() {
            return Ok(output);
        }

        let article = self
            .storage
            .get_article(&output.article_id)?
            .ok_or_else(|| ServiceError::not_found("Article not found"))?;
        let reading_map = article.reading_map().ok_or_else(|| {
            ServiceError::bad_request("Article has no reading map; process it with AI first")
        })?;

        let feedback = self
            .agents
            .feedback()
            .evaluate_output(
                &article.content,
                reading_map,
                &output.prompt,
                &output.user_output,
            )
            .await?;

        let now = Utc::now();
        if !self.storage.set_feedback(id, &feedback, now)? {
            return Err(ServiceError::not_found(NOT_FOUND));
        }
        info!(output_id = %id, "feedback stored");
        output.ai_feedback = Some(feedback);
        output.feedback_generated_at = Some(now);
        Ok(output)
    }

    /// Stores a response and tries to generate its feedback. A feedback
    /// failure is logged and reported through
    /// [`SubmittedOutput::feedback_pending`]; the response stays stored.
    ///
    /// # Errors
    ///
    /// As for [`Self::create`].
    pub async fn submit(&self, user_id: &str, new: NewUserOutput) -> ServiceResult<SubmittedOutput> {
        let output = self.create(user_id, new)?;
        match self.generate_feedback(user_id, &output.id).await {
            Ok(output) => Ok(SubmittedOutput {
                output,
                feedback_pending: false,
            }),
            Err(e) => {
                warn!(output_id = %output.id, error = %e, "feedback generation deferred");
                Ok(SubmittedOutput {
                    output,
                    feedback_pending: true,
                })
            }
        }
    }

    /// The user's responses, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Storage`] on database failure.
    pub fn list(&self, user_id: &str, article_id: Option<&str>) -> ServiceResult<Vec<UserOutput>> {
        Ok(self.storage.list_outputs(user_id, article_id)?)
    }

    /// Loads one of the user's responses.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if it does not exist or belongs to
    /// someone else.
    pub fn find_one(&self, user_id: &str, id: &str) -> ServiceResult<UserOutput> {
        self.storage
            .get_output(id)?
            .filter(|output| output.user_id == user_id)
            .ok_or_else(|| ServiceError::not_found(NOT_FOUND))
    }

    /// The stored feedback of one response.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] for an unknown response or one without
    /// feedback yet.
    pub fn get_feedback(&self, user_id: &str, id: &str) -> ServiceResult<Feedback> {
        self.find_one(user_id, id)?
            .ai_feedback
            .ok_or_else(|| ServiceError::not_found("Feedback not yet generated"))
    }
}

impl std::fmt::Debug for UserOutputService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserOutputService").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::openai_reply;
    use crate::service::Services;
    use crate::service::testing::{FEEDBACK_REPLY, new_article, pipeline_replies, services};

    fn new_output(article_id: &str) -> NewUserOutput {
        NewUserOutput {
            article_id: article_id.to_string(),
            prompt: "Summarize the argument".into(),
            user_output: "AI triage should be adopted step by step.".into(),
            session_id: None,
        }
    }

    async fn processed_article(services: &Services) -> String {
        let article = services
            .articles
            .create(new_article("triage"))
            .unwrap_or_else(|_| unreachable!());
        services
            .articles
            .process_with_ai(&article.id)
            .await
            .unwrap_or_else(|_| unreachable!());
        article.id
    }

    #[test]
    fn test_create_requires_article() {
        let (services, _, _) = services(Vec::new());
        let result = services.outputs.create("u1", new_output("missing"));
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_generate_feedback_is_idempotent() {
        let mut replies = pipeline_replies();
        replies.push(Ok(openai_reply(FEEDBACK_REPLY)));
        let (services, _, transport) = services(replies);
        let article_id = processed_article(&services).await;

        let output = services
            .outputs
            .create("u1", new_output(&article_id))
            .unwrap_or_else(|_| unreachable!());
        assert!(matches!(
            services.outputs.get_feedback("u1", &output.id),
            Err(ServiceError::NotFound(ref m)) if m == "Feedback not yet generated"
        ));

        let first = services
            .outputs
            .generate_feedback("u1", &output.id)
            .await
            .unwrap_or_else(|_| unreachable!());
        let second = services
            .outputs
            .generate_feedback("u1", &output.id)
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(transport.calls().len(), 6);
        assert_eq!(first.ai_feedback, second.ai_feedback);
        let feedback = services
            .outputs
            .get_feedback("u1", &output.id)
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(feedback.logic_score, 4);
        assert_eq!(feedback.clarity_score, 5);
    }

    #[tokio::test]
    async fn test_scoreless_feedback_is_not_stored() {
        let mut replies = pipeline_replies();
        replies.push(Ok(openai_reply(r#"{"feedback": {}}"#)));
        replies.push(Ok(openai_reply(FEEDBACK_REPLY)));
        let (services, _, _) = services(replies);
        let article_id = processed_article(&services).await;
        let output = services
            .outputs
            .create("u1", new_output(&article_id))
            .unwrap_or_else(|_| unreachable!());

        let result = services.outputs.generate_feedback("u1", &output.id).await;
        assert!(matches!(
            result,
            Err(ServiceError::Llm(crate::error::LlmError::Parse { .. }))
        ));
        assert!(matches!(
            services.outputs.get_feedback("u1", &output.id),
            Err(ServiceError::NotFound(_))
        ));

        let retried = services
            .outputs
            .generate_feedback("u1", &output.id)
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(retried.ai_feedback.map(|f| f.logic_score), Some(4));
    }

    #[tokio::test]
    async fn test_feedback_requires_reading_map() {
        let (services, _, transport) = services(Vec::new());
        let article = services
            .articles
            .create(new_article("raw"))
            .unwrap_or_else(|_| unreachable!());
        let output = services
            .outputs
            .create("u1", new_output(&article.id))
            .unwrap_or_else(|_| unreachable!());

        let result = services.outputs.generate_feedback("u1", &output.id).await;
        assert!(matches!(result, Err(ServiceError::BadRequest(_))));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_submit_keeps_output_when_feedback_fails() {
        let mut replies = pipeline_replies();
        replies.push(Ok(openai_reply("Great job!")));
        let (services, _, _) = services(replies);
        let article_id = processed_article(&services).await;

        let submitted = services
            .outputs
            .submit("u1", new_output(&article_id))
            .await
            .unwrap_or_else(|_| unreachable!());
        assert!(submitted.feedback_pending);
        assert!(submitted.output.ai_feedback.is_none());

        let listed = services
            .outputs
            .list("u1", Some(&article_id))
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, submitted.output.id);
    }

    #[tokio::test]
    async fn test_submit_with_feedback() {
        let mut replies = pipeline_replies();
        replies.push(Ok(openai_reply(FEEDBACK_REPLY)));
        let (services, _, _) = services(replies);
        let article_id = processed_article(&services).await;

        let submitted = services
            .outputs
            .submit("u1", new_output(&article_id))
            .await
            .unwrap_or_else(|_| unreachable!());
        assert!(!submitted.feedback_pending);
        assert!(submitted.output.feedback_generated_at.is_some());
    }

    #[test]
    fn test_outputs_are_scoped_to_owner() {
        let (services, _, _) = services(Vec::new());
        let article = services
            .articles
            .create(new_article("private"))
            .unwrap_or_else(|_| unreachable!());
        let output = services
            .outputs
            .create("u1", new_output(&article.id))
            .unwrap_or_else(|_| unreachable!());

        assert!(services.outputs.find_one("u2", &output.id).is_err());
        assert!(
            services
                .outputs
                .list("u2", None)
                .unwrap_or_default()
                .is_empty()
        );
    }
}
