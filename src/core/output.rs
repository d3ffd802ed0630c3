//! Learner writing submissions and the feedback attached to them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One concrete rewrite suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    /// Phrase or section that could be better.
    #[serde(default)]
    pub original: String,
    /// Suggested alternative.
    #[serde(default)]
    pub improvement: String,
    /// Why the alternative is better.
    #[serde(default)]
    pub reason: String,
}

/// Scored, qualitative feedback on a learner's submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    /// Reasoning quality, 1-5.
    #[serde(deserialize_with = "crate::core::lenient::score")]
    pub logic_score: u8,
    /// Professional tone, 1-5.
    #[serde(deserialize_with = "crate::core::lenient::score")]
    pub tone_score: u8,
    /// Clarity, 1-5.
    #[serde(deserialize_with = "crate::core::lenient::score")]
    pub clarity_score: u8,
    /// What was done well.
    #[serde(default)]
    pub strengths: Vec<String>,
    /// Comments on reasoning and structure.
    #[serde(default)]
    pub logic_feedback: String,
    /// Comments on tone.
    #[serde(default)]
    pub tone_feedback: String,
    /// Targeted rewrites.
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
    /// Encouraging summary.
    #[serde(default)]
    pub overall_assessment: String,
}

/// A learner's written response to an output prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOutput {
    /// Unique identifier.
    pub id: String,
    /// Author.
    pub user_id: String,
    /// Article the response is about.
    pub article_id: String,
    /// Reading session the response was written in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// The prompt the learner answered.
    pub prompt: String,
    /// The learner's text.
    pub user_output: String,
    /// Submission time.
    pub submitted_at: DateTime<Utc>,
    /// Evaluation, once generated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_feedback: Option<Feedback>,
    /// When the evaluation was stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback_generated_at: Option<DateTime<Utc>>,
}

/// Fields supplied when submitting an output.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUserOutput {
    /// Article the response is about.
    pub article_id: String,
    /// Prompt answered.
    pub prompt: String,
    /// The learner's text.
    pub user_output: String,
    /// Reading session, if any.
    #[serde(default)]
    pub session_id: Option<String>,
}
