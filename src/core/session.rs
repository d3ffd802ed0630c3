//! Reading sessions: one learner working through one article.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Still being worked on.
    InProgress,
    /// Finished normally.
    Completed,
    /// Given up.
    Abandoned,
}

impl SessionStatus {
    /// Returns the canonical string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Abandoned => "abandoned",
        }
    }

    /// Parses the canonical string form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "abandoned" => Some(Self::Abandoned),
            _ => None,
        }
    }
}

/// Which reading aids the learner has opened so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionProgress {
    /// Reading map opened.
    pub reading_map_viewed: bool,
    /// Indices of key paragraphs opened.
    pub key_paragraphs_viewed: Vec<u32>,
    /// Language breakdown opened.
    pub language_breakdown_viewed: bool,
    /// Understanding question answered.
    pub understanding_answered: bool,
    /// Output submitted.
    pub output_submitted: bool,
}

/// A progress change as sent by the client: one named field plus either a
/// boolean or a list value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    /// Field name, e.g. `readingMapViewed`.
    pub field: Option<String>,
    /// Value for boolean fields.
    #[serde(default)]
    pub boolean_value: Option<bool>,
    /// Value for `keyParagraphsViewed`.
    #[serde(default)]
    pub array_value: Option<Vec<u32>>,
}

impl SessionProgress {
    /// Applies a client update. An update without a field or value is a
    /// no-op; an unknown field or a value of the wrong kind is an error.
    ///
    /// # Errors
    ///
    /// Returns a message describing the rejected update.
    pub fn apply(&mut self, update: &ProgressUpdate) -> Result<(), String> {
        let Some(field) = update.field.as_deref() else {
            return Ok(());
        };
        if field == "keyParagraphsViewed" {
            return match (&update.array_value, update.boolean_value) {
                (Some(list), _) => {
                    self.key_paragraphs_viewed.clone_from(list);
                    Ok(())
                }
                (None, Some(_)) => Err(format!("{field} expects arrayValue")),
                (None, None) => Ok(()),
            };
        }
        let slot = match field {
            "readingMapViewed" => &mut self.reading_map_viewed,
            "languageBreakdownViewed" => &mut self.language_breakdown_viewed,
            "understandingAnswered" => &mut self.understanding_answered,
            "outputSubmitted" => &mut self.output_submitted,
            other => return Err(format!("unknown progress field: {other}")),
        };
        match (update.boolean_value, &update.array_value) {
            (Some(value), _) => {
                *slot = value;
                Ok(())
            }
            (None, Some(_)) => Err(format!("{field} expects booleanValue")),
            (None, None) => Ok(()),
        }
    }
}

/// The learner's answer to the comprehension question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnderstandingAnswer {
    /// Identifier of the question answered.
    pub question_id: String,
    /// Answer text.
    pub answer: String,
    /// Submission time.
    pub answered_at: DateTime<Utc>,
}

/// Learner-chosen takeaways recorded when a session is completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    /// A sentence structure worth reusing.
    pub sentence_pattern: String,
    /// A concept learned.
    pub concept: String,
    /// A reasoning expression learned.
    pub expression: String,
}

/// A reading session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingSession {
    /// Unique identifier.
    pub id: String,
    /// Reader.
    pub user_id: String,
    /// Article being read.
    pub article_id: String,
    /// Lifecycle state.
    pub status: SessionStatus,
    /// Start time.
    pub started_at: DateTime<Utc>,
    /// Completion time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Reading-aid progress.
    pub progress: SessionProgress,
    /// Comprehension answer, once submitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub understanding_answer: Option<UnderstandingAnswer>,
    /// Takeaways, once completed with a summary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_summary: Option<DailySummary>,
    /// Whole minutes between start and completion.
    pub time_spent_minutes: u32,
}

impl ReadingSession {
    /// Returns `true` while the session accepts changes.
    #[must_use]
    pub fn is_in_progress(&self) -> bool {
        self.status == SessionStatus::InProgress
    }
}

/// Whole minutes between two instants, rounded to nearest.
#[must_use]
pub fn minutes_between(start: DateTime<Utc>, end: DateTime<Utc>) -> u32 {
    let secs = (end - start).num_seconds().max(0);
    u32::try_from((secs + 30) / 60).unwrap_or(u32::MAX)
}

/// Per-user session summary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    /// All sessions.
    pub total_sessions: u64,
    /// Completed sessions.
    pub completed_sessions: u64,
    /// Sessions still in progress.
    pub in_progress_sessions: u64,
    /// Mean minutes spent over completed sessions, 0 when none.
    pub avg_time_spent: f64,
    /// Five most recently started sessions.
    pub recent_sessions: Vec<ReadingSession>,
}
