//! Reading sessions: one learner working through one article.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use super::memory_items::MemoryItemService;
use super::{ServiceResult, new_id};
use crate::core::session::minutes_between;
use crate::core::{
    DailySummary, ProgressUpdate, ReadingSession, SessionProgress, SessionStats, SessionStatus,
    UnderstandingAnswer,
};
use crate::error::ServiceError;
use crate::storage::Storage;

/// Sessions listed in [`SessionStats::recent_sessions`].
pub const RECENT_SESSIONS: usize = 5;

const NOT_FOUND: &str = "Reading session not found";
const NOT_IN_PROGRESS: &str = "Session is not in progress";

/// Body of a create request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    /// Article to read.
    pub article_id: String,
}

/// Body of an understanding answer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitUnderstandingRequest {
    /// Question answered.
    pub question_id: String,
    /// Answer text.
    pub answer: String,
}

/// Body of a completion request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteSessionRequest {
    /// Takeaways to save to the memory bank.
    #[serde(default)]
    pub daily_summary: Option<DailySummary>,
}

/// Reading session operations. Every operation is scoped to one user.
#[derive(Clone)]
pub struct ReadingSessionService {
    storage: Arc<dyn Storage>,
    memory: MemoryItemService,
}

impl ReadingSessionService {
    /// Creates the service. Completed sessions with a daily summary are
    /// saved through `memory`.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, memory: MemoryItemService) -> Self {
        Self { storage, memory }
    }

    /// Starts reading an article, or resumes the session already in
    /// progress for it.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if the article does not exist,
    /// [`ServiceError::BadRequest`] if the user already finished it.
    pub fn create(&self, user_id: &str, article_id: &str) -> ServiceResult<ReadingSession> {
        if self.storage.get_article(article_id)?.is_none() {
            return Err(ServiceError::not_found("Article not found"));
        }
        if let Some(existing) = self.storage.find_session(user_id, article_id)? {
            if existing.is_in_progress() {
                return Ok(existing);
            }
            return Err(ServiceError::bad_request(format!(
                "Reading session for this article already {}",
                existing.status.as_str()
            )));
        }

        let session = ReadingSession {
            id: new_id(),
            user_id: user_id.to_string(),
            article_id: article_id.to_string(),
            status: SessionStatus::InProgress,
            started_at: Utc::now(),
            completed_at: None,
            progress: SessionProgress::default(),
            understanding_answer: None,
            daily_summary: None,
            time_spent_minutes: 0,
        };
        self.storage.insert_session(&session)?;
        info!(session_id = %session.id, user_id, article_id, "reading session started");
        Ok(session)
    }

    /// The user's sessions, most recently started first.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Storage`] on database failure.
    pub fn list(
        &self,
        user_id: &str,
        status: Option<SessionStatus>,
    ) -> ServiceResult<Vec<ReadingSession>> {
        Ok(self.storage.list_sessions(user_id, status)?)
    }

    /// Loads one of the user's sessions.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if it does not exist or belongs to
    /// someone else.
    pub fn find_one(&self, user_id: &str, id: &str) -> ServiceResult<ReadingSession> {
        self.storage
            .get_session(id)?
            .filter(|session| session.user_id == user_id)
            .ok_or_else(|| ServiceError::not_found(NOT_FOUND))
    }

    /// Records which reading aids the user has opened.
    ///
    /// # Errors
    ///
    /// [`ServiceError::BadRequest`] if the session is finished or the
    /// update names an unknown field or carries the wrong kind of value.
    pub fn update_progress(
        &self,
        user_id: &str,
        id: &str,
        update: &ProgressUpdate,
    ) -> ServiceResult<ReadingSession> {
        let mut session = self.find_one(user_id, id)?;
        if !session.is_in_progress() {
            return Err(ServiceError::bad_request(
                "Cannot update progress on completed or abandoned sessions",
            ));
        }
        session
            .progress
            .apply(update)
            .map_err(ServiceError::BadRequest)?;
        self.storage.update_session(&session)?;
        Ok(session)
    }

    /// Stores the answer to the comprehension question. Only one answer is
    /// accepted per session.
    ///
    /// # Errors
    ///
    /// [`ServiceError::BadRequest`] if the session is finished or already
    /// answered.
    pub fn submit_understanding(
        &self,
        user_id: &str,
        id: &str,
        request: SubmitUnderstandingRequest,
    ) -> ServiceResult<ReadingSession> {
        let mut session = self.find_one(user_id, id)?;
        if !session.is_in_progress() {
            return Err(ServiceError::bad_request(
                "Cannot submit answer on completed or abandoned sessions",
            ));
        }
        if session.progress.understanding_answered {
            return Err(ServiceError::bad_request(
                "Understanding answer already submitted",
            ));
        }
        session.understanding_answer = Some(UnderstandingAnswer {
            question_id: request.question_id,
            answer: request.answer,
            answered_at: Utc::now(),
        });
        session.progress.understanding_answered = true;
        self.storage.update_session(&session)?;
        info!(session_id = %id, "understanding answer submitted");
        Ok(session)
    }

    /// Finishes a session, recording the minutes spent. A daily summary is
    /// stored on the session and saved to the memory bank.
    ///
    /// # Errors
    ///
    /// [`ServiceError::BadRequest`] if the session is not in progress.
    pub fn complete(
        &self,
        user_id: &str,
        id: &str,
        daily_summary: Option<DailySummary>,
    ) -> ServiceResult<ReadingSession> {
        let mut session = self.find_one(user_id, id)?;
        if !session.is_in_progress() {
            return Err(ServiceError::bad_request(NOT_IN_PROGRESS));
        }
        let now = Utc::now();
        session.status = SessionStatus::Completed;
        session.completed_at = Some(now);
        session.time_spent_minutes = minutes_between(session.started_at, now);
        session.daily_summary = daily_summary;
        self.storage.update_session(&session)?;
        info!(
            session_id = %id,
            minutes = session.time_spent_minutes,
            "reading session completed"
        );

        if let Some(summary) = &session.daily_summary {
            let context = self
                .storage
                .get_article(&session.article_id)?
                .map(|article| article.title)
                .unwrap_or_default();
            self.memory
                .create_from_session(user_id, &session.article_id, summary, &context)?;
        }
        Ok(session)
    }

    /// Gives up on a session.
    ///
    /// # Errors
    ///
    /// [`ServiceError::BadRequest`] if the session is not in progress.
    pub fn abandon(&self, user_id: &str, id: &str) -> ServiceResult<ReadingSession> {
        let mut session = self.find_one(user_id, id)?;
        if !session.is_in_progress() {
            return Err(ServiceError::bad_request(NOT_IN_PROGRESS));
        }
        session.status = SessionStatus::Abandoned;
        self.storage.update_session(&session)?;
        info!(session_id = %id, "reading session abandoned");
        Ok(session)
    }

    /// Summary of the user's reading.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Storage`] on database failure.
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self, user_id: &str) -> ServiceResult<SessionStats> {
        let sessions = self.storage.list_sessions(user_id, None)?;
        let completed: Vec<u32> = sessions
            .iter()
            .filter(|s| s.status == SessionStatus::Completed)
            .map(|s| s.time_spent_minutes)
            .collect();
        let avg_time_spent = if completed.is_empty() {
            0.0
        } else {
            completed.iter().map(|&m| u64::from(m)).sum::<u64>() as f64 / completed.len() as f64
        };
        let in_progress_sessions = sessions.iter().filter(|s| s.is_in_progress()).count() as u64;

        Ok(SessionStats {
            total_sessions: sessions.len() as u64,
            completed_sessions: completed.len() as u64,
            in_progress_sessions,
            avg_time_spent,
            recent_sessions: sessions.into_iter().take(RECENT_SESSIONS).collect(),
        })
    }
}

impl std::fmt::Debug for ReadingSessionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadingSessionService").finish_non_exhaustive()
    }
}
