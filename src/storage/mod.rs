//! Persistence.
//!
//! [`Storage`] is record-level: it reads and writes whole aggregates and
//! runs the few queries that need the database's help (filtered paging,
//! grouped counts). Business rules live in [`crate::service`].

pub mod schema;
pub mod sqlite;

use chrono::{DateTime, Utc};

pub use sqlite::SqliteStorage;

use crate::core::{
    AiContent, Article, ArticleQuery, Difficulty, Domain, Feedback, GroupCount, MemoryItem,
    MemoryItemType, ReadingSession, SessionStatus, UserOutput,
};
use crate::error::StorageError;

/// Database location used when none is configured, relative to the
/// working directory.
pub const DEFAULT_DB_PATH: &str = ".daily-english/daily-english.db";

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Persistence operations used by the services.
pub trait Storage: Send + Sync {
    // ==================== Articles ====================

    /// Inserts a new article.
    fn insert_article(&self, article: &Article) -> StorageResult<()>;

    /// Loads an article by id.
    fn get_article(&self, id: &str) -> StorageResult<Option<Article>>;

    /// Loads an article by exact title.
    fn find_article_by_title(&self, title: &str) -> StorageResult<Option<Article>>;

    /// Released articles matching `query` (newest first), plus the total
    /// match count before paging.
    fn query_articles(
        &self,
        query: &ArticleQuery,
        now: DateTime<Utc>,
    ) -> StorageResult<(Vec<Article>, u64)>;

    /// First article scheduled within `[start, end)`.
    fn find_scheduled_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StorageResult<Option<Article>>;

    /// The most recently published article.
    fn latest_published(&self) -> StorageResult<Option<Article>>;

    /// Overwrites every stored field of an existing article.
    fn update_article(&self, article: &Article) -> StorageResult<()>;

    /// Replaces classification and AI content in a single write. Returns
    /// `false` if the article does not exist.
    fn apply_analysis(
        &self,
        id: &str,
        domain: Domain,
        difficulty: Difficulty,
        content: &AiContent,
        now: DateTime<Utc>,
    ) -> StorageResult<bool>;

    /// Deletes an article. Returns `false` if it did not exist.
    fn delete_article(&self, id: &str) -> StorageResult<bool>;

    /// Article counts: total, published, scheduled after `now` and not yet
    /// published, by domain, by difficulty.
    fn article_counts(&self, now: DateTime<Utc>) -> StorageResult<ArticleCounts>;

    // ==================== User outputs ====================

    /// Inserts a user output.
    fn insert_output(&self, output: &UserOutput) -> StorageResult<()>;

    /// Loads a user output by id.
    fn get_output(&self, id: &str) -> StorageResult<Option<UserOutput>>;

    /// A user's outputs, newest first, optionally for one article.
    fn list_outputs(
        &self,
        user_id: &str,
        article_id: Option<&str>,
    ) -> StorageResult<Vec<UserOutput>>;

    /// Stores generated feedback. Returns `false` if the output is gone.
    fn set_feedback(
        &self,
        id: &str,
        feedback: &Feedback,
        at: DateTime<Utc>,
    ) -> StorageResult<bool>;

    // ==================== Memory items ====================

    /// Inserts a memory item.
    fn insert_memory_item(&self, item: &MemoryItem) -> StorageResult<()>;

    /// Loads a memory item by id.
    fn get_memory_item(&self, id: &str) -> StorageResult<Option<MemoryItem>>;

    /// A user's items, newest first, optionally of one type.
    fn list_memory_items(
        &self,
        user_id: &str,
        item_type: Option<MemoryItemType>,
    ) -> StorageResult<Vec<MemoryItem>>;

    /// Saves review state (count, last review, mastery).
    fn update_memory_item(&self, item: &MemoryItem) -> StorageResult<()>;

    /// Deletes a memory item. Returns `false` if it did not exist.
    fn delete_memory_item(&self, id: &str) -> StorageResult<bool>;

    // ==================== Reading sessions ====================

    /// Inserts a reading session.
    fn insert_session(&self, session: &ReadingSession) -> StorageResult<()>;

    /// Loads a reading session by id.
    fn get_session(&self, id: &str) -> StorageResult<Option<ReadingSession>>;

    /// The user's most recent session for an article, in any status.
    fn find_session(&self, user_id: &str, article_id: &str)
    -> StorageResult<Option<ReadingSession>>;

    /// A user's sessions, newest first, optionally in one status.
    fn list_sessions(
        &self,
        user_id: &str,
        status: Option<SessionStatus>,
    ) -> StorageResult<Vec<ReadingSession>>;

    /// Overwrites the mutable fields of a session.
    fn update_session(&self, session: &ReadingSession) -> StorageResult<()>;
}

/// Raw counts behind [`crate::core::ArticleStatistics`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleCounts {
    /// All articles.
    pub total: u64,
    /// Articles with a publication date.
    pub published: u64,
    /// Unpublished articles scheduled in the future.
    pub scheduled: u64,
    /// Counts per domain, largest first.
    pub by_domain: Vec<GroupCount>,
    /// Counts per difficulty, largest first.
    pub by_difficulty: Vec<GroupCount>,
}
