//! Domain model: articles, AI reading aids, user outputs, the memory bank
//! and reading sessions.

pub mod article;
pub mod lenient;
pub mod memory;
pub mod output;
pub mod session;

use serde::Serialize;

pub use article::{
    AiContent, Article, ArticleMetadata, ArticleQuery, ArticleStatistics, ArticleUpdate,
    Difficulty, Domain, ExpressionCategory, KeyParagraph, LanguageBreakdown, NewArticle,
    ParagraphRole, ReadingMap, UnderstandingQuestion,
};
pub use memory::{MemoryItem, MemoryItemType, MemoryStats, NewMemoryItem};
pub use output::{Feedback, NewUserOutput, Suggestion, UserOutput};
pub use session::{
    DailySummary, ProgressUpdate, ReadingSession, SessionProgress, SessionStats, SessionStatus,
    UnderstandingAnswer,
};

/// One bucket of a grouped count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCount {
    /// Group key.
    #[serde(rename = "_id")]
    pub value: String,
    /// Members in the group.
    pub count: u64,
}

/// A page of results.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    /// Items on this page.
    pub data: Vec<T>,
    /// Paging information.
    pub meta: PageMeta,
}

/// Position of a [`Page`] within the full result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    /// Total matching items.
    pub total: u64,
    /// Items skipped.
    pub offset: u32,
    /// Page size.
    pub limit: u32,
    /// Whether another page follows.
    pub has_more: bool,
}

impl PageMeta {
    /// Builds the meta block for a page at `offset` of size `limit`.
    #[must_use]
    pub fn new(total: u64, offset: u32, limit: u32) -> Self {
        Self {
            total,
            offset,
            limit,
            has_more: u64::from(offset) + u64::from(limit) < total,
        }
    }
}
