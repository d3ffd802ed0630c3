//! Memory bank: sentence patterns, concepts and expressions saved for review.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::GroupCount;

/// Mastery below this counts as "needs practice" in the stats.
pub const LOW_MASTERY: f64 = 0.5;
/// Mastery at or above this counts as "mastered" in the stats.
pub const HIGH_MASTERY: f64 = 0.8;

/// Kind of item saved to the memory bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MemoryItemType {
    /// A reusable sentence structure.
    SentencePattern,
    /// A domain concept.
    Concept,
    /// A reasoning expression.
    Expression,
}

impl MemoryItemType {
    /// Returns the canonical string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SentencePattern => "sentencePattern",
            Self::Concept => "concept",
            Self::Expression => "expression",
        }
    }

    /// Parses the canonical string form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sentencePattern" => Some(Self::SentencePattern),
            "concept" => Some(Self::Concept),
            "expression" => Some(Self::Expression),
            _ => None,
        }
    }
}

/// Mastery after `review_count` reviews: `min(1, 0.1 + 0.15 * count)`.
#[must_use]
pub fn mastery_after(review_count: u32) -> f64 {
    0.15_f64.mul_add(f64::from(review_count), 0.1).min(1.0)
}

/// A saved item with its review history.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryItem {
    /// Unique identifier.
    pub id: String,
    /// Owner.
    pub user_id: String,
    /// Item kind.
    #[serde(rename = "type")]
    pub item_type: MemoryItemType,
    /// The saved text.
    pub content: String,
    /// Where it came from (article title or sentence).
    pub context: String,
    /// Article the item was taken from.
    pub source_article_id: String,
    /// Number of completed reviews.
    pub review_count: u32,
    /// Last review time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reviewed_at: Option<DateTime<Utc>>,
    /// Mastery between 0 and 1.
    pub mastery_level: f64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl MemoryItem {
    /// Records one review at `now`.
    pub fn record_review(&mut self, now: DateTime<Utc>) {
        self.review_count = self.review_count.saturating_add(1);
        self.last_reviewed_at = Some(now);
        self.mastery_level = mastery_after(self.review_count);
    }
}

/// Fields supplied when saving an item.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMemoryItem {
    /// Item kind.
    #[serde(rename = "type")]
    pub item_type: MemoryItemType,
    /// The text to save.
    pub content: String,
    /// Where it came from.
    pub context: String,
    /// Article it was taken from.
    pub source_article_id: String,
}

/// Per-user memory bank summary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryStats {
    /// All items.
    pub total_items: u64,
    /// Counts per type, largest first.
    pub items_by_type: Vec<GroupCount>,
    /// Items below [`LOW_MASTERY`].
    pub low_mastery_items: u64,
    /// Items at or above [`HIGH_MASTERY`].
    pub high_mastery_items: u64,
    /// Ten newest items.
    pub recent_items: Vec<MemoryItem>,
}
