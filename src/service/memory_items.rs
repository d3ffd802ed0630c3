//! The memory bank: saved sentence patterns, concepts and expressions.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::{ServiceResult, new_id};
use crate::core::memory::{HIGH_MASTERY, LOW_MASTERY};
use crate::core::{DailySummary, GroupCount, MemoryItem, MemoryItemType, MemoryStats, NewMemoryItem};
use crate::error::ServiceError;
use crate::storage::Storage;

/// Items listed in [`MemoryStats::recent_items`].
pub const RECENT_ITEMS: usize = 10;

const NOT_FOUND: &str = "Memory item not found";

/// Memory bank operations. Every operation is scoped to one user.
#[derive(Clone)]
pub struct MemoryItemService {
    storage: Arc<dyn Storage>,
}

impl MemoryItemService {
    /// Creates the service.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Saves a new item with no reviews.
    ///
    /// # Errors
    ///
    /// [`ServiceError::BadRequest`] for blank content.
    pub fn create(&self, user_id: &str, new: NewMemoryItem) -> ServiceResult<MemoryItem> {
        if new.content.trim().is_empty() {
            return Err(ServiceError::bad_request(
                "Memory item content must not be empty",
            ));
        }
        let item = MemoryItem {
            id: new_id(),
            user_id: user_id.to_string(),
            item_type: new.item_type,
            content: new.content,
            context: new.context,
            source_article_id: new.source_article_id,
            review_count: 0,
            last_reviewed_at: None,
            mastery_level: 0.0,
            created_at: Utc::now(),
        };
        self.storage.insert_memory_item(&item)?;
        info!(item_id = %item.id, user_id, item_type = %item.item_type.as_str(), "memory item saved");
        Ok(item)
    }

    /// The user's items, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Storage`] on database failure.
    pub fn list(
        &self,
        user_id: &str,
        item_type: Option<MemoryItemType>,
    ) -> ServiceResult<Vec<MemoryItem>> {
        Ok(self.storage.list_memory_items(user_id, item_type)?)
    }

    /// Loads one of the user's items.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if the item does not exist or belongs to
    /// someone else.
    pub fn find_one(&self, user_id: &str, id: &str) -> ServiceResult<MemoryItem> {
        self.storage
            .get_memory_item(id)?
            .filter(|item| item.user_id == user_id)
            .ok_or_else(|| ServiceError::not_found(NOT_FOUND))
    }

    /// Deletes one of the user's items and returns it.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] as for [`Self::find_one`].
    pub fn remove(&self, user_id: &str, id: &str) -> ServiceResult<MemoryItem> {
        let item = self.find_one(user_id, id)?;
        if !self.storage.delete_memory_item(id)? {
            return Err(ServiceError::not_found(NOT_FOUND));
        }
        info!(item_id = %id, user_id, "memory item removed");
        Ok(item)
    }

    /// Records one review and recomputes mastery.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] as for [`Self::find_one`].
    pub fn review(&self, user_id: &str, id: &str) -> ServiceResult<MemoryItem> {
        let mut item = self.find_one(user_id, id)?;
        item.record_review(Utc::now());
        self.storage.update_memory_item(&item)?;
        info!(
            item_id = %id,
            review_count = item.review_count,
            mastery = item.mastery_level,
            "memory item reviewed"
        );
        Ok(item)
    }

    /// Summary of the user's memory bank.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Storage`] on database failure.
    pub fn stats(&self, user_id: &str) -> ServiceResult<MemoryStats> {
        let items = self.storage.list_memory_items(user_id, None)?;

        let mut by_type: HashMap<&'static str, u64> = HashMap::new();
        for item in &items {
            *by_type.entry(item.item_type.as_str()).or_default() += 1;
        }
        let mut items_by_type: Vec<GroupCount> = by_type
            .into_iter()
            .map(|(value, count)| GroupCount {
                value: value.to_string(),
                count,
            })
            .collect();
        items_by_type.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));

        let low_mastery_items = items
            .iter()
            .filter(|i| i.mastery_level < LOW_MASTERY)
            .count() as u64;
        let high_mastery_items = items
            .iter()
            .filter(|i| i.mastery_level >= HIGH_MASTERY)
            .count() as u64;

        Ok(MemoryStats {
            total_items: items.len() as u64,
            items_by_type,
            low_mastery_items,
            high_mastery_items,
            recent_items: items.into_iter().take(RECENT_ITEMS).collect(),
        })
    }

    /// Saves the three takeaways of a completed session, in the order
    /// sentence pattern, concept, expression. Blank takeaways are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Storage`] on database failure.
    pub fn create_from_session(
        &self,
        user_id: &str,
        article_id: &str,
        summary: &DailySummary,
        context: &str,
    ) -> ServiceResult<Vec<MemoryItem>> {
        let takeaways = [
            (MemoryItemType::SentencePattern, &summary.sentence_pattern),
            (MemoryItemType::Concept, &summary.concept),
            (MemoryItemType::Expression, &summary.expression),
        ];
        let mut created = Vec::with_capacity(takeaways.len());
        for (item_type, content) in takeaways {
            if content.trim().is_empty() {
                continue;
            }
            created.push(self.create(
                user_id,
                NewMemoryItem {
                    item_type,
                    content: content.clone(),
                    context: context.to_string(),
                    source_article_id: article_id.to_string(),
                },
            )?);
        }
        info!(user_id, article_id, count = created.len(), "session takeaways saved");
        Ok(created)
    }
}

impl std::fmt::Debug for MemoryItemService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryItemService").finish_non_exhaustive()
    }
}
