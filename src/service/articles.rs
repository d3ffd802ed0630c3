//! Article catalogue, publication schedule and the AI pipeline.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tracing::{error, info};

use super::{ServiceResult, new_id};
use crate::agent::{AgentStages, ContentValidation, ExplainedExpression, run_pipeline};
use crate::core::{
    Article, ArticleMetadata, ArticleQuery, ArticleStatistics, ArticleUpdate, NewArticle, Page,
    PageMeta, UnderstandingQuestion,
};
use crate::error::ServiceError;
use crate::storage::Storage;

/// Largest page [`ArticleService::find_all`] returns.
pub const MAX_PAGE_SIZE: u32 = 100;

const NOT_FOUND: &str = "Article not found";

/// Body of a schedule request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    /// Publication date.
    pub scheduled_for: DateTime<Utc>,
}

/// Article operations.
#[derive(Clone)]
pub struct ArticleService {
    storage: Arc<dyn Storage>,
    agents: Arc<AgentStages>,
}

impl ArticleService {
    /// Creates the service.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, agents: Arc<AgentStages>) -> Self {
        Self { storage, agents }
    }

    /// Stores a new, unpublished article.
    ///
    /// # Errors
    ///
    /// [`ServiceError::BadRequest`] if the title is blank or taken.
    pub fn create(&self, new: NewArticle) -> ServiceResult<Article> {
        let title = new.title.trim().to_string();
        if title.is_empty() {
            return Err(ServiceError::bad_request("Article title must not be empty"));
        }
        if self.storage.find_article_by_title(&title)?.is_some() {
            return Err(ServiceError::bad_request(
                "Article with this title already exists",
            ));
        }

        let now = Utc::now();
        let article = Article {
            id: new_id(),
            title,
            domain: new.domain,
            difficulty: new.difficulty,
            content: new.content,
            word_count: new.word_count,
            ai: None,
            metadata: ArticleMetadata {
                source_url: new.source_url,
                author: new.author,
                tags: new.tags,
            },
            scheduled_for: new.scheduled_for,
            published_at: None,
            created_at: now,
            updated_at: now,
        };
        self.storage.insert_article(&article)?;
        info!(article_id = %article.id, title = %article.title, "article created");
        Ok(article)
    }

    /// Released articles matching `query`, newest first. The page size is
    /// clamped to `1..=MAX_PAGE_SIZE`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Storage`] on database failure.
    pub fn find_all(&self, query: &ArticleQuery) -> ServiceResult<Page<Article>> {
        let query = ArticleQuery {
            limit: query.limit.clamp(1, MAX_PAGE_SIZE),
            search: query
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from),
            ..query.clone()
        };
        let (data, total) = self.storage.query_articles(&query, Utc::now())?;
        Ok(Page {
            data,
            meta: PageMeta::new(total, query.offset, query.limit),
        })
    }

    /// Loads one article.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if no article has `id`.
    pub fn find_one(&self, id: &str) -> ServiceResult<Article> {
        self.storage
            .get_article(id)?
            .ok_or_else(|| ServiceError::not_found(NOT_FOUND))
    }

    /// Today's article: the one scheduled for the current UTC day, else the
    /// most recently published one.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if neither exists.
    pub fn today(&self) -> ServiceResult<Article> {
        let start = day_start(Utc::now());
        if let Some(article) = self
            .storage
            .find_scheduled_between(start, start + Duration::days(1))?
        {
            return Ok(article);
        }
        self.storage
            .latest_published()?
            .ok_or_else(|| ServiceError::not_found("No article available for today"))
    }

    /// Applies a partial update. An unpublished article is published when
    /// the update carries a publication date or its scheduled date has
    /// passed.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] for an unknown id,
    /// [`ServiceError::BadRequest`] if the new title belongs to another
    /// article.
    pub fn update(&self, id: &str, update: ArticleUpdate) -> ServiceResult<Article> {
        let mut article = self.find_one(id)?;
        let now = Utc::now();
        let publish = article.published_at.is_none()
            && (update.published_at.is_some() || article.scheduled_for.is_some_and(|at| at <= now));

        if let Some(title) = update.title {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(ServiceError::bad_request("Article title must not be empty"));
            }
            if let Some(other) = self.storage.find_article_by_title(&title)?
                && other.id != article.id
            {
                return Err(ServiceError::bad_request(
                    "Article with this title already exists",
                ));
            }
            article.title = title;
        }
        if let Some(domain) = update.domain {
            article.domain = domain;
        }
        if let Some(difficulty) = update.difficulty {
            article.difficulty = difficulty;
        }
        if let Some(content) = update.content {
            article.content = content;
        }
        if let Some(word_count) = update.word_count {
            article.word_count = word_count;
        }
        if let Some(at) = update.scheduled_for {
            article.scheduled_for = Some(at);
        }
        if let Some(at) = update.published_at {
            article.published_at = Some(at);
        }
        if publish && article.published_at.is_none() {
            article.published_at = Some(now);
        }
        article.updated_at = now;

        self.storage.update_article(&article)?;
        info!(article_id = %article.id, published = article.published_at.is_some(), "article updated");
        Ok(article)
    }

    /// Deletes an article and returns it.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] for an unknown id.
    pub fn remove(&self, id: &str) -> ServiceResult<Article> {
        let article = self.find_one(id)?;
        if !self.storage.delete_article(id)? {
            return Err(ServiceError::not_found(NOT_FOUND));
        }
        info!(article_id = %id, "article deleted");
        Ok(article)
    }

    /// Sets the publication date. A date that is not in the future also
    /// publishes the article now.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] for an unknown id.
    pub fn schedule(&self, id: &str, at: DateTime<Utc>) -> ServiceResult<Article> {
        let mut article = self.find_one(id)?;
        let now = Utc::now();
        article.scheduled_for = Some(at);
        if at <= now {
            article.published_at = Some(now);
        }
        article.updated_at = now;
        self.storage.update_article(&article)?;
        info!(article_id = %id, scheduled_for = %at, "article scheduled");
        Ok(article)
    }

    /// Catalogue counts.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Storage`] on database failure.
    pub fn statistics(&self) -> ServiceResult<ArticleStatistics> {
        let counts = self.storage.article_counts(Utc::now())?;
        Ok(ArticleStatistics {
            total_articles: counts.total,
            published_articles: counts.published,
            scheduled_articles: counts.scheduled,
            articles_by_domain: counts.by_domain,
            articles_by_difficulty: counts.by_difficulty,
        })
    }

    /// Runs the four-stage pipeline and stores its results together with
    /// the new classification. A failed run leaves the article untouched.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] for an unknown id, [`ServiceError::Llm`]
    /// if any stage fails.
    pub async fn process_with_ai(&self, id: &str) -> ServiceResult<Article> {
        let article = self.find_one(id)?;
        info!(article_id = %id, title = %article.title, "processing article");

        let output = run_pipeline(self.agents.as_ref(), &article.content)
            .await
            .map_err(|e| {
                error!(article_id = %id, error = %e, "article processing failed");
                e
            })?;

        let (domain, difficulty) = output.classification((article.domain, article.difficulty));
        if !self
            .storage
            .apply_analysis(id, domain, difficulty, &output.content, Utc::now())?
        {
            return Err(ServiceError::not_found(NOT_FOUND));
        }
        info!(article_id = %id, %domain, %difficulty, "article processed");
        self.find_one(id)
    }

    /// Asks the Domain-Curator whether the article suits the product.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] for an unknown id, [`ServiceError::Llm`]
    /// on agent failure.
    pub async fn validate_content(&self, id: &str) -> ServiceResult<ContentValidation> {
        let article = self.find_one(id)?;
        let validation = self.agents.curator().validate_content(&article.content).await?;
        info!(article_id = %id, approved = validation.approved, "article validated");
        Ok(validation)
    }

    /// Generates fresh comprehension questions from the stored reading map.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] for an unknown id,
    /// [`ServiceError::BadRequest`] if the article has not been processed,
    /// [`ServiceError::Llm`] on agent failure.
    pub async fn generate_understanding_questions(
        &self,
        id: &str,
    ) -> ServiceResult<Vec<UnderstandingQuestion>> {
        let article = self.find_one(id)?;
        let reading_map = article.reading_map().ok_or_else(|| {
            ServiceError::bad_request("Article has no reading map; process it with AI first")
        })?;
        Ok(self
            .agents
            .feedback()
            .generate_understanding_questions(&article.content, reading_map)
            .await?)
    }

    /// Explains the article's stored reasoning expressions for learners.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] for an unknown id,
    /// [`ServiceError::BadRequest`] if the article has no language
    /// breakdown, [`ServiceError::Llm`] on agent failure.
    pub async fn explain_expressions(&self, id: &str) -> ServiceResult<Vec<ExplainedExpression>> {
        let article = self.find_one(id)?;
        let breakdown = article
            .ai
            .as_ref()
            .map(|ai| ai.language_breakdown.as_slice())
            .filter(|entries| !entries.is_empty())
            .ok_or_else(|| {
                ServiceError::bad_request(
                    "Article has no language breakdown; process it with AI first",
                )
            })?;
        Ok(self.agents.language().explain_expressions(breakdown).await?)
    }
}

impl std::fmt::Debug for ArticleService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArticleService").finish_non_exhaustive()
    }
}

/// Midnight UTC of the day containing `now`.
fn day_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(chrono::NaiveTime::MIN).and_utc()
}
