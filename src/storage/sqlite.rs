//! `SQLite` implementation of [`Storage`].

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::schema;
use super::{ArticleCounts, Storage, StorageResult};
use crate::core::{
    AiContent, Article, ArticleQuery, Difficulty, Domain, Feedback, GroupCount, MemoryItem,
    MemoryItemType, ReadingSession, SessionStatus, UserOutput,
};
use crate::error::StorageError;

const ARTICLE_COLUMNS: &str = "id, title, domain, difficulty, content, word_count, ai_content, \
     metadata, scheduled_for, published_at, created_at, updated_at";

const OUTPUT_COLUMNS: &str = "id, user_id, article_id, session_id, prompt, user_output, \
     submitted_at, ai_feedback, feedback_generated_at";

const MEMORY_COLUMNS: &str = "id, user_id, item_type, content, context, source_article_id, \
     review_count, last_reviewed_at, mastery_level, created_at";

const SESSION_COLUMNS: &str = "id, user_id, article_id, status, started_at, completed_at, \
     progress, understanding_answer, daily_summary, time_spent_minutes";

/// `SQLite`-backed storage behind a single connection mutex.
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Opens (creating if needed) the database at `path` and migrates it.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the file cannot be opened or migrated.
    pub fn open(path: &Path) -> StorageResult<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the schema cannot be created.
    pub fn in_memory() -> StorageResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StorageResult<Self> {
        schema::migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::Lock)
    }

    fn query_one<R>(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
        map: fn(&Row<'_>) -> rusqlite::Result<R>,
    ) -> StorageResult<Option<R>> {
        let conn = self.conn()?;
        Ok(conn.query_row(sql, params, map).optional()?)
    }

    fn query_many<R>(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
        map: fn(&Row<'_>) -> rusqlite::Result<R>,
    ) -> StorageResult<Vec<R>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, map)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn count(&self, sql: &str, params: impl rusqlite::Params) -> StorageResult<u64> {
        let conn = self.conn()?;
        let n: i64 = conn.query_row(sql, params, |row| row.get(0))?;
        Ok(u64::try_from(n).unwrap_or_default())
    }

    fn group_counts(&self, column: &str) -> StorageResult<Vec<GroupCount>> {
        let sql = format!(
            "SELECT {column}, COUNT(*) AS n FROM articles GROUP BY {column} ORDER BY n DESC, {column}"
        );
        self.query_many(&sql, [], |row| {
            let n: i64 = row.get(1)?;
            Ok(GroupCount {
                value: row.get(0)?,
                count: u64::try_from(n).unwrap_or_default(),
            })
        })
    }
}

// ==================== Encoding helpers ====================

fn ts(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn opt_ts(at: Option<DateTime<Utc>>) -> Option<String> {
    at.map(ts)
}

fn parse_ts(s: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| corrupt(format!("bad timestamp {s:?}: {e}")))
}

fn parse_opt_ts(s: Option<&str>) -> StorageResult<Option<DateTime<Utc>>> {
    s.map(parse_ts).transpose()
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> StorageResult<String> {
    Ok(serde_json::to_string(value)?)
}

fn opt_json<T: Serialize>(value: Option<&T>) -> StorageResult<Option<String>> {
    value.map(to_json).transpose()
}

fn from_json<T: DeserializeOwned>(s: &str) -> StorageResult<T> {
    Ok(serde_json::from_str(s)?)
}

fn opt_from_json<T: DeserializeOwned>(s: Option<&str>) -> StorageResult<Option<T>> {
    s.map(from_json).transpose()
}

fn corrupt(message: impl Into<String>) -> StorageError {
    StorageError::Corrupt {
        message: message.into(),
    }
}

/// Escapes `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern.
fn like_pattern(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

// ==================== Raw rows ====================

struct RawArticle {
    id: String,
    title: String,
    domain: String,
    difficulty: String,
    content: String,
    word_count: u32,
    ai_content: Option<String>,
    metadata: String,
    scheduled_for: Option<String>,
    published_at: Option<String>,
    created_at: String,
    updated_at: String,
}

impl RawArticle {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            domain: row.get(2)?,
            difficulty: row.get(3)?,
            content: row.get(4)?,
            word_count: row.get(5)?,
            ai_content: row.get(6)?,
            metadata: row.get(7)?,
            scheduled_for: row.get(8)?,
            published_at: row.get(9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
        })
    }

    fn into_article(self) -> StorageResult<Article> {
        Ok(Article {
            domain: Domain::parse(&self.domain)
                .ok_or_else(|| corrupt(format!("unknown domain {:?}", self.domain)))?,
            difficulty: Difficulty::parse(&self.difficulty)
                .ok_or_else(|| corrupt(format!("unknown difficulty {:?}", self.difficulty)))?,
            ai: opt_from_json(self.ai_content.as_deref())?,
            metadata: from_json(&self.metadata)?,
            scheduled_for: parse_opt_ts(self.scheduled_for.as_deref())?,
            published_at: parse_opt_ts(self.published_at.as_deref())?,
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_ts(&self.updated_at)?,
            id: self.id,
            title: self.title,
            content: self.content,
            word_count: self.word_count,
        })
    }
}

struct RawOutput {
    id: String,
    user_id: String,
    article_id: String,
    session_id: Option<String>,
    prompt: String,
    user_output: String,
    submitted_at: String,
    ai_feedback: Option<String>,
    feedback_generated_at: Option<String>,
}

impl RawOutput {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            article_id: row.get(2)?,
            session_id: row.get(3)?,
            prompt: row.get(4)?,
            user_output: row.get(5)?,
            submitted_at: row.get(6)?,
            ai_feedback: row.get(7)?,
            feedback_generated_at: row.get(8)?,
        })
    }

    fn into_output(self) -> StorageResult<UserOutput> {
        Ok(UserOutput {
            submitted_at: parse_ts(&self.submitted_at)?,
            ai_feedback: opt_from_json(self.ai_feedback.as_deref())?,
            feedback_generated_at: parse_opt_ts(self.feedback_generated_at.as_deref())?,
            id: self.id,
            user_id: self.user_id,
            article_id: self.article_id,
            session_id: self.session_id,
            prompt: self.prompt,
            user_output: self.user_output,
        })
    }
}

struct RawMemoryItem {
    id: String,
    user_id: String,
    item_type: String,
    content: String,
    context: String,
    source_article_id: String,
    review_count: u32,
    last_reviewed_at: Option<String>,
    mastery_level: f64,
    created_at: String,
}

impl RawMemoryItem {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            item_type: row.get(2)?,
            content: row.get(3)?,
            context: row.get(4)?,
            source_article_id: row.get(5)?,
            review_count: row.get(6)?,
            last_reviewed_at: row.get(7)?,
            mastery_level: row.get(8)?,
            created_at: row.get(9)?,
        })
    }

    fn into_item(self) -> StorageResult<MemoryItem> {
        Ok(MemoryItem {
            item_type: MemoryItemType::parse(&self.item_type)
                .ok_or_else(|| corrupt(format!("unknown memory item type {:?}", self.item_type)))?,
            last_reviewed_at: parse_opt_ts(self.last_reviewed_at.as_deref())?,
            created_at: parse_ts(&self.created_at)?,
            id: self.id,
            user_id: self.user_id,
            content: self.content,
            context: self.context,
            source_article_id: self.source_article_id,
            review_count: self.review_count,
            mastery_level: self.mastery_level,
        })
    }
}

struct RawSession {
    id: String,
    user_id: String,
    article_id: String,
    status: String,
    started_at: String,
    completed_at: Option<String>,
    progress: String,
    understanding_answer: Option<String>,
    daily_summary: Option<String>,
    time_spent_minutes: u32,
}

impl RawSession {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            article_id: row.get(2)?,
            status: row.get(3)?,
            started_at: row.get(4)?,
            completed_at: row.get(5)?,
            progress: row.get(6)?,
            understanding_answer: row.get(7)?,
            daily_summary: row.get(8)?,
            time_spent_minutes: row.get(9)?,
        })
    }

    fn into_session(self) -> StorageResult<ReadingSession> {
        Ok(ReadingSession {
            status: SessionStatus::parse(&self.status)
                .ok_or_else(|| corrupt(format!("unknown session status {:?}", self.status)))?,
            started_at: parse_ts(&self.started_at)?,
            completed_at: parse_opt_ts(self.completed_at.as_deref())?,
            progress: from_json(&self.progress)?,
            understanding_answer: opt_from_json(self.understanding_answer.as_deref())?,
            daily_summary: opt_from_json(self.daily_summary.as_deref())?,
            id: self.id,
            user_id: self.user_id,
            article_id: self.article_id,
            time_spent_minutes: self.time_spent_minutes,
        })
    }
}

fn convert<R, T>(rows: Vec<R>, f: fn(R) -> StorageResult<T>) -> StorageResult<Vec<T>> {
    rows.into_iter().map(f).collect()
}

// ==================== Storage ====================

impl Storage for SqliteStorage {
    fn insert_article(&self, article: &Article) -> StorageResult<()> {
        let ai = opt_json(article.ai.as_ref())?;
        let metadata = to_json(&article.metadata)?;
        self.conn()?.execute(
            &format!("INSERT INTO articles ({ARTICLE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"),
            params![
                article.id,
                article.title,
                article.domain.as_str(),
                article.difficulty.as_str(),
                article.content,
                article.word_count,
                ai,
                metadata,
                opt_ts(article.scheduled_for),
                opt_ts(article.published_at),
                ts(article.created_at),
                ts(article.updated_at),
            ],
        )?;
        Ok(())
    }

    fn get_article(&self, id: &str) -> StorageResult<Option<Article>> {
        self.query_one(
            &format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = ?1"),
            params![id],
            RawArticle::from_row,
        )?
        .map(RawArticle::into_article)
        .transpose()
    }

    fn find_article_by_title(&self, title: &str) -> StorageResult<Option<Article>> {
        self.query_one(
            &format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE title = ?1"),
            params![title],
            RawArticle::from_row,
        )?
        .map(RawArticle::into_article)
        .transpose()
    }

    fn query_articles(
        &self,
        query: &ArticleQuery,
        now: DateTime<Utc>,
    ) -> StorageResult<(Vec<Article>, u64)> {
        let mut clauses = vec!["(scheduled_for IS NULL OR scheduled_for <= ?)"];
        let mut args = vec![SqlValue::Text(ts(now))];
        if let Some(domain) = query.domain {
            clauses.push("domain = ?");
            args.push(SqlValue::Text(domain.as_str().to_string()));
        }
        if let Some(difficulty) = query.difficulty {
            clauses.push("difficulty = ?");
            args.push(SqlValue::Text(difficulty.as_str().to_string()));
        }
        if let Some(term) = query.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            clauses.push("(title LIKE ? ESCAPE '\\' OR content LIKE ? ESCAPE '\\')");
            let pattern = like_pattern(term);
            args.push(SqlValue::Text(pattern.clone()));
            args.push(SqlValue::Text(pattern));
        }
        let filter = clauses.join(" AND ");

        let total = self.count(
            &format!("SELECT COUNT(*) FROM articles WHERE {filter}"),
            params_from_iter(args.iter()),
        )?;

        args.push(SqlValue::Integer(i64::from(query.limit)));
        args.push(SqlValue::Integer(i64::from(query.offset)));
        let rows = self.query_many(
            &format!(
                "SELECT {ARTICLE_COLUMNS} FROM articles WHERE {filter} \
                 ORDER BY published_at DESC, created_at DESC LIMIT ? OFFSET ?"
            ),
            params_from_iter(args.iter()),
            RawArticle::from_row,
        )?;
        Ok((convert(rows, RawArticle::into_article)?, total))
    }

    fn find_scheduled_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StorageResult<Option<Article>> {
        self.query_one(
            &format!(
                "SELECT {ARTICLE_COLUMNS} FROM articles \
                 WHERE scheduled_for >= ?1 AND scheduled_for < ?2 \
                 ORDER BY scheduled_for LIMIT 1"
            ),
            params![ts(start), ts(end)],
            RawArticle::from_row,
        )?
        .map(RawArticle::into_article)
        .transpose()
    }

    fn latest_published(&self) -> StorageResult<Option<Article>> {
        self.query_one(
            &format!(
                "SELECT {ARTICLE_COLUMNS} FROM articles WHERE published_at IS NOT NULL \
                 ORDER BY published_at DESC LIMIT 1"
            ),
            [],
            RawArticle::from_row,
        )?
        .map(RawArticle::into_article)
        .transpose()
    }

    fn update_article(&self, article: &Article) -> StorageResult<()> {
        let ai = opt_json(article.ai.as_ref())?;
        let metadata = to_json(&article.metadata)?;
        self.conn()?.execute(
            "UPDATE articles SET title = ?2, domain = ?3, difficulty = ?4, content = ?5, \
             word_count = ?6, ai_content = ?7, metadata = ?8, scheduled_for = ?9, \
             published_at = ?10, updated_at = ?11 WHERE id = ?1",
            params![
                article.id,
                article.title,
                article.domain.as_str(),
                article.difficulty.as_str(),
                article.content,
                article.word_count,
                ai,
                metadata,
                opt_ts(article.scheduled_for),
                opt_ts(article.published_at),
                ts(article.updated_at),
            ],
        )?;
        Ok(())
    }

    fn apply_analysis(
        &self,
        id: &str,
        domain: Domain,
        difficulty: Difficulty,
        content: &AiContent,
        now: DateTime<Utc>,
    ) -> StorageResult<bool> {
        let ai = to_json(content)?;
        let changed = self.conn()?.execute(
            "UPDATE articles SET domain = ?2, difficulty = ?3, ai_content = ?4, updated_at = ?5 \
             WHERE id = ?1",
            params![id, domain.as_str(), difficulty.as_str(), ai, ts(now)],
        )?;
        Ok(changed > 0)
    }

    fn delete_article(&self, id: &str) -> StorageResult<bool> {
        let changed = self
            .conn()?
            .execute("DELETE FROM articles WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    fn article_counts(&self, now: DateTime<Utc>) -> StorageResult<ArticleCounts> {
        Ok(ArticleCounts {
            total: self.count("SELECT COUNT(*) FROM articles", [])?,
            published: self.count(
                "SELECT COUNT(*) FROM articles WHERE published_at IS NOT NULL",
                [],
            )?,
            scheduled: self.count(
                "SELECT COUNT(*) FROM articles WHERE scheduled_for > ?1 AND published_at IS NULL",
                params![ts(now)],
            )?,
            by_domain: self.group_counts("domain")?,
            by_difficulty: self.group_counts("difficulty")?,
        })
    }

    fn insert_output(&self, output: &UserOutput) -> StorageResult<()> {
        let feedback = opt_json(output.ai_feedback.as_ref())?;
        self.conn()?.execute(
            &format!("INSERT INTO user_outputs ({OUTPUT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
            params![
                output.id,
                output.user_id,
                output.article_id,
                output.session_id,
                output.prompt,
                output.user_output,
                ts(output.submitted_at),
                feedback,
                opt_ts(output.feedback_generated_at),
            ],
        )?;
        Ok(())
    }

    fn get_output(&self, id: &str) -> StorageResult<Option<UserOutput>> {
        self.query_one(
            &format!("SELECT {OUTPUT_COLUMNS} FROM user_outputs WHERE id = ?1"),
            params![id],
            RawOutput::from_row,
        )?
        .map(RawOutput::into_output)
        .transpose()
    }

    fn list_outputs(
        &self,
        user_id: &str,
        article_id: Option<&str>,
    ) -> StorageResult<Vec<UserOutput>> {
        let rows = self.query_many(
            &format!(
                "SELECT {OUTPUT_COLUMNS} FROM user_outputs \
                 WHERE user_id = ?1 AND (?2 IS NULL OR article_id = ?2) \
                 ORDER BY submitted_at DESC"
            ),
            params![user_id, article_id],
            RawOutput::from_row,
        )?;
        convert(rows, RawOutput::into_output)
    }

    fn set_feedback(
        &self,
        id: &str,
        feedback: &Feedback,
        at: DateTime<Utc>,
    ) -> StorageResult<bool> {
        let json = to_json(feedback)?;
        let changed = self.conn()?.execute(
            "UPDATE user_outputs SET ai_feedback = ?2, feedback_generated_at = ?3 WHERE id = ?1",
            params![id, json, ts(at)],
        )?;
        Ok(changed > 0)
    }

    fn insert_memory_item(&self, item: &MemoryItem) -> StorageResult<()> {
        self.conn()?.execute(
            &format!("INSERT INTO memory_items ({MEMORY_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"),
            params![
                item.id,
                item.user_id,
                item.item_type.as_str(),
                item.content,
                item.context,
                item.source_article_id,
                item.review_count,
                opt_ts(item.last_reviewed_at),
                item.mastery_level,
                ts(item.created_at),
            ],
        )?;
        Ok(())
    }

    fn get_memory_item(&self, id: &str) -> StorageResult<Option<MemoryItem>> {
        self.query_one(
            &format!("SELECT {MEMORY_COLUMNS} FROM memory_items WHERE id = ?1"),
            params![id],
            RawMemoryItem::from_row,
        )?
        .map(RawMemoryItem::into_item)
        .transpose()
    }

    fn list_memory_items(
        &self,
        user_id: &str,
        item_type: Option<MemoryItemType>,
    ) -> StorageResult<Vec<MemoryItem>> {
        let rows = self.query_many(
            &format!(
                "SELECT {MEMORY_COLUMNS} FROM memory_items \
                 WHERE user_id = ?1 AND (?2 IS NULL OR item_type = ?2) \
                 ORDER BY created_at DESC"
            ),
            params![user_id, item_type.map(|t| t.as_str())],
            RawMemoryItem::from_row,
        )?;
        convert(rows, RawMemoryItem::into_item)
    }

    fn update_memory_item(&self, item: &MemoryItem) -> StorageResult<()> {
        self.conn()?.execute(
            "UPDATE memory_items SET review_count = ?2, last_reviewed_at = ?3, mastery_level = ?4 \
             WHERE id = ?1",
            params![
                item.id,
                item.review_count,
                opt_ts(item.last_reviewed_at),
                item.mastery_level,
            ],
        )?;
        Ok(())
    }

    fn delete_memory_item(&self, id: &str) -> StorageResult<bool> {
        let changed = self
            .conn()?
            .execute("DELETE FROM memory_items WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    fn insert_session(&self, session: &ReadingSession) -> StorageResult<()> {
        let progress = to_json(&session.progress)?;
        let answer = opt_json(session.understanding_answer.as_ref())?;
        let summary = opt_json(session.daily_summary.as_ref())?;
        self.conn()?.execute(
            &format!("INSERT INTO reading_sessions ({SESSION_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"),
            params![
                session.id,
                session.user_id,
                session.article_id,
                session.status.as_str(),
                ts(session.started_at),
                opt_ts(session.completed_at),
                progress,
                answer,
                summary,
                session.time_spent_minutes,
            ],
        )?;
        Ok(())
    }

    fn get_session(&self, id: &str) -> StorageResult<Option<ReadingSession>> {
        self.query_one(
            &format!("SELECT {SESSION_COLUMNS} FROM reading_sessions WHERE id = ?1"),
            params![id],
            RawSession::from_row,
        )?
        .map(RawSession::into_session)
        .transpose()
    }

    fn find_session(
        &self,
        user_id: &str,
        article_id: &str,
    ) -> StorageResult<Option<ReadingSession>> {
        self.query_one(
            &format!(
                "SELECT {SESSION_COLUMNS} FROM reading_sessions \
                 WHERE user_id = ?1 AND article_id = ?2 ORDER BY started_at DESC LIMIT 1"
            ),
            params![user_id, article_id],
            RawSession::from_row,
        )?
        .map(RawSession::into_session)
        .transpose()
    }

    fn list_sessions(
        &self,
        user_id: &str,
        status: Option<SessionStatus>,
    ) -> StorageResult<Vec<ReadingSession>> {
        let rows = self.query_many(
            &format!(
                "SELECT {SESSION_COLUMNS} FROM reading_sessions \
                 WHERE user_id = ?1 AND (?2 IS NULL OR status = ?2) \
                 ORDER BY started_at DESC"
            ),
            params![user_id, status.map(|s| s.as_str())],
            RawSession::from_row,
        )?;
        convert(rows, RawSession::into_session)
    }

    fn update_session(&self, session: &ReadingSession) -> StorageResult<()> {
        let progress = to_json(&session.progress)?;
        let answer = opt_json(session.understanding_answer.as_ref())?;
        let summary = opt_json(session.daily_summary.as_ref())?;
        self.conn()?.execute(
            "UPDATE reading_sessions SET status = ?2, completed_at = ?3, progress = ?4, \
             understanding_answer = ?5, daily_summary = ?6, time_spent_minutes = ?7 WHERE id = ?1",
            params![
                session.id,
                session.status.as_str(),
                opt_ts(session.completed_at),
                progress,
                answer,
                summary,
                session.time_spent_minutes,
            ],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::core::{ArticleMetadata, ReadingMap, SessionProgress};

    fn storage() -> SqliteStorage {
        SqliteStorage::in_memory().unwrap_or_else(|_| unreachable!())
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, 9, 0, 0)
            .single()
            .unwrap_or_else(|| unreachable!())
    }

    fn article(id: &str, title: &str, domain: Domain) -> Article {
        Article {
            id: id.into(),
            title: title.into(),
            domain,
            difficulty: Difficulty::Intermediate,
            content: format!("{title} body.\n\nSecond paragraph."),
            word_count: 120,
            ai: None,
            metadata: ArticleMetadata {
                source_url: None,
                author: Some("Ada".into()),
                tags: vec!["tag".into()],
            },
            scheduled_for: None,
            published_at: None,
            created_at: at(1),
            updated_at: at(1),
        }
    }

    fn ai_content() -> AiContent {
        AiContent {
            reading_map: ReadingMap {
                core_question: "q".into(),
                main_conclusion: "c".into(),
                argument_structure: vec!["s".into()],
            },
            key_paragraphs: Vec::new(),
            language_breakdown: Vec::new(),
            understanding_questions: Vec::new(),
        }
    }

    #[test]
    fn test_article_round_trip() {
        let storage = storage();
        let mut original = article("a1", "Rates", Domain::Finance);
        original.scheduled_for = Some(at(5));
        original.created_at = Utc::now();
        storage
            .insert_article(&original)
            .unwrap_or_else(|_| unreachable!());

        let loaded = storage.get_article("a1").unwrap_or_default();
        assert_eq!(loaded, Some(original));
        assert!(storage.get_article("missing").unwrap_or_default().is_none());
        assert!(
            storage
                .find_article_by_title("Rates")
                .unwrap_or_default()
                .is_some()
        );
    }

    #[test]
    fn test_duplicate_title_violates_constraint() {
        let storage = storage();
        storage
            .insert_article(&article("a1", "Same", Domain::Ai))
            .unwrap_or_else(|_| unreachable!());
        let err = storage.insert_article(&article("a2", "Same", Domain::Ai));
        assert!(matches!(err, Err(StorageError::Sqlite(_))));
    }

    #[test]
    fn test_query_filters_and_orders() {
        let storage = storage();
        let mut old = article("a1", "Old AI piece", Domain::Ai);
        old.published_at = Some(at(2));
        let mut new = article("a2", "New AI piece", Domain::Ai);
        new.published_at = Some(at(4));
        let mut future = article("a3", "Future AI piece", Domain::Ai);
        future.scheduled_for = Some(at(20));
        let finance = article("a4", "Budget 100% explained", Domain::Finance);
        for a in [&old, &new, &future, &finance] {
            storage.insert_article(a).unwrap_or_else(|_| unreachable!());
        }

        let query = ArticleQuery {
            domain: Some(Domain::Ai),
            ..ArticleQuery::default()
        };
        let (page, total) = storage
            .query_articles(&query, at(10))
            .unwrap_or_default();
        assert_eq!(total, 2);
        let ids: Vec<&str> = page.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a2", "a1"]);

        let query = ArticleQuery {
            search: Some("100%".into()),
            ..ArticleQuery::default()
        };
        let (page, total) = storage
            .query_articles(&query, at(10))
            .unwrap_or_default();
        assert_eq!(total, 1);
        assert_eq!(page[0].id, "a4");

        let query = ArticleQuery {
            offset: 1,
            limit: 1,
            ..ArticleQuery::default()
        };
        let (page, total) = storage
            .query_articles(&query, at(10))
            .unwrap_or_default();
        assert_eq!(total, 3);
        assert_eq!(page.len(), 1);
    }

    #[test]
    fn test_scheduled_and_latest_published() {
        let storage = storage();
        let mut today = article("a1", "Today", Domain::Ai);
        today.scheduled_for = Some(at(10) + Duration::hours(3));
        let mut published = article("a2", "Published", Domain::Ai);
        published.published_at = Some(at(3));
        storage.insert_article(&today).unwrap_or_else(|_| unreachable!());
        storage
            .insert_article(&published)
            .unwrap_or_else(|_| unreachable!());

        let found = storage
            .find_scheduled_between(at(10), at(11))
            .unwrap_or_default();
        assert_eq!(found.map(|a| a.id), Some("a1".to_string()));
        assert!(
            storage
                .find_scheduled_between(at(11), at(12))
                .unwrap_or_default()
                .is_none()
        );
        let latest = storage.latest_published().unwrap_or_default();
        assert_eq!(latest.map(|a| a.id), Some("a2".to_string()));
    }

    #[test]
    fn test_apply_analysis_replaces_fields() {
        let storage = storage();
        storage
            .insert_article(&article("a1", "T", Domain::Finance))
            .unwrap_or_else(|_| unreachable!());

        let applied = storage
            .apply_analysis("a1", Domain::Ai, Difficulty::Advanced, &ai_content(), at(9))
            .unwrap_or_default();
        assert!(applied);
        let loaded = storage
            .get_article("a1")
            .unwrap_or_default()
            .unwrap_or_else(|| unreachable!());
        assert_eq!(loaded.domain, Domain::Ai);
        assert_eq!(loaded.difficulty, Difficulty::Advanced);
        assert_eq!(loaded.ai, Some(ai_content()));
        assert_eq!(loaded.updated_at, at(9));

        let missing = storage
            .apply_analysis("nope", Domain::Ai, Difficulty::Advanced, &ai_content(), at(9))
            .unwrap_or(true);
        assert!(!missing);
    }

    #[test]
    fn test_article_counts() {
        let storage = storage();
        let mut published = article("a1", "P", Domain::Ai);
        published.published_at = Some(at(1));
        let mut scheduled = article("a2", "S", Domain::Ai);
        scheduled.scheduled_for = Some(at(20));
        let other = article("a3", "O", Domain::Finance);
        for a in [&published, &scheduled, &other] {
            storage.insert_article(a).unwrap_or_else(|_| unreachable!());
        }

        let counts = storage.article_counts(at(10)).unwrap_or_default();
        assert_eq!(counts.total, 3);
        assert_eq!(counts.published, 1);
        assert_eq!(counts.scheduled, 1);
        assert_eq!(
            counts.by_domain,
            vec![
                GroupCount {
                    value: "AI".into(),
                    count: 2
                },
                GroupCount {
                    value: "finance".into(),
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn test_session_round_trip_and_lookup() {
        let storage = storage();
        let mut session = ReadingSession {
            id: "s1".into(),
            user_id: "u1".into(),
            article_id: "a1".into(),
            status: SessionStatus::InProgress,
            started_at: at(1),
            completed_at: None,
            progress: SessionProgress::default(),
            understanding_answer: None,
            daily_summary: None,
            time_spent_minutes: 0,
        };
        storage
            .insert_session(&session)
            .unwrap_or_else(|_| unreachable!());

        session.status = SessionStatus::Completed;
        session.completed_at = Some(at(2));
        session.progress.key_paragraphs_viewed = vec![0, 2];
        session.time_spent_minutes = 14;
        storage
            .update_session(&session)
            .unwrap_or_else(|_| unreachable!());

        let found = storage.find_session("u1", "a1").unwrap_or_default();
        assert_eq!(found, Some(session));
        let completed = storage
            .list_sessions("u1", Some(SessionStatus::Completed))
            .unwrap_or_default();
        assert_eq!(completed.len(), 1);
        let abandoned = storage
            .list_sessions("u1", Some(SessionStatus::Abandoned))
            .unwrap_or_default();
        assert!(abandoned.is_empty());
    }

    #[test]
    fn test_memory_items_filter_by_type() {
        let storage = storage();
        for (id, item_type) in [
            ("m1", MemoryItemType::Concept),
            ("m2", MemoryItemType::Expression),
        ] {
            let item = MemoryItem {
                id: id.into(),
                user_id: "u1".into(),
                item_type,
                content: "c".into(),
                context: "ctx".into(),
                source_article_id: "a1".into(),
                review_count: 0,
                last_reviewed_at: None,
                mastery_level: 0.0,
                created_at: at(1),
            };
            storage
                .insert_memory_item(&item)
                .unwrap_or_else(|_| unreachable!());
        }
        let concepts = storage
            .list_memory_items("u1", Some(MemoryItemType::Concept))
            .unwrap_or_default();
        assert_eq!(concepts.len(), 1);
        assert_eq!(concepts[0].id, "m1");
        assert_eq!(
            storage.list_memory_items("u1", None).unwrap_or_default().len(),
            2
        );
        assert!(storage.delete_memory_item("m1").unwrap_or_default());
        assert!(!storage.delete_memory_item("m1").unwrap_or(true));
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("100%_a\\b"), "%100\\%\\_a\\\\b%");
    }
}
