//! Database schema and migrations.

use rusqlite::Connection;

use crate::error::StorageError;

/// Schema version written to `PRAGMA user_version`.
pub const SCHEMA_VERSION: i64 = 1;

/// Initial schema. Nested structures are JSON text columns; timestamps are
/// RFC 3339 UTC strings with a fixed width, so they order lexically.
const SCHEMA_V1: &str = r"
CREATE TABLE IF NOT EXISTS articles (
    id            TEXT PRIMARY KEY,
    title         TEXT NOT NULL UNIQUE,
    domain        TEXT NOT NULL,
    difficulty    TEXT NOT NULL,
    content       TEXT NOT NULL,
    word_count    INTEGER NOT NULL,
    ai_content    TEXT,
    metadata      TEXT NOT NULL,
    scheduled_for TEXT,
    published_at  TEXT,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_articles_scheduled ON articles(scheduled_for);
CREATE INDEX IF NOT EXISTS idx_articles_published ON articles(published_at DESC, created_at DESC);

CREATE TABLE IF NOT EXISTS user_outputs (
    id                    TEXT PRIMARY KEY,
    user_id               TEXT NOT NULL,
    article_id            TEXT NOT NULL,
    session_id            TEXT,
    prompt                TEXT NOT NULL,
    user_output           TEXT NOT NULL,
    submitted_at          TEXT NOT NULL,
    ai_feedback           TEXT,
    feedback_generated_at TEXT
);
CREATE INDEX IF NOT EXISTS idx_user_outputs_user ON user_outputs(user_id, submitted_at DESC);

CREATE TABLE IF NOT EXISTS memory_items (
    id                TEXT PRIMARY KEY,
    user_id           TEXT NOT NULL,
    item_type         TEXT NOT NULL,
    content           TEXT NOT NULL,
    context           TEXT NOT NULL,
    source_article_id TEXT NOT NULL,
    review_count      INTEGER NOT NULL DEFAULT 0,
    last_reviewed_at  TEXT,
    mastery_level     REAL NOT NULL DEFAULT 0,
    created_at        TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_memory_items_user ON memory_items(user_id, created_at DESC);

CREATE TABLE IF NOT EXISTS reading_sessions (
    id                   TEXT PRIMARY KEY,
    user_id              TEXT NOT NULL,
    article_id           TEXT NOT NULL,
    status               TEXT NOT NULL,
    started_at           TEXT NOT NULL,
    completed_at         TEXT,
    progress             TEXT NOT NULL,
    understanding_answer TEXT,
    daily_summary        TEXT,
    time_spent_minutes   INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_reading_sessions_user ON reading_sessions(user_id, started_at DESC);
CREATE INDEX IF NOT EXISTS idx_reading_sessions_article ON reading_sessions(user_id, article_id);
";

/// Brings the database up to [`SCHEMA_VERSION`].
///
/// # Errors
///
/// Returns [`StorageError::Sqlite`] on failure, or
/// [`StorageError::Corrupt`] if the database is newer than this build.
pub fn migrate(conn: &Connection) -> Result<(), StorageError> {
    let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    if version > SCHEMA_VERSION {
        return Err(StorageError::Corrupt {
            message: format!(
                "database schema version {version} is newer than supported version {SCHEMA_VERSION}"
            ),
        });
    }
    if version < 1 {
        conn.execute_batch(SCHEMA_V1)?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    }
    Ok(())
}
