//! SQLite persistence.
//!
//! Every operation opens its own connection against the configured file, so
//! the service holds no in-process state and several processes may share one
//! database. Atomic steps (token consumption, status updates, scheduler
//! claims) are expressed as conditional `UPDATE`s checked by affected rows.

pub mod campaigns;
pub mod recipients;
pub mod responses;
pub mod sends;
pub mod surveys;
pub mod tokens;

use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS surveys (
    id          TEXT PRIMARY KEY,
    title       TEXT NOT NULL,
    description TEXT,
    question    TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS recipients (
    id         TEXT PRIMARY KEY,
    name       TEXT NOT NULL,
    phone      TEXT,
    department TEXT,
    active     INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS campaigns (
    id                 TEXT PRIMARY KEY,
    survey_id          TEXT NOT NULL REFERENCES surveys(id),
    name               TEXT NOT NULL,
    description        TEXT,
    target_users       TEXT NOT NULL,
    target_filter      TEXT,
    schedule_type      TEXT NOT NULL,
    scheduled_date     TEXT,
    recurrence_pattern TEXT,
    status             TEXT NOT NULL,
    next_execution_at  TEXT,
    last_executed_at   TEXT,
    success_count      INTEGER NOT NULL DEFAULT 0,
    created_by         TEXT,
    created_at         TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sends (
    id                  TEXT PRIMARY KEY,
    campaign_id         TEXT NOT NULL REFERENCES campaigns(id),
    survey_id           TEXT NOT NULL,
    recipient_id        TEXT NOT NULL,
    contact             TEXT NOT NULL,
    status              TEXT NOT NULL,
    provider_message_id TEXT,
    token               TEXT NOT NULL,
    response_url        TEXT NOT NULL,
    error_message       TEXT,
    sent_at             TEXT,
    delivered_at        TEXT,
    read_at             TEXT,
    metadata            TEXT NOT NULL DEFAULT '{}',
    created_at          TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_sends_provider_message_id ON sends(provider_message_id);
CREATE INDEX IF NOT EXISTS idx_sends_campaign_id ON sends(campaign_id);

CREATE TABLE IF NOT EXISTS response_tokens (
    token          TEXT PRIMARY KEY,
    send_id        TEXT NOT NULL UNIQUE,
    survey_id      TEXT NOT NULL,
    survey_title   TEXT NOT NULL,
    question       TEXT NOT NULL,
    recipient_id   TEXT NOT NULL,
    recipient_name TEXT NOT NULL,
    contact        TEXT NOT NULL,
    schedule_id    TEXT NOT NULL,
    used           INTEGER NOT NULL DEFAULT 0,
    used_at        TEXT,
    created_at     TEXT NOT NULL,
    expires_at     TEXT
);

CREATE TABLE IF NOT EXISTS responses (
    id             TEXT PRIMARY KEY,
    survey_id      TEXT NOT NULL,
    recipient_name TEXT NOT NULL,
    contact        TEXT NOT NULL,
    score          INTEGER NOT NULL CHECK (score BETWEEN 0 AND 10),
    comment        TEXT,
    token          TEXT NOT NULL UNIQUE,
    responded_at   TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_responses_survey_id ON responses(survey_id);
"#;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("corrupt stored value: {0}")]
    Corrupt(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Corrupt(err.to_string())
    }
}

/// Handle to the SQLite database file. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    /// Opens (creating if needed) the database at `path` and applies the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db = Database {
            path: path.as_ref().to_path_buf(),
        };
        let conn = db.connect()?;
        // journal_mode returns the resulting mode as a row.
        conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))?;
        conn.execute_batch(SCHEMA)?;
        Ok(db)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens a new connection with a busy timeout so concurrent writers wait
    /// instead of failing immediately.
    pub fn connect(&self) -> Result<Connection, StorageError> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(conn)
    }
}

/// Parses an enum label stored as TEXT in column `idx`.
pub(crate) fn parse_label<T>(idx: usize, raw: String) -> rusqlite::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Parses a JSON document stored as TEXT in column `idx`.
pub(crate) fn parse_json<T>(idx: usize, raw: &str) -> rusqlite::Result<T>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_str(raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
