use super::StorageError;
use chrono::{DateTime, Utc};
use nps_common::model::token::{ResponseToken, TokenContext};
use rusqlite::{params, Connection, OptionalExtension, Row};

const COLUMNS: &str = "token, send_id, survey_id, survey_title, question, recipient_id, recipient_name, \
    contact, schedule_id, used, used_at, created_at, expires_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<ResponseToken> {
    Ok(ResponseToken {
        token: row.get(0)?,
        send_id: row.get(1)?,
        context: TokenContext {
            survey_id: row.get(2)?,
            survey_title: row.get(3)?,
            question: row.get(4)?,
            recipient_id: row.get(5)?,
            recipient_name: row.get(6)?,
            contact: row.get(7)?,
            schedule_id: row.get(8)?,
        },
        used: row.get(9)?,
        used_at: row.get(10)?,
        created_at: row.get(11)?,
        expires_at: row.get(12)?,
    })
}

pub fn insert(conn: &Connection, token: &ResponseToken) -> Result<(), StorageError> {
    let sql = format!(
        "INSERT INTO response_tokens ({COLUMNS}) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
    );
    let ctx = &token.context;
    conn.execute(
        &sql,
        params![
            token.token,
            token.send_id,
            ctx.survey_id,
            ctx.survey_title,
            ctx.question,
            ctx.recipient_id,
            ctx.recipient_name,
            ctx.contact,
            ctx.schedule_id,
            token.used,
            token.used_at,
            token.created_at,
            token.expires_at,
        ],
    )?;
    Ok(())
}

pub fn get(conn: &Connection, token: &str) -> Result<Option<ResponseToken>, StorageError> {
    let sql = format!("SELECT {COLUMNS} FROM response_tokens WHERE token = ?1");
    Ok(conn.query_row(&sql, params![token], from_row).optional()?)
}

/// Compare-and-swap on the `used` flag. Exactly one caller gets `true`.
pub fn mark_used(conn: &Connection, token: &str, at: DateTime<Utc>) -> Result<bool, StorageError> {
    let changed = conn.execute(
        "UPDATE response_tokens SET used = 1, used_at = ?2 WHERE token = ?1 AND used = 0",
        params![token, at],
    )?;
    Ok(changed == 1)
}
