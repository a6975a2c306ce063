use super::{parse_json, parse_label, StorageError};
use chrono::{DateTime, Utc};
use nps_common::model::send::{SendRecord, SendStatus};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;

const COLUMNS: &str = "id, campaign_id, survey_id, recipient_id, contact, status, provider_message_id, \
    token, response_url, error_message, sent_at, delivered_at, read_at, metadata, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<SendRecord> {
    let metadata: String = row.get(13)?;
    Ok(SendRecord {
        id: row.get(0)?,
        campaign_id: row.get(1)?,
        survey_id: row.get(2)?,
        recipient_id: row.get(3)?,
        contact: row.get(4)?,
        status: parse_label(5, row.get(5)?)?,
        provider_message_id: row.get(6)?,
        token: row.get(7)?,
        response_url: row.get(8)?,
        error_message: row.get(9)?,
        sent_at: row.get(10)?,
        delivered_at: row.get(11)?,
        read_at: row.get(12)?,
        metadata: parse_json(13, &metadata)?,
        created_at: row.get(14)?,
    })
}

pub fn insert(conn: &Connection, send: &SendRecord) -> Result<(), StorageError> {
    let sql = format!(
        "INSERT INTO sends ({COLUMNS}) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
    );
    conn.execute(
        &sql,
        params![
            send.id,
            send.campaign_id,
            send.survey_id,
            send.recipient_id,
            send.contact,
            send.status.as_str(),
            send.provider_message_id,
            send.token,
            send.response_url,
            send.error_message,
            send.sent_at,
            send.delivered_at,
            send.read_at,
            send.metadata.to_string(),
            send.created_at,
        ],
    )?;
    Ok(())
}

pub fn get(conn: &Connection, id: &str) -> Result<Option<SendRecord>, StorageError> {
    let sql = format!("SELECT {COLUMNS} FROM sends WHERE id = ?1");
    Ok(conn.query_row(&sql, params![id], from_row).optional()?)
}

pub fn find_by_provider_message_id(
    conn: &Connection,
    message_id: &str,
) -> Result<Option<SendRecord>, StorageError> {
    let sql = format!("SELECT {COLUMNS} FROM sends WHERE provider_message_id = ?1 LIMIT 1");
    Ok(conn.query_row(&sql, params![message_id], from_row).optional()?)
}

/// Sends of a campaign, newest first.
pub fn list_by_campaign(conn: &Connection, campaign_id: &str) -> Result<Vec<SendRecord>, StorageError> {
    let sql = format!("SELECT {COLUMNS} FROM sends WHERE campaign_id = ?1 ORDER BY created_at DESC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![campaign_id], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Records the provider's acceptance of a pending send.
pub fn mark_sent(
    conn: &Connection,
    id: &str,
    provider_message_id: &str,
    at: DateTime<Utc>,
) -> Result<bool, StorageError> {
    let changed = conn.execute(
        "UPDATE sends SET status = 'sent', provider_message_id = ?2, sent_at = ?3 \
         WHERE id = ?1 AND status = 'pending'",
        params![id, provider_message_id, at],
    )?;
    Ok(changed == 1)
}

/// Records a delivery failure on a pending send.
pub fn mark_failed(conn: &Connection, id: &str, error: &str) -> Result<bool, StorageError> {
    let changed = conn.execute(
        "UPDATE sends SET status = 'failed', error_message = ?2 WHERE id = ?1 AND status = 'pending'",
        params![id, error],
    )?;
    Ok(changed == 1)
}

/// Moves a send from `from` to `to`, stamping the timestamp that belongs to
/// `to` when it is not already set. Guarded by `from` so racing updates
/// cannot regress the status.
pub fn advance_status(
    conn: &Connection,
    id: &str,
    from: SendStatus,
    to: SendStatus,
    at: DateTime<Utc>,
) -> Result<bool, StorageError> {
    let changed = match to {
        SendStatus::Failed | SendStatus::Pending => conn.execute(
            "UPDATE sends SET status = ?3, \
                 error_message = COALESCE(error_message, 'failure reported by provider') \
             WHERE id = ?1 AND status = ?2",
            params![id, from.as_str(), to.as_str()],
        )?,
        _ => {
            let stamp = match to {
                SendStatus::Sent => "sent_at = COALESCE(sent_at, ?4)",
                SendStatus::Delivered => "delivered_at = COALESCE(delivered_at, ?4)",
                // A read receipt implies delivery.
                _ => "read_at = COALESCE(read_at, ?4), delivered_at = COALESCE(delivered_at, ?4)",
            };
            let sql = format!("UPDATE sends SET status = ?3, {stamp} WHERE id = ?1 AND status = ?2");
            conn.execute(&sql, params![id, from.as_str(), to.as_str(), at])?
        }
    };
    Ok(changed == 1)
}

/// Number of sends per status.
pub fn count_by_status(conn: &Connection) -> Result<HashMap<SendStatus, i64>, StorageError> {
    let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM sends GROUP BY status")?;
    let counts = stmt
        .query_map([], |row| {
            Ok((parse_label::<SendStatus>(0, row.get(0)?)?, row.get::<_, i64>(1)?))
        })?
        .collect::<Result<HashMap<_, _>, _>>()?;
    Ok(counts)
}
