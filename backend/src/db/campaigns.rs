use super::{parse_json, parse_label, StorageError};
use chrono::{DateTime, Utc};
use nps_common::model::campaign::{Campaign, CampaignStatus, RecipientFilter};
use rusqlite::{params, Connection, OptionalExtension, Row};

const COLUMNS: &str = "id, survey_id, name, description, target_users, target_filter, schedule_type, \
    scheduled_date, recurrence_pattern, status, next_execution_at, last_executed_at, success_count, \
    created_by, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Campaign> {
    let target_users: String = row.get(4)?;
    let target_filter: Option<String> = row.get(5)?;
    Ok(Campaign {
        id: row.get(0)?,
        survey_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        target_users: parse_json(4, &target_users)?,
        target_filter: target_filter
            .map(|raw| parse_json::<RecipientFilter>(5, &raw))
            .transpose()?,
        schedule_type: parse_label(6, row.get(6)?)?,
        scheduled_date: row.get(7)?,
        recurrence_pattern: row.get(8)?,
        status: parse_label(9, row.get(9)?)?,
        next_execution_at: row.get(10)?,
        last_executed_at: row.get(11)?,
        success_count: row.get(12)?,
        created_by: row.get(13)?,
        created_at: row.get(14)?,
    })
}

pub fn insert(conn: &Connection, campaign: &Campaign) -> Result<(), StorageError> {
    let target_users = serde_json::to_string(&campaign.target_users)?;
    let target_filter = campaign
        .target_filter
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;
    let sql = format!(
        "INSERT INTO campaigns ({COLUMNS}) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
    );
    conn.execute(
        &sql,
        params![
            campaign.id,
            campaign.survey_id,
            campaign.name,
            campaign.description,
            target_users,
            target_filter,
            campaign.schedule_type.as_str(),
            campaign.scheduled_date,
            campaign.recurrence_pattern,
            campaign.status.as_str(),
            campaign.next_execution_at,
            campaign.last_executed_at,
            campaign.success_count,
            campaign.created_by,
            campaign.created_at,
        ],
    )?;
    Ok(())
}

pub fn get(conn: &Connection, id: &str) -> Result<Option<Campaign>, StorageError> {
    let sql = format!("SELECT {COLUMNS} FROM campaigns WHERE id = ?1");
    Ok(conn.query_row(&sql, params![id], from_row).optional()?)
}

/// All campaigns, newest first.
pub fn list(conn: &Connection) -> Result<Vec<Campaign>, StorageError> {
    let sql = format!("SELECT {COLUMNS} FROM campaigns ORDER BY created_at DESC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Active scheduled/recurring campaigns whose next execution is due.
pub fn due(conn: &Connection, now: DateTime<Utc>) -> Result<Vec<Campaign>, StorageError> {
    let sql = format!(
        "SELECT {COLUMNS} FROM campaigns \
         WHERE status = 'active' \
           AND schedule_type IN ('scheduled', 'recurring') \
           AND next_execution_at IS NOT NULL"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt
        .query_map([], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.retain(|c| c.next_execution_at.is_some_and(|at| at <= now));
    rows.sort_by_key(|c| c.next_execution_at);
    Ok(rows)
}

/// Claims a due execution by clearing `next_execution_at` if it still holds
/// the value the caller observed. Returns false when another worker won.
pub fn claim_execution(
    conn: &Connection,
    id: &str,
    observed_next: DateTime<Utc>,
) -> Result<bool, StorageError> {
    let changed = conn.execute(
        "UPDATE campaigns SET next_execution_at = NULL \
         WHERE id = ?1 AND status = 'active' AND next_execution_at = ?2",
        params![id, observed_next],
    )?;
    Ok(changed == 1)
}

/// Soft status change guarded by the status the caller observed.
pub fn update_status(
    conn: &Connection,
    id: &str,
    from: CampaignStatus,
    to: CampaignStatus,
) -> Result<bool, StorageError> {
    let changed = conn.execute(
        "UPDATE campaigns SET status = ?3 WHERE id = ?1 AND status = ?2",
        params![id, from.as_str(), to.as_str()],
    )?;
    Ok(changed == 1)
}

/// Puts back a claimed execution time that was never used.
pub fn restore_next_execution(
    conn: &Connection,
    id: &str,
    at: DateTime<Utc>,
) -> Result<bool, StorageError> {
    let changed = conn.execute(
        "UPDATE campaigns SET next_execution_at = ?2 \
         WHERE id = ?1 AND next_execution_at IS NULL AND status != 'completed'",
        params![id, at],
    )?;
    Ok(changed == 1)
}

/// Bookkeeping after an execution: success counter, last run, next run and
/// status. The next run is stored whatever the status, so a campaign paused
/// meanwhile resumes on schedule; a paused campaign keeps `paused` unless the
/// run finished it.
pub fn record_execution(
    conn: &Connection,
    id: &str,
    sent: i64,
    executed_at: DateTime<Utc>,
    next_execution_at: Option<DateTime<Utc>>,
    status: CampaignStatus,
) -> Result<(), StorageError> {
    conn.execute(
        "UPDATE campaigns SET \
             success_count = success_count + ?2, \
             last_executed_at = ?3, \
             next_execution_at = ?4, \
             status = CASE WHEN status = 'active' OR ?5 = 'completed' THEN ?5 ELSE status END \
         WHERE id = ?1",
        params![id, sent, executed_at, next_execution_at, status.as_str()],
    )?;
    Ok(())
}

/// Bookkeeping for manual re-sends: counter and last run only.
pub fn record_manual_execution(
    conn: &Connection,
    id: &str,
    sent: i64,
    executed_at: DateTime<Utc>,
) -> Result<(), StorageError> {
    conn.execute(
        "UPDATE campaigns SET success_count = success_count + ?2, last_executed_at = ?3 WHERE id = ?1",
        params![id, sent, executed_at],
    )?;
    Ok(())
}
