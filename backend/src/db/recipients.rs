use super::StorageError;
use nps_common::model::recipient::Recipient;
use rusqlite::{params, Connection, Row};

const COLUMNS: &str = "id, name, phone, department, active";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Recipient> {
    Ok(Recipient {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        department: row.get(3)?,
        active: row.get(4)?,
    })
}

/// Inserts or replaces a directory entry keyed by id.
pub fn upsert(conn: &Connection, recipient: &Recipient) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO recipients (id, name, phone, department, active) VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(id) DO UPDATE SET
             name = excluded.name,
             phone = excluded.phone,
             department = excluded.department,
             active = excluded.active",
        params![
            recipient.id,
            recipient.name,
            recipient.phone,
            recipient.department,
            recipient.active
        ],
    )?;
    Ok(())
}

pub fn list(conn: &Connection) -> Result<Vec<Recipient>, StorageError> {
    let sql = format!("SELECT {COLUMNS} FROM recipients ORDER BY name");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Looks up the given ids, preserving the requested order. Unknown ids are
/// left out.
pub fn get_many(conn: &Connection, ids: &[String]) -> Result<Vec<Recipient>, StorageError> {
    let sql = format!("SELECT {COLUMNS} FROM recipients WHERE id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let mut found = Vec::with_capacity(ids.len());
    for id in ids {
        let mut rows = stmt.query_map(params![id], from_row)?;
        if let Some(recipient) = rows.next() {
            found.push(recipient?);
        }
    }
    Ok(found)
}

/// Active recipients of a department (case-insensitive match).
pub fn active_in_department(
    conn: &Connection,
    department: &str,
) -> Result<Vec<Recipient>, StorageError> {
    let sql = format!(
        "SELECT {COLUMNS} FROM recipients
         WHERE active = 1 AND lower(department) = lower(?1)
         ORDER BY name"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![department.trim()], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
