use super::StorageError;
use nps_common::model::survey::Survey;
use rusqlite::{params, Connection, OptionalExtension, Row};

const COLUMNS: &str = "id, title, description, question, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Survey> {
    Ok(Survey {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        question: row.get(3)?,
        created_at: row.get(4)?,
    })
}

pub fn insert(conn: &Connection, survey: &Survey) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO surveys (id, title, description, question, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            survey.id,
            survey.title,
            survey.description,
            survey.question,
            survey.created_at
        ],
    )?;
    Ok(())
}

pub fn get(conn: &Connection, id: &str) -> Result<Option<Survey>, StorageError> {
    let sql = format!("SELECT {COLUMNS} FROM surveys WHERE id = ?1");
    Ok(conn.query_row(&sql, params![id], from_row).optional()?)
}

pub fn list(conn: &Connection) -> Result<Vec<Survey>, StorageError> {
    let sql = format!("SELECT {COLUMNS} FROM surveys ORDER BY created_at DESC");
    let mut stmt = conn.prepare(&sql)?;
    let surveys = stmt
        .query_map([], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(surveys)
}
