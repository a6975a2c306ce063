use super::StorageError;
use nps_common::model::response::NpsResponse;
use nps_common::model::stats::NpsResults;
use rusqlite::{params, Connection, Row};

const COLUMNS: &str = "id, survey_id, recipient_name, contact, score, comment, token, responded_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<NpsResponse> {
    Ok(NpsResponse {
        id: row.get(0)?,
        survey_id: row.get(1)?,
        recipient_name: row.get(2)?,
        contact: row.get(3)?,
        score: row.get(4)?,
        comment: row.get(5)?,
        token: row.get(6)?,
        responded_at: row.get(7)?,
    })
}

pub fn insert(conn: &Connection, response: &NpsResponse) -> Result<(), StorageError> {
    let sql = format!("INSERT INTO responses ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)");
    conn.execute(
        &sql,
        params![
            response.id,
            response.survey_id,
            response.recipient_name,
            response.contact,
            response.score,
            response.comment,
            response.token,
            response.responded_at,
        ],
    )?;
    Ok(())
}

/// Responses of a survey, newest first.
pub fn list_by_survey(conn: &Connection, survey_id: &str) -> Result<Vec<NpsResponse>, StorageError> {
    let sql = format!("SELECT {COLUMNS} FROM responses WHERE survey_id = ?1 ORDER BY responded_at DESC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![survey_id], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn count(conn: &Connection) -> Result<i64, StorageError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM responses", [], |row| row.get(0))?)
}

/// Bucket counts and average for one survey.
pub fn nps_results(conn: &Connection, survey_id: &str) -> Result<NpsResults, StorageError> {
    let (responses, promoters, passives, detractors, average): (i64, i64, i64, i64, Option<f64>) =
        conn.query_row(
            "SELECT COUNT(*), \
                    COALESCE(SUM(CASE WHEN score >= 9 THEN 1 ELSE 0 END), 0), \
                    COALESCE(SUM(CASE WHEN score BETWEEN 7 AND 8 THEN 1 ELSE 0 END), 0), \
                    COALESCE(SUM(CASE WHEN score <= 6 THEN 1 ELSE 0 END), 0), \
                    AVG(score) \
             FROM responses WHERE survey_id = ?1",
            params![survey_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
        )?;

    let nps = (responses > 0).then(|| {
        (100.0 * (promoters - detractors) as f64 / responses as f64).round() as i64
    });

    Ok(NpsResults {
        survey_id: survey_id.to_string(),
        responses,
        promoters,
        passives,
        detractors,
        nps,
        average_score: average.map(|avg| (avg * 10.0).round() / 10.0),
    })
}
