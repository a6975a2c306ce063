//! CSV import of the recipients directory.
//!
//! The upload is read fully into memory, parsed with a header row and upserted
//! row by row. Rows without an id or name are counted as skipped; rows with
//! an unusable phone number are kept but stored without a phone, which makes
//! them non-contactable for dispatch.

use super::normalize_phone;
use crate::db;
use crate::error::ServiceError;
use crate::state::AppState;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures_util::StreamExt;
use log::{info, warn};
use nps_common::model::recipient::Recipient;
use serde::{Deserialize, Serialize};

/// Largest accepted upload.
const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Deserialize)]
struct CsvRow {
    id: Option<String>,
    name: Option<String>,
    phone: Option<String>,
    department: Option<String>,
    active: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
    /// Imported rows whose phone number could not be normalised.
    pub without_phone: usize,
}

pub(crate) async fn process(
    state: web::Data<AppState>,
    mut payload: Multipart,
) -> Result<HttpResponse, ServiceError> {
    let mut file: Option<Vec<u8>> = None;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| ServiceError::BadRequest(e.to_string()))?;
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));
        if name.as_deref() != Some("file") {
            // Drain unrelated parts.
            while let Some(chunk) = field.next().await {
                chunk.map_err(|e| ServiceError::BadRequest(e.to_string()))?;
            }
            continue;
        }

        let mut buf = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| ServiceError::BadRequest(e.to_string()))?;
            if buf.len() + chunk.len() > MAX_UPLOAD_BYTES {
                return Err(ServiceError::BadRequest("CSV file is too large".into()));
            }
            buf.extend_from_slice(&chunk);
        }
        file = Some(buf);
    }

    let bytes = file.ok_or_else(|| ServiceError::BadRequest("missing 'file' field".into()))?;
    let summary = import_csv(&state, &bytes)?;
    Ok(HttpResponse::Ok().json(summary))
}

/// Parses `bytes` as CSV and upserts every valid row.
pub fn import_csv(state: &AppState, bytes: &[u8]) -> Result<ImportSummary, ServiceError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| ServiceError::BadRequest(format!("unreadable CSV header: {}", e)))?
        .clone();
    for required in ["id", "name", "phone"] {
        if !headers.iter().any(|h| h == required) {
            return Err(ServiceError::BadRequest(format!(
                "CSV header must contain '{}'",
                required
            )));
        }
    }

    let conn = state.db.connect()?;
    let mut summary = ImportSummary::default();

    for (line, row) in reader.deserialize::<CsvRow>().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warn!("Skipping recipients CSV row {}: {}", line + 2, e);
                summary.skipped += 1;
                continue;
            }
        };
        let Some(recipient) = to_recipient(row) else {
            summary.skipped += 1;
            continue;
        };
        if recipient.phone.is_none() {
            summary.without_phone += 1;
        }
        db::recipients::upsert(&conn, &recipient)?;
        summary.imported += 1;
    }

    info!(
        "Recipients import: {} imported, {} skipped, {} without phone",
        summary.imported, summary.skipped, summary.without_phone
    );
    Ok(summary)
}

fn to_recipient(row: CsvRow) -> Option<Recipient> {
    let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
    let id = non_empty(row.id)?;
    let name = non_empty(row.name)?;
    let active = match row.active.as_deref().map(str::to_ascii_lowercase).as_deref() {
        Some("0" | "false" | "no" | "inactive") => false,
        _ => true,
    };
    Some(Recipient {
        id,
        name,
        phone: row.phone.as_deref().and_then(normalize_phone),
        department: non_empty(row.department),
        active,
    })
}
