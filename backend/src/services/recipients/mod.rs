//! Recipients directory.
//!
//! The dispatcher resolves campaign recipient ids against this directory to
//! find names and phone numbers. Entries are loaded from CSV uploads.
//!
//! - `POST /recipients/import`: multipart upload, `file` field with a CSV
//!   whose header is `id,name,phone[,department][,active]`.
//! - `GET /recipients`: list the directory.

mod import;

use crate::db;
use crate::error::ServiceError;
use crate::state::AppState;
use actix_web::web::{get, post, scope};
use actix_web::{web, HttpResponse, Scope};
use regex::Regex;
use std::sync::LazyLock;

pub use import::{import_csv, ImportSummary};

const API_PATH: &str = "/recipients";

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10,15}$").expect("valid phone regex"));

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(list))
        .route("/import", post().to(import::process))
}

async fn list(state: web::Data<AppState>) -> Result<HttpResponse, ServiceError> {
    let conn = state.db.connect()?;
    let recipients = db::recipients::list(&conn)?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "recipients": recipients })))
}

/// Reduces a phone number to the digits-only form the provider expects.
///
/// Spaces, dashes, dots, parentheses and a leading `+` are dropped. Returns
/// `None` when the result is not 10 to 15 digits long.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digits: String = trimmed
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect();
    PHONE_RE.is_match(&digits).then_some(digits)
}
