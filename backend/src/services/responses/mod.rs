//! # Response Collector Module
//!
//! Public, unauthenticated surface reached from the link in the WhatsApp
//! message. The token in the URL is the only credential.
//!
//! ## Registered Routes
//! - `GET /nps/{token}`: HTML form, or a plain-text page telling apart an
//!   invalid link (404) from one already used or expired (410).
//! - `POST /nps/submit`: `{ token, score, comment? }`.
//! - `POST /nps/{token}`: `{ score, comment? }`.
//! - `GET /response?token=...`: old link format, redirected to `/nps/{token}`.

mod page;
mod submit;

use actix_web::web::{get, post, scope};
use actix_web::{http::header, web, HttpResponse, Scope};
use serde::Deserialize;

pub use submit::submit;

const API_PATH: &str = "/nps";
const LEGACY_PATH: &str = "/response";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        // Registered before `/{token}` so "submit" is never taken for a token.
        .route("/submit", post().to(submit::process_with_body_token))
        .route("/{token}", get().to(page::process))
        .route("/{token}", post().to(submit::process))
}

pub fn legacy_routes() -> Scope {
    scope(LEGACY_PATH).route("", get().to(legacy_redirect))
}

#[derive(Deserialize)]
struct LegacyQuery {
    token: Option<String>,
}

async fn legacy_redirect(query: web::Query<LegacyQuery>) -> HttpResponse {
    match query.token.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        Some(token) => HttpResponse::PermanentRedirect()
            .insert_header((header::LOCATION, format!("{}/{}", API_PATH, token)))
            .finish(),
        None => page::invalid_link(),
    }
}
