//! # Webhook Module
//!
//! ## Registered Routes
//! - `POST /webhook`: delivery/read receipts from the WhatsApp provider.
//!   Always answered with `200 {"success": true}`, whatever happens inside, so
//!   the provider never retries; problems are logged instead.

mod ingest;

use crate::state::AppState;
use actix_web::web::{post, scope};
use actix_web::{web, HttpResponse, Scope};
use log::{debug, error};

pub use ingest::{ingest, WebhookOutcome};

const API_PATH: &str = "/webhook";

pub fn configure_routes() -> Scope {
    scope(API_PATH).route("", post().to(process))
}

async fn process(state: web::Data<AppState>, body: web::Bytes) -> HttpResponse {
    match ingest(&state, &body) {
        Ok(outcome) => debug!(
            "Webhook processed: {} applied, {} ignored",
            outcome.applied, outcome.ignored
        ),
        Err(e) => error!("Webhook processing failed: {}", e),
    }
    HttpResponse::Ok().json(serde_json::json!({ "success": true }))
}
