//! # Dispatch Service Module
//!
//! Executes campaigns: one WhatsApp message with a personal response link per
//! recipient, each tracked by its own send record.
//!
//! ## Registered Routes
//! - `POST /send`: body `SendRequest { schedule_id, user_ids? }`. Returns the
//!   per-recipient results and a `{ total, sent, failed, skipped }` summary.

mod execute;
pub mod message;

use crate::error::ServiceError;
use crate::state::AppState;
use actix_web::web::{post, scope};
use actix_web::{web, HttpResponse, Scope};
use nps_common::requests::SendRequest;

pub use execute::execute;

const API_PATH: &str = "/send";

pub fn configure_routes() -> Scope {
    scope(API_PATH).route("", post().to(process))
}

async fn process(
    state: web::Data<AppState>,
    payload: web::Json<SendRequest>,
) -> Result<HttpResponse, ServiceError> {
    let SendRequest {
        schedule_id,
        user_ids,
    } = payload.into_inner();
    let report = execute(&state, &schedule_id, user_ids).await?;
    Ok(HttpResponse::Ok().json(report))
}
