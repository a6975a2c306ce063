//! # Schedule (Campaign) Service Module
//!
//! ## Registered Routes
//! - `POST /schedules`: create a campaign (`CreateScheduleRequest`), 201 on success.
//! - `GET /schedules`: list campaigns, newest first.
//! - `GET /schedules/{schedule_id}`: one campaign.
//! - `POST /schedules/{schedule_id}/status`: pause, resume or complete a campaign.
//! - `GET /schedules/{schedule_id}/sends`: delivery records of a campaign.

mod create;
pub mod recurrence;
mod status;

use crate::db;
use crate::error::ServiceError;
use crate::state::AppState;
use actix_web::web::{get, post, scope};
use actix_web::{web, HttpResponse, Scope};

pub use create::create_campaign;
pub use status::set_status;

const API_PATH: &str = "/schedules";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", post().to(create::process))
        .route("", get().to(list))
        .route("/{schedule_id}", get().to(get_one))
        .route("/{schedule_id}/status", post().to(status::process))
        .route("/{schedule_id}/sends", get().to(sends))
}

async fn list(state: web::Data<AppState>) -> Result<HttpResponse, ServiceError> {
    let conn = state.db.connect()?;
    let schedules = db::campaigns::list(&conn)?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "schedules": schedules })))
}

async fn get_one(
    state: web::Data<AppState>,
    schedule_id: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let conn = state.db.connect()?;
    let campaign = db::campaigns::get(&conn, &schedule_id)?.ok_or(ServiceError::CampaignNotFound)?;
    Ok(HttpResponse::Ok().json(campaign))
}

async fn sends(
    state: web::Data<AppState>,
    schedule_id: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let conn = state.db.connect()?;
    if db::campaigns::get(&conn, &schedule_id)?.is_none() {
        return Err(ServiceError::CampaignNotFound);
    }
    let sends = db::sends::list_by_campaign(&conn, &schedule_id)?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "sends": sends })))
}
