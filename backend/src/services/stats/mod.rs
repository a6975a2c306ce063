//! # Stats Module
//!
//! - `GET /stats`: delivery counters across all campaigns.

use crate::db::{self, StorageError};
use crate::error::ServiceError;
use crate::state::AppState;
use actix_web::web::{get, scope};
use actix_web::{web, HttpResponse, Scope};
use nps_common::model::send::SendStatus;
use nps_common::model::stats::DeliveryStats;

const API_PATH: &str = "/stats";

pub fn configure_routes() -> Scope {
    scope(API_PATH).route("", get().to(process))
}

async fn process(state: web::Data<AppState>) -> Result<HttpResponse, ServiceError> {
    Ok(HttpResponse::Ok().json(delivery_stats(&state)?))
}

pub fn delivery_stats(state: &AppState) -> Result<DeliveryStats, StorageError> {
    let conn = state.db.connect()?;
    let counts = db::sends::count_by_status(&conn)?;
    let count = |status: SendStatus| counts.get(&status).copied().unwrap_or(0);

    let read = count(SendStatus::Read);
    let delivered = count(SendStatus::Delivered) + read;
    let sent = count(SendStatus::Sent) + delivered;
    let failed = count(SendStatus::Failed);
    let pending = count(SendStatus::Pending);

    Ok(DeliveryStats {
        total_sends: sent + failed + pending,
        sent,
        delivered,
        read,
        failed,
        pending,
        success_rate: success_rate(sent, failed),
        responses: db::responses::count(&conn)?,
    })
}

/// Share of attempted sends that went out, in percent with one decimal.
fn success_rate(sent: i64, failed: i64) -> f64 {
    let attempted = sent + failed;
    if attempted == 0 {
        return 0.0;
    }
    (1000.0 * sent as f64 / attempted as f64).round() / 10.0
}
