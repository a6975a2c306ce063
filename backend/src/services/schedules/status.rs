use super::recurrence::Recurrence;
use crate::db;
use crate::error::ServiceError;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use log::info;
use nps_common::model::campaign::{Campaign, CampaignStatus, ScheduleType};
use nps_common::requests::UpdateScheduleStatusRequest;

pub(crate) async fn process(
    state: web::Data<AppState>,
    schedule_id: web::Path<String>,
    payload: web::Json<UpdateScheduleStatusRequest>,
) -> Result<HttpResponse, ServiceError> {
    let campaign = set_status(&state, &schedule_id, payload.status)?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true, "schedule": campaign })))
}

/// Soft lifecycle transition. Campaigns are never deleted.
pub fn set_status(
    state: &AppState,
    schedule_id: &str,
    to: CampaignStatus,
) -> Result<Campaign, ServiceError> {
    let conn = state.db.connect()?;
    let campaign = db::campaigns::get(&conn, schedule_id)?.ok_or(ServiceError::CampaignNotFound)?;
    let from = campaign.status;
    if !from.can_transition_to(to) {
        return Err(ServiceError::InvalidStatusTransition { from, to });
    }
    if !db::campaigns::update_status(&conn, schedule_id, from, to)? {
        // Someone else changed it between our read and write.
        let current = db::campaigns::get(&conn, schedule_id)?
            .map(|c| c.status)
            .unwrap_or(from);
        return Err(ServiceError::InvalidStatusTransition { from: current, to });
    }
    info!("Schedule {} moved from {} to {}", schedule_id, from, to);
    if to == CampaignStatus::Active {
        if let Some(at) = resume_at(&campaign, Utc::now()) {
            if db::campaigns::restore_next_execution(&conn, schedule_id, at)? {
                info!("Schedule {} next execution restored to {}", schedule_id, at);
            }
        }
    }
    db::campaigns::get(&conn, schedule_id)?.ok_or(ServiceError::CampaignNotFound)
}

/// Execution time for a resumed campaign whose pending slot was lost (claimed
/// by a run that never recorded a successor).
fn resume_at(campaign: &Campaign, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if campaign.next_execution_at.is_some() {
        return None;
    }
    match campaign.schedule_type {
        ScheduleType::Recurring => {
            let recurrence = campaign.recurrence_pattern.as_deref()?.parse::<Recurrence>().ok()?;
            Some(
                campaign
                    .last_executed_at
                    .map_or(now, |last| recurrence.next_after(last)),
            )
        }
        ScheduleType::Scheduled if campaign.last_executed_at.is_none() => campaign.scheduled_date,
        ScheduleType::Scheduled | ScheduleType::Immediate => None,
    }
}
