//! Campaign creation (`POST /schedules`).
//!
//! Validation order: survey exists, recipients present, then the timing
//! policy. The first execution is due now for `immediate` and `recurring`
//! campaigns and at `scheduled_date` for `scheduled` ones.

use super::recurrence::Recurrence;
use crate::db;
use crate::error::ServiceError;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use log::info;
use nps_common::model::campaign::{Campaign, CampaignStatus, ScheduleType};
use nps_common::requests::CreateScheduleRequest;
use uuid::Uuid;

pub(crate) async fn process(
    state: web::Data<AppState>,
    payload: web::Json<CreateScheduleRequest>,
) -> Result<HttpResponse, ServiceError> {
    let campaign = create_campaign(&state, payload.into_inner(), Utc::now())?;
    Ok(HttpResponse::Created().json(serde_json::json!({ "success": true, "schedule": campaign })))
}

pub fn create_campaign(
    state: &AppState,
    req: CreateScheduleRequest,
    now: DateTime<Utc>,
) -> Result<Campaign, ServiceError> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(ServiceError::BadRequest("name must not be empty".into()));
    }

    let conn = state.db.connect()?;
    if db::surveys::get(&conn, &req.survey_id)?.is_none() {
        return Err(ServiceError::SurveyNotFound);
    }

    let mut target_users: Vec<String> = Vec::with_capacity(req.target_users.len());
    for id in req.target_users.iter().map(|id| id.trim()) {
        if !id.is_empty() && !target_users.iter().any(|known| known == id) {
            target_users.push(id.to_string());
        }
    }
    let target_filter = req.target_filter.filter(|f| !f.is_empty());
    if target_users.is_empty() && target_filter.is_none() {
        return Err(ServiceError::NoRecipients);
    }

    let recurrence_pattern = req
        .recurrence_pattern
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());

    let (scheduled_date, recurrence_pattern, next_execution_at) = match req.schedule_type {
        ScheduleType::Immediate => (None, None, now),
        ScheduleType::Scheduled => match req.scheduled_date {
            Some(date) if date > now => (Some(date), None, date),
            _ => return Err(ServiceError::MissingScheduleTime),
        },
        ScheduleType::Recurring => {
            let pattern = recurrence_pattern.ok_or(ServiceError::MissingRecurrencePattern)?;
            pattern
                .parse::<Recurrence>()
                .map_err(ServiceError::InvalidRecurrencePattern)?;
            (None, Some(pattern), now)
        }
    };

    let campaign = Campaign {
        id: Uuid::new_v4().to_string(),
        survey_id: req.survey_id,
        name,
        description: req
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
        target_users,
        target_filter,
        schedule_type: req.schedule_type,
        scheduled_date,
        recurrence_pattern,
        status: CampaignStatus::Active,
        next_execution_at: Some(next_execution_at),
        last_executed_at: None,
        success_count: 0,
        created_by: req.created_by,
        created_at: now,
    };

    db::campaigns::insert(&conn, &campaign)?;
    info!(
        "Created {} schedule {} for survey {} ({} explicit recipients)",
        campaign.schedule_type.as_str(),
        campaign.id,
        campaign.survey_id,
        campaign.target_users.len()
    );
    Ok(campaign)
}
