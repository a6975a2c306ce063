//! Due-campaign poller.
//!
//! Every tick, active `scheduled`/`recurring` campaigns with
//! `next_execution_at <= now` are claimed one by one (compare-and-swap on
//! `next_execution_at`, so two processes never run the same execution) and
//! handed to the dispatcher, which sets the following execution time.
//! `immediate` campaigns only run through `POST /send`.

use crate::db::{self, StorageError};
use crate::error::ServiceError;
use crate::services::dispatch;
use crate::services::schedules::recurrence::Recurrence;
use crate::state::AppState;
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use nps_common::model::campaign::{Campaign, CampaignStatus, ScheduleType};
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Starts the poller on the current actix runtime.
pub fn start_campaign_poller(state: AppState, period: Duration) {
    info!("Campaign scheduler polling every {:?}", period);
    actix_web::rt::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if let Err(e) = run_due_campaigns(&state, Utc::now()).await {
                error!("Campaign scheduler tick failed: {}", e);
            }
        }
    });
}

/// Executes every campaign due at `now`. Returns how many were run.
pub async fn run_due_campaigns(state: &AppState, now: DateTime<Utc>) -> Result<usize, StorageError> {
    let due = {
        let conn = state.db.connect()?;
        db::campaigns::due(&conn, now)?
    };

    let mut executed = 0;
    for campaign in due {
        let Some(observed) = campaign.next_execution_at else {
            continue;
        };
        let claimed = {
            let conn = state.db.connect()?;
            db::campaigns::claim_execution(&conn, &campaign.id, observed)?
        };
        if !claimed {
            continue;
        }

        match dispatch::execute(state, &campaign.id, None).await {
            Ok(report) => {
                executed += 1;
                info!(
                    "Scheduled run of {} finished: {}/{} sent",
                    campaign.id, report.summary.sent, report.summary.total
                );
            }
            Err(ServiceError::CampaignNotActive(status)) => {
                // Paused or completed between selection and dispatch: hand the
                // slot back so a resumed campaign still runs.
                info!("Scheduled run of {} skipped, campaign is {}", campaign.id, status);
                let conn = state.db.connect()?;
                db::campaigns::restore_next_execution(&conn, &campaign.id, observed)?;
            }
            Err(e) => {
                warn!("Scheduled run of {} failed: {}", campaign.id, e);
                release_after_failure(state, &campaign, now)?;
            }
        }
    }
    Ok(executed)
}

/// A claimed run that could not dispatch still has to leave the campaign in a
/// consistent state: recurring ones wait for their next slot, one-shot ones
/// are completed.
fn release_after_failure(
    state: &AppState,
    campaign: &Campaign,
    now: DateTime<Utc>,
) -> Result<(), StorageError> {
    let next = match campaign.schedule_type {
        ScheduleType::Recurring => campaign
            .recurrence_pattern
            .as_deref()
            .and_then(|p| p.parse::<Recurrence>().ok())
            .map(|r| r.next_after(now)),
        ScheduleType::Immediate | ScheduleType::Scheduled => None,
    };
    let status = if next.is_some() {
        CampaignStatus::Active
    } else {
        CampaignStatus::Completed
    };
    let conn = state.db.connect()?;
    db::campaigns::record_execution(&conn, &campaign.id, 0, now, next, status)
}
