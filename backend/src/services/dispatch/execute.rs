//! Campaign execution.
//!
//! 1. The campaign must exist and be `active`; its survey must exist.
//! 2. Recipients come from the override list when given, otherwise from the
//!    campaign's explicit ids plus its directory filter.
//! 3. Recipients without a usable phone (or inactive, or unknown) are skipped.
//! 4. Each remaining recipient is handled independently, at most
//!    `DispatchSettings::concurrency` at a time: token and pending send are
//!    written in one transaction, the message is delivered, and the send is
//!    marked `sent` or `failed`. One recipient failing never stops the others.
//! 5. The campaign's counters and next execution are updated.

use super::message;
use crate::db::{self, StorageError};
use crate::error::ServiceError;
use crate::services::schedules::recurrence::Recurrence;
use crate::state::AppState;
use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use log::{error, info, warn};
use nps_common::model::campaign::{Campaign, CampaignStatus, ScheduleType};
use nps_common::model::dispatch::{DispatchReport, DispatchSummary, RecipientResult};
use nps_common::model::recipient::Recipient;
use nps_common::model::send::{SendRecord, SendStatus};
use nps_common::model::survey::Survey;
use nps_common::model::token::TokenContext;
use rusqlite::Connection;
use std::collections::HashSet;
use uuid::Uuid;

/// Runs `campaign_id` once, optionally for `recipient_override` only.
///
/// Runs with an override are manual re-sends: they add to the success counter
/// but leave the campaign's schedule and status alone.
pub async fn execute(
    state: &AppState,
    campaign_id: &str,
    recipient_override: Option<Vec<String>>,
) -> Result<DispatchReport, ServiceError> {
    let (campaign, survey, resolution) = {
        let conn = state.db.connect()?;
        let campaign =
            db::campaigns::get(&conn, campaign_id)?.ok_or(ServiceError::CampaignNotFound)?;
        if campaign.status != CampaignStatus::Active {
            return Err(ServiceError::CampaignNotActive(campaign.status));
        }
        let survey =
            db::surveys::get(&conn, &campaign.survey_id)?.ok_or(ServiceError::SurveyNotFound)?;
        let resolution = resolve_recipients(&conn, &campaign, recipient_override.as_deref())?;
        (campaign, survey, resolution)
    };

    if resolution.contactable.is_empty() {
        warn!(
            "Schedule {} has no contactable recipients ({} skipped)",
            campaign.id, resolution.skipped
        );
        return Err(ServiceError::NoRecipients);
    }

    let started_at = Utc::now();
    let campaign_ref = &campaign;
    let survey_ref = &survey;
    let mut indexed: Vec<(usize, RecipientResult)> =
        stream::iter(resolution.contactable.into_iter().enumerate())
            .map(|(idx, (recipient, contact))| async move {
                let result = dispatch_one(state, campaign_ref, survey_ref, &recipient, &contact).await;
                (idx, result)
            })
            .buffer_unordered(state.dispatch.concurrency.max(1))
            .collect()
            .await;
    indexed.sort_by_key(|(idx, _)| *idx);
    let results: Vec<RecipientResult> = indexed.into_iter().map(|(_, r)| r).collect();

    let sent = results.iter().filter(|r| r.success).count();
    let summary = DispatchSummary {
        total: results.len(),
        sent,
        failed: results.len() - sent,
        skipped: resolution.skipped,
    };

    if let Err(e) = record_execution(state, &campaign, sent, started_at, recipient_override.is_some())
    {
        // The messages are already out; report them and leave the counters.
        error!("Failed to record execution of schedule {}: {}", campaign.id, e);
    }

    info!(
        "Schedule {} dispatched: {} sent, {} failed, {} skipped",
        campaign.id, summary.sent, summary.failed, summary.skipped
    );

    Ok(DispatchReport {
        success: true,
        results,
        summary,
    })
}

struct Resolution {
    /// Recipients with their normalised phone, in request order.
    contactable: Vec<(Recipient, String)>,
    skipped: usize,
}

fn resolve_recipients(
    conn: &Connection,
    campaign: &Campaign,
    recipient_override: Option<&[String]>,
) -> Result<Resolution, StorageError> {
    let mut seen = HashSet::new();
    let requested: Vec<String> = recipient_override
        .unwrap_or(&campaign.target_users)
        .iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty() && seen.insert(id.clone()))
        .collect();

    let mut candidates = db::recipients::get_many(conn, &requested)?;
    let mut skipped = requested.len() - candidates.len();

    if recipient_override.is_none() {
        if let Some(department) = campaign
            .target_filter
            .as_ref()
            .and_then(|f| f.department.as_deref())
        {
            for recipient in db::recipients::active_in_department(conn, department)? {
                if seen.insert(recipient.id.clone()) {
                    candidates.push(recipient);
                }
            }
        }
    }

    let mut contactable = Vec::with_capacity(candidates.len());
    for recipient in candidates {
        match recipient.phone.clone().filter(|_| recipient.active) {
            Some(phone) => contactable.push((recipient, phone)),
            None => skipped += 1,
        }
    }

    Ok(Resolution {
        contactable,
        skipped,
    })
}

/// Pending send plus the text to deliver.
struct PreparedSend {
    send_id: String,
    body: String,
}

async fn dispatch_one(
    state: &AppState,
    campaign: &Campaign,
    survey: &Survey,
    recipient: &Recipient,
    contact: &str,
) -> RecipientResult {
    let prepared = match prepare_send(state, campaign, survey, recipient, contact) {
        Ok(prepared) => prepared,
        Err(e) => {
            error!("Could not record send for {}: {}", recipient.id, e);
            return RecipientResult {
                recipient_id: recipient.id.clone(),
                success: false,
                send_id: None,
                provider_message_id: None,
                error: Some(format!("could not record send: {}", e)),
            };
        }
    };

    match state.delivery.send_text(contact, &prepared.body).await {
        Ok(message_id) => {
            let recorded = state
                .db
                .connect()
                .and_then(|conn| db::sends::mark_sent(&conn, &prepared.send_id, &message_id, Utc::now()));
            if let Err(e) = recorded {
                error!("Send {} delivered but not recorded: {}", prepared.send_id, e);
            }
            RecipientResult {
                recipient_id: recipient.id.clone(),
                success: true,
                send_id: Some(prepared.send_id),
                provider_message_id: Some(message_id),
                error: None,
            }
        }
        Err(e) => {
            warn!("Delivery to {} failed: {}", recipient.id, e);
            let cause = e.to_string();
            let recorded = state
                .db
                .connect()
                .and_then(|conn| db::sends::mark_failed(&conn, &prepared.send_id, &cause));
            if let Err(e) = recorded {
                error!("Could not record failure of send {}: {}", prepared.send_id, e);
            }
            RecipientResult {
                recipient_id: recipient.id.clone(),
                success: false,
                send_id: Some(prepared.send_id),
                provider_message_id: None,
                error: Some(cause),
            }
        }
    }
}

/// Writes the token and the pending send in one transaction.
fn prepare_send(
    state: &AppState,
    campaign: &Campaign,
    survey: &Survey,
    recipient: &Recipient,
    contact: &str,
) -> Result<PreparedSend, StorageError> {
    let mut conn = state.db.connect()?;
    let tx = conn.transaction()?;

    let send_id = Uuid::new_v4().to_string();
    let context = TokenContext {
        survey_id: survey.id.clone(),
        survey_title: survey.title.clone(),
        question: survey.question.clone(),
        recipient_id: recipient.id.clone(),
        recipient_name: recipient.name.clone(),
        contact: contact.to_string(),
        schedule_id: campaign.id.clone(),
    };
    let token = state.tokens.issue(&tx, &send_id, context)?;
    let response_url = message::response_url(&state.dispatch.public_base_url, &token.token);
    let body = message::compose(recipient.first_name(), survey, &response_url);

    let send = SendRecord {
        id: send_id.clone(),
        campaign_id: campaign.id.clone(),
        survey_id: survey.id.clone(),
        recipient_id: recipient.id.clone(),
        contact: contact.to_string(),
        status: SendStatus::Pending,
        provider_message_id: None,
        token: token.token,
        response_url,
        error_message: None,
        sent_at: None,
        delivered_at: None,
        read_at: None,
        metadata: serde_json::json!({
            "message": body,
            "channel": "whatsapp",
            "simulated": state.delivery.is_simulated(),
        }),
        created_at: Utc::now(),
    };
    db::sends::insert(&tx, &send)?;
    tx.commit()?;

    Ok(PreparedSend { send_id, body })
}

fn record_execution(
    state: &AppState,
    campaign: &Campaign,
    sent: usize,
    executed_at: DateTime<Utc>,
    manual: bool,
) -> Result<(), StorageError> {
    let conn = state.db.connect()?;
    let sent = i64::try_from(sent).unwrap_or(i64::MAX);
    if manual {
        return db::campaigns::record_manual_execution(&conn, &campaign.id, sent, executed_at);
    }

    let (next, status) = match campaign.schedule_type {
        ScheduleType::Recurring => match campaign
            .recurrence_pattern
            .as_deref()
            .map(str::parse::<Recurrence>)
        {
            Some(Ok(recurrence)) => (Some(recurrence.next_after(executed_at)), CampaignStatus::Active),
            _ => {
                warn!("Schedule {} has no usable recurrence, completing it", campaign.id);
                (None, CampaignStatus::Completed)
            }
        },
        ScheduleType::Immediate | ScheduleType::Scheduled => (None, CampaignStatus::Completed),
    };
    db::campaigns::record_execution(&conn, &campaign.id, sent, executed_at, next, status)
}
