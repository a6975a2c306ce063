//! Typed request bodies accepted by the HTTP layer.
//!
//! Unknown fields are rejected so malformed payloads never reach the services.

use crate::model::campaign::{CampaignStatus, RecipientFilter, ScheduleType};
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateSurveyRequest {
    pub title: String,
    pub description: Option<String>,
    pub question: String,
}

/// Body of `POST /schedules`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateScheduleRequest {
    pub survey_id: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub target_users: Vec<String>,
    pub target_filter: Option<RecipientFilter>,
    pub schedule_type: ScheduleType,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub recurrence_pattern: Option<String>,
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateScheduleStatusRequest {
    pub status: CampaignStatus,
}

/// Body of `POST /send`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendRequest {
    pub schedule_id: String,
    /// Overrides the campaign's stored recipients when present.
    pub user_ids: Option<Vec<String>>,
}

/// Body of `POST /nps/{token}` and `POST /nps/submit`.
///
/// `score` is kept as raw JSON so that `null`, fractions and out-of-range
/// numbers are all reported as an invalid score rather than a shape error.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubmitResponseRequest {
    pub token: Option<String>,
    #[serde(default)]
    pub score: serde_json::Value,
    pub comment: Option<String>,
}
