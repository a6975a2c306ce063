//! Campaign (schedule) records.
//!
//! A campaign binds a survey to a recipient selection and a timing policy.
//! Campaigns are never deleted; they move to `paused` or `completed` instead.

use super::UnknownVariant;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// When a campaign runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleType {
    /// Dispatched on demand through `POST /send`.
    Immediate,
    /// Dispatched once at `scheduled_date`.
    Scheduled,
    /// Dispatched repeatedly following `recurrence_pattern`.
    Recurring,
}

impl ScheduleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleType::Immediate => "immediate",
            ScheduleType::Scheduled => "scheduled",
            ScheduleType::Recurring => "recurring",
        }
    }
}

impl FromStr for ScheduleType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "immediate" => Ok(ScheduleType::Immediate),
            "scheduled" => Ok(ScheduleType::Scheduled),
            "recurring" => Ok(ScheduleType::Recurring),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Active,
    Paused,
    Completed,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Active => "active",
            CampaignStatus::Paused => "paused",
            CampaignStatus::Completed => "completed",
        }
    }

    /// Operator-driven transitions. `completed` is terminal.
    pub fn can_transition_to(&self, next: CampaignStatus) -> bool {
        match (self, next) {
            (CampaignStatus::Completed, _) => false,
            (current, next) if *current == next => false,
            _ => true,
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CampaignStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(CampaignStatus::Active),
            "paused" => Ok(CampaignStatus::Paused),
            "completed" => Ok(CampaignStatus::Completed),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// Attribute filter applied to the recipients directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecipientFilter {
    pub department: Option<String>,
}

impl RecipientFilter {
    pub fn is_empty(&self) -> bool {
        self.department
            .as_deref()
            .map(|d| d.trim().is_empty())
            .unwrap_or(true)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    pub survey_id: String,
    pub name: String,
    pub description: Option<String>,
    /// Explicit recipient ids.
    pub target_users: Vec<String>,
    pub target_filter: Option<RecipientFilter>,
    pub schedule_type: ScheduleType,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub recurrence_pattern: Option<String>,
    pub status: CampaignStatus,
    pub next_execution_at: Option<DateTime<Utc>>,
    pub last_executed_at: Option<DateTime<Utc>>,
    /// Cumulative count of successfully sent messages across executions.
    pub success_count: i64,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}
