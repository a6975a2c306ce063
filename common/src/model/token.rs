use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot taken at dispatch time so the public response page can be
/// rendered from the token alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenContext {
    pub survey_id: String,
    pub survey_title: String,
    pub question: String,
    pub recipient_id: String,
    pub recipient_name: String,
    pub contact: String,
    pub schedule_id: String,
}

/// Single-use bearer credential bound to one send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseToken {
    pub token: String,
    pub send_id: String,
    pub context: TokenContext,
    pub used: bool,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl ResponseToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| now >= at).unwrap_or(false)
    }
}
