use super::UnknownVariant;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Delivery lifecycle of a single send.
///
/// Moves forward only: `pending -> sent -> delivered -> read`. `failed` is
/// terminal and can only be reached from `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendStatus {
    Pending,
    Sent,
    Delivered,
    Read,
    Failed,
}

impl SendStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SendStatus::Pending => "pending",
            SendStatus::Sent => "sent",
            SendStatus::Delivered => "delivered",
            SendStatus::Read => "read",
            SendStatus::Failed => "failed",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SendStatus::Pending => 0,
            SendStatus::Sent => 1,
            SendStatus::Delivered => 2,
            SendStatus::Read => 3,
            SendStatus::Failed => u8::MAX,
        }
    }

    /// Whether moving from `self` to `next` is a forward transition.
    pub fn advances_to(&self, next: SendStatus) -> bool {
        match (self, next) {
            (SendStatus::Failed, _) => false,
            (SendStatus::Pending, SendStatus::Failed) => true,
            (_, SendStatus::Failed) => false,
            (current, next) => next.rank() > current.rank(),
        }
    }
}

impl fmt::Display for SendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SendStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SendStatus::Pending),
            "sent" => Ok(SendStatus::Sent),
            "delivered" => Ok(SendStatus::Delivered),
            "read" => Ok(SendStatus::Read),
            "failed" => Ok(SendStatus::Failed),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// One recipient-specific delivery attempt of a campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendRecord {
    pub id: String,
    pub campaign_id: String,
    pub survey_id: String,
    pub recipient_id: String,
    /// Normalised phone number the message went to.
    pub contact: String,
    pub status: SendStatus,
    pub provider_message_id: Option<String>,
    pub token: String,
    pub response_url: String,
    pub error_message: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
    /// Free-form details such as the rendered message body.
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::SendStatus::*;

    #[test]
    fn forward_transitions_only() {
        assert!(Pending.advances_to(Sent));
        assert!(Sent.advances_to(Delivered));
        assert!(Sent.advances_to(Read));
        assert!(Delivered.advances_to(Read));
        assert!(!Delivered.advances_to(Delivered));
        assert!(!Read.advances_to(Delivered));
        assert!(!Delivered.advances_to(Sent));
    }

    #[test]
    fn failed_branches_from_pending_only() {
        assert!(Pending.advances_to(Failed));
        assert!(!Sent.advances_to(Failed));
        assert!(!Read.advances_to(Failed));
        assert!(!Failed.advances_to(Sent));
        assert!(!Failed.advances_to(Failed));
    }
}
