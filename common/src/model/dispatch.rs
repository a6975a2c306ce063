use serde::{Deserialize, Serialize};

/// Outcome of one recipient in a campaign execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientResult {
    pub recipient_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchSummary {
    /// Recipients a delivery was attempted for.
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
    /// Recipients dropped for lacking a contactable address.
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReport {
    pub success: bool,
    pub results: Vec<RecipientResult>,
    pub summary: DispatchSummary,
}
