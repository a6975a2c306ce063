use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An NPS survey. Reference data for campaigns; never edited once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Survey {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    /// The 0-10 question shown on the response page.
    pub question: String,
    pub created_at: DateTime<Utc>,
}
