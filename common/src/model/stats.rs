use serde::{Deserialize, Serialize};

/// Aggregate delivery counters served by `GET /stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeliveryStats {
    pub total_sends: i64,
    /// Sends that reached at least `sent`.
    pub sent: i64,
    /// Sends that reached at least `delivered`.
    pub delivered: i64,
    pub read: i64,
    pub failed: i64,
    pub pending: i64,
    /// Percentage of attempted sends that did not fail.
    pub success_rate: f64,
    pub responses: i64,
}

/// NPS breakdown of a survey.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NpsResults {
    pub survey_id: String,
    pub responses: i64,
    pub promoters: i64,
    pub passives: i64,
    pub detractors: i64,
    pub nps: Option<i64>,
    pub average_score: Option<f64>,
}
