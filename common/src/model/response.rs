use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MIN_SCORE: u8 = 0;
pub const MAX_SCORE: u8 = 10;

/// A submitted NPS answer. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpsResponse {
    pub id: String,
    pub survey_id: String,
    pub recipient_name: String,
    pub contact: String,
    pub score: u8,
    pub comment: Option<String>,
    /// Token the answer was submitted with.
    pub token: String,
    pub responded_at: DateTime<Utc>,
}

/// Standard NPS buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NpsCategory {
    Detractor,
    Passive,
    Promoter,
}

impl NpsCategory {
    pub fn for_score(score: u8) -> Self {
        match score {
            9..=10 => NpsCategory::Promoter,
            7..=8 => NpsCategory::Passive,
            _ => NpsCategory::Detractor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_buckets() {
        assert_eq!(NpsCategory::for_score(0), NpsCategory::Detractor);
        assert_eq!(NpsCategory::for_score(6), NpsCategory::Detractor);
        assert_eq!(NpsCategory::for_score(7), NpsCategory::Passive);
        assert_eq!(NpsCategory::for_score(8), NpsCategory::Passive);
        assert_eq!(NpsCategory::for_score(9), NpsCategory::Promoter);
        assert_eq!(NpsCategory::for_score(10), NpsCategory::Promoter);
    }
}
