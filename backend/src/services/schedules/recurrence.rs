//! Recurrence patterns for `recurring` campaigns.

use chrono::{DateTime, Duration, Months, Utc};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recurrence {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    EveryHours(u32),
}

impl Recurrence {
    /// The execution following one that ran at `from`.
    pub fn next_after(&self, from: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Recurrence::Daily => from + Duration::days(1),
            Recurrence::Weekly => from + Duration::weeks(1),
            Recurrence::Biweekly => from + Duration::weeks(2),
            // Month-end dates clamp to the last day of the next month.
            Recurrence::Monthly => from
                .checked_add_months(Months::new(1))
                .unwrap_or(from + Duration::days(30)),
            Recurrence::EveryHours(hours) => from + Duration::hours(i64::from(*hours)),
        }
    }
}

impl FromStr for Recurrence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let pattern = s.trim().to_ascii_lowercase();
        match pattern.as_str() {
            "daily" => Ok(Recurrence::Daily),
            "weekly" => Ok(Recurrence::Weekly),
            "biweekly" => Ok(Recurrence::Biweekly),
            "monthly" => Ok(Recurrence::Monthly),
            _ => pattern
                .strip_prefix("every:")
                .and_then(|rest| rest.strip_suffix('h'))
                .and_then(|hours| hours.parse::<u32>().ok())
                .filter(|hours| *hours >= 1)
                .map(Recurrence::EveryHours)
                .ok_or_else(|| s.to_string()),
        }
    }
}
