mod atomic;
pub mod balance;
pub mod error;
pub mod household;
pub mod metrics;
pub mod payments;
pub mod recurrence;
pub mod reports;
pub mod schedule;
pub mod sync;

#[cfg(test)]
pub mod testing;

use chrono::{NaiveDate, Utc};
use schedule::{ScheduleMaterializer, ScheduleSettings};

/// Returns the schedule materializer used by the API and the CLI.
///
/// This function uses the provided date as "today" or the current date if none is provided.
pub fn default_materializer(settings: ScheduleSettings, today: Option<NaiveDate>) -> ScheduleMaterializer {
    let today = today.unwrap_or_else(|| Utc::now().date_naive());
    ScheduleMaterializer::new(settings, today)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::date;

    #[test]
    fn test_default_materializer_keeps_settings() {
        let settings = ScheduleSettings {
            batch_size: 10,
            horizon_months: 6,
        };
        let materializer = default_materializer(settings, Some(date(2024, 1, 15)));
        assert_eq!(materializer.settings(), &settings);
    }
}
