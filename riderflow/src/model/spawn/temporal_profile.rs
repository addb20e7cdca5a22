use crate::config::{RateTable, SpawnConfig};
use chrono::{DateTime, Datelike, Timelike, Utc};

/// hour-of-day and day-of-week multipliers with the multiplier used for
/// entries missing from either table.
#[derive(Debug, Clone, Copy)]
pub struct TemporalProfile<'a> {
    pub hourly: &'a RateTable,
    pub daily: &'a RateTable,
    pub default_multiplier: f64,
}

impl<'a> TemporalProfile<'a> {
    pub fn new(hourly: &'a RateTable, daily: &'a RateTable, default_multiplier: f64) -> Self {
        Self {
            hourly,
            daily,
            default_multiplier,
        }
    }

    pub fn hour_multiplier(&self, hour: u8) -> f64 {
        self.hourly.get_or(hour, self.default_multiplier)
    }

    pub fn day_multiplier(&self, weekday: u8) -> f64 {
        self.daily.get_or(weekday, self.default_multiplier)
    }
}

impl<'a> From<&'a SpawnConfig> for TemporalProfile<'a> {
    fn from(value: &'a SpawnConfig) -> Self {
        TemporalProfile::new(
            &value.hourly_rates,
            &value.day_multipliers,
            value.default_multiplier,
        )
    }
}

/// hour of day (0-23) and weekday (0=Monday..6=Sunday) of a simulation instant
pub fn hour_and_weekday(at: &DateTime<Utc>) -> (u8, u8) {
    // both values are bounded by chrono to fit in a u8
    let hour = at.hour() as u8;
    let weekday = at.weekday().num_days_from_monday() as u8;
    (hour, weekday)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_weekday_starts_monday() {
        // 2024-01-01 was a Monday
        let monday = Utc.with_ymd_and_hms(2024, 1, 1, 7, 30, 0).unwrap();
        assert_eq!(hour_and_weekday(&monday), (7, 0));
        let sunday = Utc.with_ymd_and_hms(2024, 1, 7, 23, 59, 0).unwrap();
        assert_eq!(hour_and_weekday(&sunday), (23, 6));
    }

    #[test]
    fn test_default_multiplier_fills_gaps() {
        let hourly = RateTable::from_entries(&[(8, 2.0)]);
        let daily = RateTable::default();
        let profile = TemporalProfile::new(&hourly, &daily, 0.5);
        assert_eq!(profile.hour_multiplier(8), 2.0);
        assert_eq!(profile.hour_multiplier(9), 0.5);
        assert_eq!(profile.day_multiplier(3), 0.5);
    }
}
