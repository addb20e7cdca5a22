//! conversion of spatial density and a temporal profile into the expected
//! arrival count of one spawn cycle.
//!
//! λ = spatial_weight × passengers_per_unit_per_hour × hourly\[hour\] × daily\[weekday\] × (cycle_minutes / 60)
//!
//! depot and route spawn points are evaluated separately, each with its own
//! spatial weight and configuration. their λ values are never pooled before
//! sampling.
use super::temporal_profile::{hour_and_weekday, TemporalProfile};
use crate::config::{ConfigurationError, SpawnConfig};
use chrono::{DateTime, Utc};

/// expected spawn count for a single cycle. every factor must be finite
/// and non-negative, the hour in 0-23 and the weekday in 0-6.
pub fn calculate(
    spatial_weight: f64,
    hour: u8,
    weekday: u8,
    cycle_minutes: f64,
    passengers_per_unit_per_hour: f64,
    profile: &TemporalProfile,
) -> Result<f64, ConfigurationError> {
    if hour > 23 {
        return Err(ConfigurationError::InvalidSpawnConfig(format!(
            "hour {hour} outside of range 0-23"
        )));
    }
    if weekday > 6 {
        return Err(ConfigurationError::InvalidSpawnConfig(format!(
            "weekday {weekday} outside of range 0-6"
        )));
    }
    let hourly = profile.hour_multiplier(hour);
    let daily = profile.day_multiplier(weekday);
    let factors = [
        ("spatial_weight", spatial_weight),
        ("cycle_minutes", cycle_minutes),
        ("passengers_per_unit_per_hour", passengers_per_unit_per_hour),
        ("hourly multiplier", hourly),
        ("day multiplier", daily),
    ];
    for (name, value) in factors {
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigurationError::InvalidSpawnConfig(format!(
                "{name} must be finite and non-negative, found {value}"
            )));
        }
    }
    let lambda =
        spatial_weight * passengers_per_unit_per_hour * hourly * daily * (cycle_minutes / 60.0);
    Ok(lambda)
}

/// expected spawn count of one cycle for a reservoir with the given
/// configuration and spatial weight at the simulation instant `at`.
pub fn calculate_for(
    config: &SpawnConfig,
    spatial_weight: f64,
    at: &DateTime<Utc>,
) -> Result<f64, ConfigurationError> {
    let (hour, weekday) = hour_and_weekday(at);
    calculate(
        spatial_weight,
        hour,
        weekday,
        config.cycle_minutes,
        config.passengers_per_unit_per_hour,
        &TemporalProfile::from(config),
    )
}
