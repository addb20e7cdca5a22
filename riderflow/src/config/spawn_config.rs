use super::{ConfigurationError, RateTable};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// longest accepted waiting time before expiry, one year
pub const MAX_EXPIRY_TIMEOUT_SECONDS: i64 = 366 * 24 * 3600;
/// longest accepted spawn cycle, one day
pub const MAX_CYCLE_MINUTES: f64 = 24.0 * 60.0;

/// demand parameters for one route or depot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// passengers generated per unit of spatial weight (e.g. per building) per hour
    pub passengers_per_unit_per_hour: f64,
    /// hour of day (0-23) -> multiplier
    pub hourly_rates: RateTable,
    /// day of week (0=Monday..6=Sunday) -> multiplier
    pub day_multipliers: RateTable,
    /// multiplier used for missing table entries
    pub default_multiplier: f64,
    /// radius of the density query around a spawn location
    pub radius_m: f64,
    /// simulated minutes covered by one spawn cycle
    pub cycle_minutes: f64,
    /// maximum count of waiting commuters before new spawns are dropped
    pub max_waiting: usize,
    /// waiting commuters older than this are expired
    pub expiry_timeout_seconds: i64,
    /// onboard commuters alight within this distance of their destination
    pub alight_threshold_m: f64,
    /// minimum along-route trip length of generated trips
    pub min_trip_m: f64,
    /// identifier of the density source in the density manifest
    pub density_source: String,
    /// spacing of density sample points along a route corridor
    pub sample_spacing_m: f64,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            passengers_per_unit_per_hour: 0.3,
            hourly_rates: RateTable::default(),
            day_multipliers: RateTable::default(),
            default_multiplier: 1.0,
            radius_m: 500.0,
            cycle_minutes: 5.0,
            max_waiting: 500,
            expiry_timeout_seconds: 1800,
            alight_threshold_m: 50.0,
            min_trip_m: 250.0,
            density_source: String::from("default"),
            sample_spacing_m: 500.0,
        }
    }
}

impl SpawnConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.hourly_rates.validate("hourly_rates", 23)?;
        self.day_multipliers.validate("day_multipliers", 6)?;
        let non_negative = [
            (
                "passengers_per_unit_per_hour",
                self.passengers_per_unit_per_hour,
            ),
            ("default_multiplier", self.default_multiplier),
            ("alight_threshold_m", self.alight_threshold_m),
            ("min_trip_m", self.min_trip_m),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigurationError::InvalidSpawnConfig(format!(
                    "{name} must be finite and non-negative, found {value}"
                )));
            }
        }
        let positive = [
            ("radius_m", self.radius_m),
            ("cycle_minutes", self.cycle_minutes),
            ("sample_spacing_m", self.sample_spacing_m),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigurationError::InvalidSpawnConfig(format!(
                    "{name} must be finite and positive, found {value}"
                )));
            }
        }
        if self.cycle_minutes > MAX_CYCLE_MINUTES {
            return Err(ConfigurationError::InvalidSpawnConfig(format!(
                "cycle_minutes must be at most {MAX_CYCLE_MINUTES}, found {}",
                self.cycle_minutes
            )));
        }
        if self.expiry_timeout_seconds <= 0
            || self.expiry_timeout_seconds > MAX_EXPIRY_TIMEOUT_SECONDS
        {
            return Err(ConfigurationError::InvalidSpawnConfig(format!(
                "expiry_timeout_seconds must be in (0, {MAX_EXPIRY_TIMEOUT_SECONDS}], found {}",
                self.expiry_timeout_seconds
            )));
        }
        if self.max_waiting == 0 {
            return Err(ConfigurationError::InvalidSpawnConfig(String::from(
                "max_waiting must be at least 1",
            )));
        }
        Ok(())
    }

    pub fn expiry_timeout(&self) -> Option<TimeDelta> {
        TimeDelta::try_seconds(self.expiry_timeout_seconds)
    }

    /// expiry time of a commuter spawned at `spawned_at`, or none when it
    /// falls outside the representable time range
    pub fn expires_at(&self, spawned_at: &DateTime<Utc>) -> Option<DateTime<Utc>> {
        spawned_at.checked_add_signed(self.expiry_timeout()?)
    }
}
