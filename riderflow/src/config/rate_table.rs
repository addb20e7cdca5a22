use super::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// sparse table of non-negative multipliers keyed by hour of day (0-23) or
/// day of week (0-6, Monday first). keys are written as strings so that the
/// table reads the same from TOML and JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct RateTable(BTreeMap<u8, f64>);

impl RateTable {
    pub fn from_entries(entries: &[(u8, f64)]) -> RateTable {
        RateTable(entries.iter().copied().collect())
    }

    /// the multiplier for a key, or the default multiplier when the entry is missing
    pub fn get_or(&self, key: u8, default_multiplier: f64) -> f64 {
        self.0.get(&key).copied().unwrap_or(default_multiplier)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// confirms every key is at most `max_key` and every multiplier is finite and non-negative
    pub fn validate(&self, name: &str, max_key: u8) -> Result<(), ConfigurationError> {
        for (key, value) in self.0.iter() {
            if *key > max_key {
                return Err(ConfigurationError::InvalidRateTable(
                    name.to_string(),
                    format!("key {key} outside of range 0-{max_key}"),
                ));
            }
            if !value.is_finite() || *value < 0.0 {
                return Err(ConfigurationError::InvalidRateTable(
                    name.to_string(),
                    format!("multiplier {value} for key {key} must be finite and non-negative"),
                ));
            }
        }
        Ok(())
    }
}

impl TryFrom<BTreeMap<String, f64>> for RateTable {
    type Error = String;

    fn try_from(value: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        let mut table = BTreeMap::new();
        for (k, v) in value.into_iter() {
            let key = k
                .trim()
                .parse::<u8>()
                .map_err(|e| format!("rate table key '{k}' is not a small integer: {e}"))?;
            table.insert(key, v);
        }
        Ok(RateTable(table))
    }
}

impl From<RateTable> for BTreeMap<String, f64> {
    fn from(value: RateTable) -> Self {
        value.0.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }
}
