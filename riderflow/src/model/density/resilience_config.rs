use crate::config::ConfigurationError;
use serde::{Deserialize, Serialize};

/// longest accepted retry window, one year
pub const MAX_RETRY_AFTER_SECONDS: i64 = 366 * 24 * 3600;

/// fallback behavior for unreliable density sources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResilienceConfig {
    /// weight used when a source fails before any value was cached
    pub fallback_count: u64,
    /// consecutive failures before a source is disabled
    pub failure_threshold: u32,
    /// seconds a disabled source is skipped before one trial call
    pub retry_after_seconds: i64,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            fallback_count: 0,
            failure_threshold: 3,
            retry_after_seconds: 300,
        }
    }
}

impl ResilienceConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.retry_after_seconds < 0 || self.retry_after_seconds > MAX_RETRY_AFTER_SECONDS {
            return Err(ConfigurationError::InvalidSimulationConfig(format!(
                "density_resilience.retry_after_seconds must be in [0, {MAX_RETRY_AFTER_SECONDS}], found {}",
                self.retry_after_seconds
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_window_bounds() {
        assert!(ResilienceConfig::default().validate().is_ok());
        let negative = ResilienceConfig {
            retry_after_seconds: -1,
            ..Default::default()
        };
        assert!(negative.validate().is_err());
        let huge = ResilienceConfig {
            retry_after_seconds: i64::MAX,
            ..Default::default()
        };
        assert!(huge.validate().is_err());
    }
}
