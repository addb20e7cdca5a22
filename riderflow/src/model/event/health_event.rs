use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// a source failed and a cached or constant fallback was substituted
    Degraded,
    /// a source failed repeatedly and is skipped until its retry window passes
    Disabled,
    Recovered,
    /// a route or depot could not be registered or could not spawn
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthEvent {
    pub component: String,
    pub status: HealthStatus,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl HealthEvent {
    pub fn new(component: &str, status: HealthStatus, message: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            component: component.to_string(),
            status,
            message,
            timestamp,
        }
    }
}
