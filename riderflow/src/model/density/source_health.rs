use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum SourceHealth {
    Healthy,
    Degraded { consecutive_failures: u32 },
    /// skipped until `retry_at`, when a single trial call is let through
    Disabled { retry_at: DateTime<Utc> },
}
