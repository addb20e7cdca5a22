use crate::model::reservoir::ReservoirId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// outcome of one spawn cycle of one reservoir
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnCycleReport {
    pub reservoir: ReservoirId,
    pub timestamp: DateTime<Utc>,
    /// spatial weight used for the rate
    pub weight: f64,
    /// the weight came from a cached or constant fallback
    pub degraded: bool,
    pub lambda: f64,
    /// the Poisson draw for this cycle
    pub drawn: u64,
    pub spawned: u64,
    /// rejected because the reservoir was full
    pub dropped: u64,
    /// rejected because no valid trip could be formed
    pub rejected: u64,
    /// waiting commuters expired at the start of the cycle
    pub expired: u64,
}

impl SpawnCycleReport {
    pub fn new(reservoir: ReservoirId, timestamp: DateTime<Utc>) -> SpawnCycleReport {
        SpawnCycleReport {
            reservoir,
            timestamp,
            weight: 0.0,
            degraded: false,
            lambda: 0.0,
            drawn: 0,
            spawned: 0,
            dropped: 0,
            rejected: 0,
            expired: 0,
        }
    }
}
