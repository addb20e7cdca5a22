use serde::{Deserialize, Serialize};

/// snapshot of reservoir counters taken under the reservoir lock.
/// `spawned == picked_up + expired + waiting` holds for every snapshot.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservoirStatistics {
    pub spawned: u64,
    pub picked_up: u64,
    pub expired: u64,
    pub waiting: u64,
    pub onboard: u64,
    pub alighted: u64,
    /// spawns rejected at capacity. these never count as spawned.
    pub dropped: u64,
}

impl ReservoirStatistics {
    pub fn is_consistent(&self) -> bool {
        self.spawned == self.picked_up + self.expired + self.waiting
            && self.picked_up == self.onboard + self.alighted
    }
}

impl std::ops::Add for ReservoirStatistics {
    type Output = ReservoirStatistics;

    fn add(self, rhs: Self) -> Self::Output {
        ReservoirStatistics {
            spawned: self.spawned + rhs.spawned,
            picked_up: self.picked_up + rhs.picked_up,
            expired: self.expired + rhs.expired,
            waiting: self.waiting + rhs.waiting,
            onboard: self.onboard + rhs.onboard,
            alighted: self.alighted + rhs.alighted,
            dropped: self.dropped + rhs.dropped,
        }
    }
}
