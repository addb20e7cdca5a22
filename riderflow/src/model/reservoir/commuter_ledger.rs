use super::ReservoirStatistics;
use crate::model::commuter::{Commuter, CommuterId, CommuterState};
use geo::Coord;
use std::collections::HashMap;

/// counters and onboard commuters of one reservoir. held inside the
/// reservoir lock next to the waiting lists.
#[derive(Debug, Default)]
pub(crate) struct CommuterLedger {
    spawned: u64,
    picked_up: u64,
    expired: u64,
    alighted: u64,
    dropped: u64,
    onboard: HashMap<CommuterId, Commuter>,
}

impl CommuterLedger {
    pub fn record_spawn(&mut self) {
        self.spawned += 1;
    }

    pub fn record_drop(&mut self) {
        self.dropped += 1;
    }

    pub fn record_expired(&mut self, commuters: &mut [Commuter]) {
        for commuter in commuters.iter_mut() {
            commuter.state = CommuterState::Expired;
        }
        self.expired += commuters.len() as u64;
    }

    /// moves a waiting commuter onboard, returning a copy of its new state
    pub fn board(&mut self, mut commuter: Commuter, vehicle_id: &str) -> Commuter {
        commuter.state = CommuterState::Onboard;
        commuter.vehicle_id = Some(vehicle_id.to_string());
        self.picked_up += 1;
        let boarded = commuter.clone();
        self.onboard.insert(commuter.id, commuter);
        boarded
    }

    /// moves every onboard commuter of a vehicle to the vehicle position and
    /// removes those within `threshold_m` of their destination
    pub fn alight_near(
        &mut self,
        vehicle_id: &str,
        position: &Coord<f64>,
        threshold_m: f64,
    ) -> Vec<Commuter> {
        let mut arrived = vec![];
        for commuter in self.onboard.values_mut() {
            if commuter.vehicle_id.as_deref() != Some(vehicle_id) {
                continue;
            }
            commuter.position = *position;
            if commuter.distance_to_destination_m(position) <= threshold_m {
                arrived.push(commuter.id);
            }
        }
        arrived.sort();
        let alighted = arrived
            .iter()
            .filter_map(|id| self.onboard.remove(id))
            .map(|mut commuter| {
                commuter.state = CommuterState::Alighted;
                commuter
            })
            .collect::<Vec<_>>();
        self.alighted += alighted.len() as u64;
        alighted
    }

    pub fn statistics(&self, waiting: usize) -> ReservoirStatistics {
        ReservoirStatistics {
            spawned: self.spawned,
            picked_up: self.picked_up,
            expired: self.expired,
            waiting: waiting as u64,
            onboard: self.onboard.len() as u64,
            alighted: self.alighted,
            dropped: self.dropped,
        }
    }
}
