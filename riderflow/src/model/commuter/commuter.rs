use super::{CommuterId, CommuterState, Direction};
use crate::model::reservoir::ReservoirId;
use chrono::{DateTime, Utc};
use geo::Coord;
use riderflow_route::util::geo_ops;
use serde::{Deserialize, Serialize};

/// a simulated rider owned by exactly one reservoir until it reaches a
/// terminal state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commuter {
    pub id: CommuterId,
    /// current position as (lon, lat)
    pub position: Coord<f64>,
    pub destination: Coord<f64>,
    pub owner: ReservoirId,
    pub direction: Direction,
    pub priority: u8,
    pub spawned_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub state: CommuterState,
    pub vehicle_id: Option<String>,
    /// along-route distance between position and destination when known
    pub trip_length_m: Option<f64>,
}

impl Commuter {
    /// true once more than the expiry timeout has passed since spawning
    pub fn is_overdue(&self, now: &DateTime<Utc>) -> bool {
        now > &self.expires_at
    }

    pub fn distance_to_m(&self, coord: &Coord<f64>) -> f64 {
        geo_ops::haversine_m(&self.position, coord)
    }

    pub fn distance_to_destination_m(&self, coord: &Coord<f64>) -> f64 {
        geo_ops::haversine_m(&self.destination, coord)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn test_expiry_is_strict() {
        let t0 = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        let commuter = Commuter {
            id: CommuterId(1),
            position: Coord { x: 0.0, y: 0.0 },
            destination: Coord { x: 0.0, y: 0.01 },
            owner: ReservoirId::Depot(String::from("d")),
            direction: Direction::Outbound,
            priority: 0,
            spawned_at: t0,
            expires_at: t0 + TimeDelta::seconds(1800),
            state: CommuterState::WaitingToBoard,
            vehicle_id: None,
            trip_length_m: None,
        };
        assert!(!commuter.is_overdue(&(t0 + TimeDelta::seconds(1800))));
        assert!(commuter.is_overdue(&(t0 + TimeDelta::seconds(1801))));
    }
}
