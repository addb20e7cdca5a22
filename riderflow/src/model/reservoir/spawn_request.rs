use crate::model::commuter::Direction;
use chrono::{DateTime, Utc};
use geo::Coord;

/// a commuter to be created by a reservoir
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnRequest {
    pub position: Coord<f64>,
    pub destination: Coord<f64>,
    pub direction: Direction,
    pub priority: u8,
    pub now: DateTime<Utc>,
    /// along-route distances of position and destination when the trip was
    /// sampled along the route. without them both points are placed at their
    /// nearest route vertex.
    pub along_route_m: Option<(f64, f64)>,
}

impl SpawnRequest {
    pub fn new(
        position: Coord<f64>,
        destination: Coord<f64>,
        direction: Direction,
        now: DateTime<Utc>,
    ) -> SpawnRequest {
        SpawnRequest {
            position,
            destination,
            direction,
            priority: 0,
            now,
            along_route_m: None,
        }
    }

    pub fn with_along_route(mut self, origin_m: f64, destination_m: f64) -> SpawnRequest {
        self.along_route_m = Some((origin_m, destination_m));
        self
    }

    pub fn with_priority(mut self, priority: u8) -> SpawnRequest {
        self.priority = priority;
        self
    }
}
