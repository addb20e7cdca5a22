use geo::Coord;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// coordinates are rounded to 1e-6 degrees (~0.1 meters) before they are
/// used as graph nodes, which consolidates near-duplicate segment endpoints.
pub const COORDINATE_PRECISION: f64 = 1_000_000.0;

/// a rounded (lon, lat) coordinate usable as a hash key. since floating point
/// values have no total ordering in Rust, we scale and convert to i64, which is
/// a feasible bijection at this precision since WGS84 values are within +- 180.
#[derive(
    Debug, Default, Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Deserialize, Serialize, Hash,
)]
pub struct RouteNodeKey(pub i64, pub i64);

impl RouteNodeKey {
    pub fn from_coord(coord: &Coord<f64>) -> RouteNodeKey {
        let x = (coord.x * COORDINATE_PRECISION).round() as i64;
        let y = (coord.y * COORDINATE_PRECISION).round() as i64;
        RouteNodeKey(x, y)
    }

    /// the rounded coordinate this key represents
    pub fn to_coord(&self) -> Coord<f64> {
        Coord {
            x: self.0 as f64 / COORDINATE_PRECISION,
            y: self.1 as f64 / COORDINATE_PRECISION,
        }
    }
}

impl Display for RouteNodeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let c = self.to_coord();
        write!(f, "({:.6}, {:.6})", c.x, c.y)
    }
}
