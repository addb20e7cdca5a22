use serde::{Deserialize, Serialize};

/// the route vertex closest to a query point. this is a nearest-vertex
/// approximation of the distance to the route, not a projection onto the
/// nearest segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NearestPoint {
    /// index of the vertex in the ordered route
    pub index: usize,
    /// great-circle distance from the query point to that vertex
    pub distance_to_route_m: f64,
}
