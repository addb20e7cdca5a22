use super::{RouteError, RouteNodeKey};
use crate::util::geo_ops;
use geo::{Coord, LineString};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// the reconstructed backbone polyline of a route. immutable once built; the
/// opposite direction of travel is available via [`OrderedRoute::reversed`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderedRoute {
    points: Vec<Coord<f64>>,
}

impl OrderedRoute {
    /// creates a route from an ordered point sequence. points are rounded to
    /// node precision and consecutive duplicates are removed.
    ///
    /// # Returns
    ///
    /// the route, or an error if any point is not a valid WGS84 coordinate
    /// or fewer than two distinct points remain.
    pub fn new(points: Vec<Coord<f64>>) -> Result<OrderedRoute, RouteError> {
        if let Some(bad) = points.iter().find(|c| !geo_ops::is_valid_wgs84(c)) {
            return Err(RouteError::InvalidGeometry(format!(
                "route point ({}, {}) is not a valid WGS84 coordinate",
                bad.x, bad.y
            )));
        }
        let deduped = points
            .iter()
            .map(RouteNodeKey::from_coord)
            .dedup()
            .map(|k| k.to_coord())
            .collect_vec();
        if deduped.len() < 2 {
            return Err(RouteError::InvalidGeometry(format!(
                "route requires at least two distinct points, found {}",
                deduped.len()
            )));
        }
        Ok(OrderedRoute { points: deduped })
    }

    pub fn points(&self) -> &[Coord<f64>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// always false, a route holds at least two points
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> &Coord<f64> {
        &self.points[0]
    }

    pub fn last(&self) -> &Coord<f64> {
        &self.points[self.points.len() - 1]
    }

    /// total great-circle length of the backbone in meters
    pub fn length_m(&self) -> f64 {
        geo_ops::polyline_length_m(&self.points)
    }

    /// the same backbone traversed in the opposite direction
    pub fn reversed(&self) -> OrderedRoute {
        let mut points = self.points.clone();
        points.reverse();
        OrderedRoute { points }
    }

    pub fn to_linestring(&self) -> LineString<f64> {
        LineString::new(self.points.clone())
    }
}
