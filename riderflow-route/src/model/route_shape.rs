use super::RouteNodeKey;
use crate::util::geo_ops;
use geo::{Coord, LineString};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// a single raw polyline of route geometry. shapes may arrive unordered and
/// fragmented; when the source annotates them with a name or an ordering
/// they are carried along for the stitching strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteShape {
    pub name: Option<String>,
    pub order: Option<u32>,
    pub line: LineString<f64>,
}

impl RouteShape {
    pub fn new(line: LineString<f64>) -> RouteShape {
        RouteShape {
            name: None,
            order: None,
            line,
        }
    }

    /// builds an unnamed shape from (lon, lat) pairs
    pub fn from_lon_lat(points: &[(f64, f64)]) -> RouteShape {
        let line = LineString::from(points.to_vec());
        RouteShape::new(line)
    }

    pub fn with_name(mut self, name: &str) -> RouteShape {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_order(mut self, order: u32) -> RouteShape {
        self.order = Some(order);
        self
    }

    /// the valid coordinates of this shape rounded to node precision, with
    /// consecutive duplicates removed.
    pub fn rounded_coords(&self) -> Vec<Coord<f64>> {
        self.line
            .coords()
            .filter(|c| geo_ops::is_valid_wgs84(c))
            .map(RouteNodeKey::from_coord)
            .dedup()
            .map(|k| k.to_coord())
            .collect_vec()
    }

    /// a shape is usable if it contributes at least one edge after rounding.
    pub fn is_usable(&self) -> bool {
        self.rounded_coords().len() >= 2
    }
}
