use geo::{Coord, Distance, Haversine, Point};
use itertools::Itertools;

/// great-circle distance in meters between two WGS84 (lon, lat) coordinates.
pub fn haversine_m(a: &Coord<f64>, b: &Coord<f64>) -> f64 {
    Haversine.distance(Point::from(*a), Point::from(*b))
}

/// sum of great-circle distances between consecutive points of a polyline.
pub fn polyline_length_m(points: &[Coord<f64>]) -> f64 {
    points
        .iter()
        .tuple_windows()
        .map(|(a, b)| haversine_m(a, b))
        .sum()
}

/// linear interpolation between two coordinates. at the scale of a single
/// route vertex spacing the difference from a geodesic interpolation is negligible.
pub fn interpolate(a: &Coord<f64>, b: &Coord<f64>, ratio: f64) -> Coord<f64> {
    let r = ratio.clamp(0.0, 1.0);
    Coord {
        x: a.x + (b.x - a.x) * r,
        y: a.y + (b.y - a.y) * r,
    }
}

/// tests whether a (lon, lat) pair is a usable WGS84 coordinate.
pub fn is_valid_wgs84(coord: &Coord<f64>) -> bool {
    coord.x.is_finite()
        && coord.y.is_finite()
        && (-180.0..=180.0).contains(&coord.x)
        && (-90.0..=90.0).contains(&coord.y)
}
