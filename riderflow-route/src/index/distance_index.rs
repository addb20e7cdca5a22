use super::NearestPoint;
use crate::model::OrderedRoute;
use crate::util::geo_ops;
use geo::Coord;
use itertools::Itertools;
use rstar::{primitives::GeomWithData, RTree};

type ProjectedVertex = GeomWithData<[f64; 2], usize>;

/// number of planar nearest candidates refined by great-circle distance
const NEAREST_CANDIDATES: usize = 8;
/// routes with at most this many vertices are searched exhaustively
const EXHAUSTIVE_SEARCH_VERTICES: usize = 256;

/// along-route distance oracle for one [`OrderedRoute`]. built once per
/// route geometry and shared read-only afterwards.
#[derive(Debug)]
pub struct DistanceIndex {
    route: OrderedRoute,
    /// cumulative great-circle distance from the first point to point i
    cum: Vec<f64>,
    /// route vertices in an equirectangular projection scaled at the mean latitude
    rtree: RTree<ProjectedVertex>,
    lon_scale: f64,
}

impl DistanceIndex {
    pub fn new(route: OrderedRoute) -> DistanceIndex {
        let mut cum = Vec::with_capacity(route.len());
        cum.push(0.0);
        for (a, b) in route.points().iter().tuple_windows() {
            let prev = cum.last().copied().unwrap_or_default();
            cum.push(prev + geo_ops::haversine_m(a, b));
        }

        let mean_lat = route.points().iter().map(|c| c.y).sum::<f64>() / route.len() as f64;
        let lon_scale = mean_lat.to_radians().cos().abs().max(1e-6);
        let vertices = route
            .points()
            .iter()
            .enumerate()
            .map(|(idx, c)| GeomWithData::new([c.x * lon_scale, c.y], idx))
            .collect_vec();
        let rtree = RTree::bulk_load(vertices);

        DistanceIndex {
            route,
            cum,
            rtree,
            lon_scale,
        }
    }

    pub fn route(&self) -> &OrderedRoute {
        &self.route
    }

    /// cumulative distances, non-decreasing and strictly increasing between distinct points
    pub fn cumulative_distances(&self) -> &[f64] {
        &self.cum
    }

    pub fn total_length_m(&self) -> f64 {
        self.cum.last().copied().unwrap_or_default()
    }

    /// finds the route vertex closest to a point by great-circle distance;
    /// ties resolve to the lower vertex index.
    ///
    /// short routes are scanned exhaustively. longer routes take candidates
    /// from a planar index whose longitudes are scaled at the mean route
    /// latitude; when a route spans a wide latitude range that scaling
    /// distorts distances far from the mean, and the exact nearest vertex
    /// can be missed in favor of a slightly farther one.
    pub fn nearest_point(&self, lat: f64, lon: f64) -> NearestPoint {
        let query = Coord { x: lon, y: lat };
        let with_distance =
            |idx: usize| (idx, geo_ops::haversine_m(&query, &self.route.points()[idx]));
        let closest = |(ia, da): &(usize, f64), (ib, db): &(usize, f64)| {
            da.total_cmp(db).then_with(|| ia.cmp(ib))
        };
        let nearest = if self.route.len() <= EXHAUSTIVE_SEARCH_VERTICES {
            (0..self.route.len()).map(with_distance).min_by(closest)
        } else {
            let projected = [lon * self.lon_scale, lat];
            self.rtree
                .nearest_neighbor_iter(&projected)
                .take(NEAREST_CANDIDATES)
                .map(|v| with_distance(v.data))
                .min_by(closest)
        };
        match nearest {
            Some((index, distance_to_route_m)) => NearestPoint {
                index,
                distance_to_route_m,
            },
            // the tree always holds at least two vertices
            None => NearestPoint {
                index: 0,
                distance_to_route_m: geo_ops::haversine_m(&query, self.route.first()),
            },
        }
    }

    /// position of a point along the route: the cumulative distance of its nearest vertex.
    pub fn distance_along(&self, lat: f64, lon: f64) -> f64 {
        let nearest = self.nearest_point(lat, lon);
        self.cum[nearest.index]
    }

    /// distance along the route of a (lon, lat) coordinate
    pub fn distance_along_coord(&self, coord: &Coord<f64>) -> f64 {
        self.distance_along(coord.y, coord.x)
    }

    /// tests whether a destination lies strictly ahead of an origin in the
    /// digitized direction of the route.
    pub fn is_ahead(&self, origin: &Coord<f64>, destination: &Coord<f64>) -> bool {
        self.distance_along_coord(destination) > self.distance_along_coord(origin)
    }

    /// trip length measured along the route between two points. along-route
    /// distance is the authoritative trip length, never straight-line distance.
    pub fn trip_length_m(&self, origin: &Coord<f64>, destination: &Coord<f64>) -> f64 {
        (self.distance_along_coord(destination) - self.distance_along_coord(origin)).abs()
    }

    /// the point at some distance along the route, clamped to the route ends
    /// and linearly interpolated between vertices.
    pub fn point_at_distance(&self, distance_m: f64) -> Coord<f64> {
        let points = self.route.points();
        if distance_m <= 0.0 {
            return points[0];
        }
        if distance_m >= self.total_length_m() {
            return points[points.len() - 1];
        }
        // first index with cum > distance_m
        let upper = self.cum.partition_point(|d| *d <= distance_m);
        let lower = upper.saturating_sub(1);
        let span = self.cum[upper] - self.cum[lower];
        let ratio = if span > 0.0 {
            (distance_m - self.cum[lower]) / span
        } else {
            0.0
        };
        geo_ops::interpolate(&points[lower], &points[upper], ratio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_route() -> OrderedRoute {
        OrderedRoute::new(vec![
            Coord { x: -105.00, y: 39.70 },
            Coord { x: -105.00, y: 39.71 },
            Coord { x: -105.01, y: 39.72 },
            Coord { x: -105.02, y: 39.72 },
            Coord { x: -105.03, y: 39.73 },
        ])
        .unwrap()
    }

    #[test]
    fn test_cumulative_strictly_increasing() {
        let index = DistanceIndex::new(sample_route());
        let cum = index.cumulative_distances();
        assert_eq!(cum[0], 0.0);
        assert!(cum.iter().tuple_windows().all(|(a, b)| b > a));
        assert!((index.total_length_m() - index.route().length_m()).abs() < 1e-6);
    }

    #[test]
    fn test_nearest_point_is_exact_vertex() {
        let index = DistanceIndex::new(sample_route());
        let near = index.nearest_point(39.72, -105.02);
        assert_eq!(near.index, 3);
        assert!(near.distance_to_route_m < 1e-6);

        // slightly off the route near the second vertex
        let off = index.nearest_point(39.7101, -105.0002);
        assert_eq!(off.index, 1);
        assert!(off.distance_to_route_m > 0.0 && off.distance_to_route_m < 50.0);
    }

    #[test]
    fn test_nearest_matches_brute_force() {
        let index = DistanceIndex::new(sample_route());
        for (lat, lon) in [(39.705, -105.004), (39.725, -105.028), (39.69, -104.99)] {
            let q = Coord { x: lon, y: lat };
            let brute = index
                .route()
                .points()
                .iter()
                .enumerate()
                .map(|(i, c)| (i, geo_ops::haversine_m(&q, c)))
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .unwrap();
            assert_eq!(index.nearest_point(lat, lon).index, brute.0);
        }
    }

    fn brute_force_nearest(index: &DistanceIndex, lat: f64, lon: f64) -> usize {
        let q = Coord { x: lon, y: lat };
        index
            .route()
            .points()
            .iter()
            .enumerate()
            .map(|(i, c)| (i, geo_ops::haversine_m(&q, c)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap()
            .0
    }

    #[test]
    fn test_nearest_on_wide_latitude_span() {
        // from the equator to the arctic, with a sideways zig-zag
        let points = (0..=70)
            .map(|i| Coord {
                x: if i % 2 == 0 { 0.0 } else { 3.0 },
                y: i as f64,
            })
            .collect();
        let index = DistanceIndex::new(OrderedRoute::new(points).unwrap());
        for (lat, lon) in [(69.6, 1.6), (68.4, 1.4), (1.2, 1.6), (35.5, 2.9), (60.0, -1.0)] {
            assert_eq!(
                index.nearest_point(lat, lon).index,
                brute_force_nearest(&index, lat, lon),
                "query ({lat}, {lon})"
            );
        }
    }

    #[test]
    fn test_long_route_uses_planar_candidates() {
        let points = (0..1000)
            .map(|i| Coord {
                x: -105.0 + i as f64 * 0.0005,
                y: 39.7 + (i % 7) as f64 * 0.0001,
            })
            .collect();
        let index = DistanceIndex::new(OrderedRoute::new(points).unwrap());
        for (lat, lon) in [(39.7003, -104.8), (39.701, -104.9501), (39.69, -105.01)] {
            assert_eq!(
                index.nearest_point(lat, lon).index,
                brute_force_nearest(&index, lat, lon)
            );
        }
    }

    #[test]
    fn test_direction_and_trip_length() {
        let index = DistanceIndex::new(sample_route());
        let origin = Coord { x: -105.00, y: 39.71 };
        let dest = Coord { x: -105.02, y: 39.72 };
        assert!(index.is_ahead(&origin, &dest));
        assert!(!index.is_ahead(&dest, &origin));
        let expected = index.cumulative_distances()[3] - index.cumulative_distances()[1];
        assert!((index.trip_length_m(&origin, &dest) - expected).abs() < 1e-9);
        assert!((index.trip_length_m(&dest, &origin) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_point_at_distance() {
        let index = DistanceIndex::new(sample_route());
        let cum = index.cumulative_distances().to_vec();
        assert_eq!(index.point_at_distance(-5.0), *index.route().first());
        assert_eq!(index.point_at_distance(1e9), *index.route().last());
        assert_eq!(index.point_at_distance(cum[2]), index.route().points()[2]);
        let mid = index.point_at_distance(cum[0] + (cum[1] - cum[0]) / 2.0);
        assert!((mid.y - 39.705).abs() < 1e-9);
    }
}
