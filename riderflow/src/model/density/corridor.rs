//! sample locations used to measure the spatial weight of a route corridor.
use geo::Coord;
use riderflow_route::index::DistanceIndex;

/// points at the middle of each `spacing_m` stretch of the route. a route
/// shorter than the spacing yields its midpoint.
pub fn corridor_samples(index: &DistanceIndex, spacing_m: f64) -> Vec<Coord<f64>> {
    let total = index.total_length_m();
    if !(spacing_m.is_finite() && spacing_m > 0.0) || total <= spacing_m {
        return vec![index.point_at_distance(total / 2.0)];
    }
    let n = (total / spacing_m).ceil() as usize;
    (0..n)
        .map(|i| {
            let start = i as f64 * spacing_m;
            let end = (start + spacing_m).min(total);
            index.point_at_distance((start + end) / 2.0)
        })
        .collect()
}
