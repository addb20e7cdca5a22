use super::DensityError;

/// a count of demand generators (buildings, points of interest) around a
/// location. implementations may be remote and may fail.
pub trait DensitySource: Send + Sync {
    fn name(&self) -> &str;

    fn count_within(&self, lat: f64, lon: f64, radius_m: f64) -> Result<u64, DensityError>;
}
