use super::{DensityError, DensitySource};
use geo::Coord;
use riderflow_route::util::geo_ops;
use rstar::{primitives::GeomWithData, RTree};
use serde::Deserialize;

/// meters per degree of latitude on the mean earth sphere
const METERS_PER_DEGREE: f64 = 111_195.0;

type ProjectedPoint = GeomWithData<[f64; 2], Coord<f64>>;

#[derive(Debug, Deserialize)]
struct PointRow {
    lon: f64,
    lat: f64,
}

/// counts demand points within a radius. points are indexed in an
/// equirectangular projection (meters) and candidates are confirmed by
/// great-circle distance.
#[derive(Debug)]
pub struct PointDensity {
    name: String,
    tree: RTree<ProjectedPoint>,
    lon_scale: f64,
}

impl PointDensity {
    pub fn new(name: &str, points: Vec<Coord<f64>>) -> Result<PointDensity, DensityError> {
        if let Some(bad) = points.iter().find(|c| !geo_ops::is_valid_wgs84(c)) {
            return Err(DensityError::InvalidInput(format!(
                "density point ({}, {}) is not a valid WGS84 coordinate",
                bad.x, bad.y
            )));
        }
        let mean_lat = if points.is_empty() {
            0.0
        } else {
            points.iter().map(|c| c.y).sum::<f64>() / points.len() as f64
        };
        let lon_scale = mean_lat.to_radians().cos().abs().max(1e-6);
        let projected = points
            .into_iter()
            .map(|c| GeomWithData::new(project(&c, lon_scale), c))
            .collect::<Vec<_>>();
        Ok(PointDensity {
            name: name.to_string(),
            tree: RTree::bulk_load(projected),
            lon_scale,
        })
    }

    /// reads a csv file with `lon` and `lat` columns
    pub fn from_csv(name: &str, file: &str) -> Result<PointDensity, DensityError> {
        let mut reader = csv::Reader::from_path(file)
            .map_err(|e| DensityError::ReadError(file.to_string(), e.to_string()))?;
        let mut points = vec![];
        for (idx, row) in reader.deserialize::<PointRow>().enumerate() {
            let row = row.map_err(|e| {
                DensityError::ReadError(file.to_string(), format!("row {idx}: {e}"))
            })?;
            points.push(Coord {
                x: row.lon,
                y: row.lat,
            });
        }
        log::info!("loaded {} density points for '{name}' from {file}", points.len());
        PointDensity::new(name, points)
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

fn project(coord: &Coord<f64>, lon_scale: f64) -> [f64; 2] {
    [
        coord.x * lon_scale * METERS_PER_DEGREE,
        coord.y * METERS_PER_DEGREE,
    ]
}

impl DensitySource for PointDensity {
    fn name(&self) -> &str {
        &self.name
    }

    fn count_within(&self, lat: f64, lon: f64, radius_m: f64) -> Result<u64, DensityError> {
        let query = Coord { x: lon, y: lat };
        if !geo_ops::is_valid_wgs84(&query) {
            return Err(DensityError::InvalidInput(format!(
                "query ({lon}, {lat}) is not a valid WGS84 coordinate"
            )));
        }
        if !radius_m.is_finite() || radius_m < 0.0 {
            return Err(DensityError::InvalidInput(format!(
                "radius {radius_m} must be finite and non-negative"
            )));
        }
        // the projection distorts away from the mean latitude, so the planar
        // search is widened before the exact filter
        let search = radius_m * 1.25 + 1.0;
        let count = self
            .tree
            .locate_within_distance(project(&query, self.lon_scale), search * search)
            .filter(|p| geo_ops::haversine_m(&query, &p.data) <= radius_m)
            .count();
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_within_radius() {
        // points every ~111 m northward
        let points = (0..10)
            .map(|i| Coord {
                x: -105.0,
                y: 39.7 + i as f64 * 0.001,
            })
            .collect();
        let density = PointDensity::new("buildings", points).unwrap();
        assert_eq!(density.len(), 10);
        assert_eq!(density.count_within(39.7, -105.0, 50.0).unwrap(), 1);
        assert_eq!(density.count_within(39.7, -105.0, 250.0).unwrap(), 3);
        assert_eq!(density.count_within(39.7045, -105.0, 10_000.0).unwrap(), 10);
        assert_eq!(density.count_within(0.0, 0.0, 1_000.0).unwrap(), 0);
    }

    #[test]
    fn test_invalid_input() {
        let density = PointDensity::new("empty", vec![]).unwrap();
        assert!(density.is_empty());
        assert!(density.count_within(95.0, 0.0, 10.0).is_err());
        assert!(density.count_within(0.0, 0.0, -1.0).is_err());
        assert!(PointDensity::new("bad", vec![Coord { x: 200.0, y: 0.0 }]).is_err());
    }
}
