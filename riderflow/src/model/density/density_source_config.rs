use super::{ConstantDensity, DensityError, DensitySource, PointDensity};
use geo::Coord;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// manifest entry selecting a density source implementation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum DensitySourceConfig {
    Constant { count: u64 },
    /// inline (lon, lat) pairs
    Points { points: Vec<[f64; 2]> },
    /// csv file with lon and lat columns
    PointCsv { file: String },
}

impl DensitySourceConfig {
    pub fn build(&self, name: &str) -> Result<Arc<dyn DensitySource>, DensityError> {
        match self {
            DensitySourceConfig::Constant { count } => {
                Ok(Arc::new(ConstantDensity::new(name, *count)))
            }
            DensitySourceConfig::Points { points } => {
                let coords = points.iter().map(|[x, y]| Coord { x: *x, y: *y }).collect();
                Ok(Arc::new(PointDensity::new(name, coords)?))
            }
            DensitySourceConfig::PointCsv { file } => {
                Ok(Arc::new(PointDensity::from_csv(name, file)?))
            }
        }
    }
}
