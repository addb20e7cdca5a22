use super::stitching::StitchedRoute;
use crate::model::OrderedRoute;
use geo::{Coord, LineString};
use serde::{Deserialize, Serialize};
use wkt::ToWkt;

/// a geometry-quality problem found while reconstructing a route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum GeometryWarning {
    /// the two reconstruction strategies disagree on total length
    LengthMismatch {
        diameter_m: f64,
        stitched_m: f64,
        difference_m: f64,
    },
    /// consecutive stitched points are further apart than the seam threshold
    Seam {
        from: Coord<f64>,
        to: Coord<f64>,
        gap_m: f64,
    },
}

impl std::fmt::Display for GeometryWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryWarning::LengthMismatch {
                diameter_m,
                stitched_m,
                difference_m,
            } => write!(
                f,
                "length mismatch of {difference_m:.1}m (diameter {diameter_m:.1}m, stitched {stitched_m:.1}m)"
            ),
            GeometryWarning::Seam { from, to, gap_m } => {
                let line = LineString::new(vec![*from, *to]);
                write!(f, "seam of {gap_m:.1}m at {}", line.wkt_string())
            }
        }
    }
}

/// summary of the geometry checks performed while building a route
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeometryQualityReport {
    pub seam_threshold_m: f64,
    /// length of disconnected geometry dropped by the diameter strategy
    pub discarded_length_m: f64,
    pub warnings: Vec<GeometryWarning>,
}

impl GeometryQualityReport {
    pub fn new(seam_threshold_m: f64) -> GeometryQualityReport {
        GeometryQualityReport {
            seam_threshold_m,
            discarded_length_m: 0.0,
            warnings: vec![],
        }
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// adds a Seam warning for each stitched join wider than the threshold
    pub fn check_seams(&mut self, stitched: &StitchedRoute) {
        for join in stitched.joins.iter() {
            if join.gap_m > self.seam_threshold_m {
                self.warnings.push(GeometryWarning::Seam {
                    from: join.from,
                    to: join.to,
                    gap_m: join.gap_m,
                });
            }
        }
    }

    /// compares the diameter backbone against the stitched result
    pub fn cross_check(&mut self, diameter: &OrderedRoute, stitched: &StitchedRoute) {
        let diameter_m = diameter.length_m();
        let difference_m = (diameter_m - stitched.length_m).abs();
        if difference_m > self.seam_threshold_m {
            self.warnings.push(GeometryWarning::LengthMismatch {
                diameter_m,
                stitched_m: stitched.length_m,
                difference_m,
            });
        }
        self.check_seams(stitched);
    }

    pub fn log_warnings(&self, route_id: &str) {
        for warning in self.warnings.iter() {
            log::warn!("route '{route_id}' geometry quality: {warning}");
        }
    }
}
