use super::{diameter, stitching, GeometryQualityReport, TopologyStrategy};
use crate::model::{OrderedRoute, RouteError, RouteGeometry, RouteShape};

/// an ordered backbone together with the geometry checks made while building it
#[derive(Debug, Clone)]
pub struct RouteTopology {
    pub route: OrderedRoute,
    pub report: GeometryQualityReport,
}

/// reconstructs a single ordered route polyline from unordered, possibly
/// fragmented shapes using the configured [`TopologyStrategy`].
#[derive(Debug, Clone, Default)]
pub struct RouteTopologyBuilder {
    pub strategy: TopologyStrategy,
}

impl RouteTopologyBuilder {
    pub fn new(strategy: TopologyStrategy) -> RouteTopologyBuilder {
        RouteTopologyBuilder { strategy }
    }

    /// builds the backbone of the designated default variant of a route.
    pub fn build_geometry(&self, geometry: &RouteGeometry) -> Result<RouteTopology, RouteError> {
        let variant = geometry.default_variant()?;
        let topology = self.build(&variant.shapes)?;
        topology.report.log_warnings(&geometry.route_id);
        Ok(topology)
    }

    /// builds the ordered backbone from raw shapes.
    ///
    /// # Returns
    ///
    /// the route and its quality report, or [`RouteError::EmptyGeometry`] when
    /// zero usable shapes are supplied.
    pub fn build(&self, shapes: &[RouteShape]) -> Result<RouteTopology, RouteError> {
        let mut report = GeometryQualityReport::new(self.strategy.seam_threshold_m());
        match self.strategy {
            TopologyStrategy::GraphDiameter { .. } => {
                let result = diameter::graph_diameter(shapes)?;
                report.discarded_length_m = result.discarded_length_m;
                Ok(RouteTopology {
                    route: result.route,
                    report,
                })
            }
            TopologyStrategy::GreedyStitch { .. } => {
                let stitched = stitching::greedy_stitch(shapes)?;
                report.check_seams(&stitched);
                let route = OrderedRoute::new(stitched.points)?;
                Ok(RouteTopology { route, report })
            }
            TopologyStrategy::CrossChecked { .. } => {
                let result = diameter::graph_diameter(shapes)?;
                report.discarded_length_m = result.discarded_length_m;
                match stitching::greedy_stitch(shapes) {
                    Ok(stitched) => report.cross_check(&result.route, &stitched),
                    Err(e) => log::warn!("cross-check skipped, stitching failed: {e}"),
                }
                Ok(RouteTopology {
                    route: result.route,
                    report,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::GeometryWarning;

    fn chain() -> Vec<RouteShape> {
        vec![
            RouteShape::from_lon_lat(&[(0.0, 0.0), (0.0, 0.01)]).with_name("a"),
            RouteShape::from_lon_lat(&[(0.0, 0.01), (0.0, 0.02)]).with_name("b"),
            RouteShape::from_lon_lat(&[(0.0, 0.02), (0.0, 0.03)]).with_name("c"),
        ]
    }

    #[test]
    fn test_strategies_agree_on_clean_geometry() {
        let diameter = RouteTopologyBuilder::new(TopologyStrategy::GraphDiameter {
            seam_threshold_m: 500.0,
        })
        .build(&chain())
        .unwrap();
        let stitched = RouteTopologyBuilder::new(TopologyStrategy::GreedyStitch {
            seam_threshold_m: 500.0,
        })
        .build(&chain())
        .unwrap();
        assert_eq!(diameter.route, stitched.route);

        let checked = RouteTopologyBuilder::default().build(&chain()).unwrap();
        assert!(checked.report.is_clean());
    }

    #[test]
    fn test_cross_check_reports_seam_and_length() {
        // two chunks separated by a ~2.2km gap
        let shapes = vec![
            RouteShape::from_lon_lat(&[(0.0, 0.0), (0.0, 0.05)]),
            RouteShape::from_lon_lat(&[(0.0, 0.07), (0.0, 0.1)]),
        ];
        let topology = RouteTopologyBuilder::default().build(&shapes).unwrap();
        let warnings = &topology.report.warnings;
        assert!(warnings
            .iter()
            .any(|w| matches!(w, GeometryWarning::Seam { gap_m, .. } if *gap_m > 2_000.0)));
        assert!(warnings
            .iter()
            .any(|w| matches!(w, GeometryWarning::LengthMismatch { .. })));
        // the diameter backbone keeps only the longer chunk
        assert!((topology.report.discarded_length_m - 3_335.9).abs() < 1.0);
        assert_eq!(topology.route.len(), 2);
    }

    #[test]
    fn test_empty_input_fails() {
        let result = RouteTopologyBuilder::default().build(&[]);
        assert!(matches!(result, Err(RouteError::EmptyGeometry)));
    }
}
