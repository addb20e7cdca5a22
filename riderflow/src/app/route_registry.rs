use crate::{
    config::RouteConfig,
    model::event::{EventBus, HealthEvent, HealthStatus},
};
use chrono::Utc;
use itertools::Itertools;
use rayon::prelude::*;
use riderflow_route::{
    algorithm::{GeometryQualityReport, RouteTopologyBuilder, TopologyStrategy},
    index::DistanceIndex,
    model::{RouteError, RouteGeometry},
};
use std::{collections::HashMap, sync::Arc};

/// a route whose backbone and distance index have been built. frozen after
/// registration and shared read-only by every reservoir of the route.
#[derive(Debug)]
pub struct RegisteredRoute {
    pub id: String,
    pub index: Arc<DistanceIndex>,
    pub report: GeometryQualityReport,
    pub segment_resolution: u8,
}

impl RegisteredRoute {
    pub fn build(
        geometry: &RouteGeometry,
        builder: &RouteTopologyBuilder,
        segment_resolution: u8,
    ) -> Result<RegisteredRoute, RouteError> {
        let topology = builder.build_geometry(geometry)?;
        let index = DistanceIndex::new(topology.route);
        log::info!(
            "registered route '{}' with {} points over {:.1}m",
            geometry.route_id,
            index.route().len(),
            index.total_length_m()
        );
        Ok(RegisteredRoute {
            id: geometry.route_id.clone(),
            index: Arc::new(index),
            report: topology.report,
            segment_resolution,
        })
    }
}

/// the built routes of a simulation by id
#[derive(Debug, Default)]
pub struct RouteRegistry {
    routes: HashMap<String, Arc<RegisteredRoute>>,
}

impl RouteRegistry {
    /// loads and builds every configured route. a route that fails is logged
    /// and reported as a health event; the remaining routes still register.
    pub fn register(
        routes: &[RouteConfig],
        strategy: TopologyStrategy,
        parallelize: bool,
        bus: &EventBus,
    ) -> (RouteRegistry, Vec<(String, RouteError)>) {
        let builder = RouteTopologyBuilder::new(strategy);
        let build_one = |conf: &RouteConfig| {
            let result = RouteGeometry::from_geojson_file(&conf.id, &conf.geometry_file)
                .and_then(|g| RegisteredRoute::build(&g, &builder, conf.segment_resolution));
            (conf.id.clone(), result)
        };
        let results: Vec<(String, Result<RegisteredRoute, RouteError>)> = if parallelize {
            routes.par_iter().map(build_one).collect()
        } else {
            routes.iter().map(build_one).collect()
        };

        let mut registry = RouteRegistry::default();
        let mut failures = vec![];
        for (id, result) in results.into_iter() {
            match result {
                Ok(route) => registry.insert(route),
                Err(e) => {
                    log::error!("route '{id}' failed to register: {e}");
                    let component = format!("route/{id}");
                    bus.publish(HealthEvent::new(
                        &component,
                        HealthStatus::Failed,
                        e.to_string(),
                        Utc::now(),
                    ));
                    failures.push((id, e));
                }
            }
        }
        (registry, failures)
    }

    pub fn insert(&mut self, route: RegisteredRoute) {
        self.routes.insert(route.id.clone(), Arc::new(route));
    }

    pub fn get(&self, id: &str) -> Option<Arc<RegisteredRoute>> {
        self.routes.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// route ids in sorted order
    pub fn ids(&self) -> Vec<String> {
        self.routes.keys().cloned().sorted().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::DEFAULT_SEGMENT_RESOLUTION, model::event::{EventTopic, SimulationEvent}};
    use std::io::Write;

    const GEOJSON: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {},
             "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0], [0.0, 0.01]]}},
            {"type": "Feature", "properties": {},
             "geometry": {"type": "LineString", "coordinates": [[0.0, 0.01], [0.0, 0.02]]}}
        ]
    }"#;

    #[test]
    fn test_failed_route_does_not_block_others() {
        let dir = std::env::temp_dir().join(format!("riderflow-registry-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let good = dir.join("good.geojson");
        std::fs::File::create(&good)
            .unwrap()
            .write_all(GEOJSON.as_bytes())
            .unwrap();
        let configs = vec![
            RouteConfig {
                id: String::from("good"),
                geometry_file: good.to_string_lossy().to_string(),
                segment_resolution: DEFAULT_SEGMENT_RESOLUTION,
            },
            RouteConfig {
                id: String::from("missing"),
                geometry_file: dir.join("missing.geojson").to_string_lossy().to_string(),
                segment_resolution: DEFAULT_SEGMENT_RESOLUTION,
            },
        ];
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe(EventTopic::SystemHealth);
        let (registry, failures) =
            RouteRegistry::register(&configs, TopologyStrategy::default(), true, &bus);
        assert_eq!(registry.ids(), vec![String::from("good")]);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "missing");
        let route = registry.get("good").unwrap();
        assert!((route.index.total_length_m() - 2_223.9).abs() < 1.0);
        match rx.try_recv().unwrap() {
            SimulationEvent::Health(h) => {
                assert_eq!(h.component, "route/missing");
                assert_eq!(h.status, HealthStatus::Failed);
            }
            other => panic!("unexpected event {other:?}"),
        }
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
