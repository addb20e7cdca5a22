use super::{ConfigurationError, SpawnConfig};
use crate::model::{
    density::{DensitySourceConfig, ResilienceConfig},
    event::PersistenceConfig,
};
use riderflow_route::algorithm::TopologyStrategy;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

pub const DEFAULT_SEGMENT_RESOLUTION: u8 = 9;

fn default_segment_resolution() -> u8 {
    DEFAULT_SEGMENT_RESOLUTION
}

/// a route served by the simulation, read from a GeoJSON geometry source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteConfig {
    pub id: String,
    pub geometry_file: String,
    /// h3 resolution of the route segment cells
    #[serde(default = "default_segment_resolution")]
    pub segment_resolution: u8,
}

/// a fixed terminal that spawns outbound riders for a route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepotConfig {
    pub id: String,
    pub route_id: String,
    pub lon: f64,
    pub lat: f64,
}

/// global spawn defaults and per route or depot overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnSection {
    pub default: SpawnConfig,
    pub overrides: HashMap<String, SpawnConfig>,
}

/// top-level run configuration of a simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// simulated seconds per wall-clock second
    pub time_scale: f64,
    pub topology_strategy: TopologyStrategy,
    /// build route topologies in parallel
    pub parallelize: bool,
    /// capacity of each event topic channel
    pub event_channel_capacity: usize,
    pub persistence: PersistenceConfig,
    pub density_sources: HashMap<String, DensitySourceConfig>,
    pub density_resilience: ResilienceConfig,
    pub routes: Vec<RouteConfig>,
    pub depots: Vec<DepotConfig>,
    pub spawn: SpawnSection,
    /// seed for spawn sampling. unseeded runs draw from system entropy.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            topology_strategy: TopologyStrategy::default(),
            parallelize: true,
            event_channel_capacity: 1024,
            persistence: PersistenceConfig::default(),
            density_sources: HashMap::new(),
            density_resilience: ResilienceConfig::default(),
            routes: vec![],
            depots: vec![],
            spawn: SpawnSection::default(),
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// checks the relationships between sections that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.time_scale.is_finite() || self.time_scale <= 0.0 {
            return Err(ConfigurationError::InvalidSimulationConfig(format!(
                "time_scale must be finite and positive, found {}",
                self.time_scale
            )));
        }
        if self.event_channel_capacity == 0 {
            return Err(ConfigurationError::InvalidSimulationConfig(String::from(
                "event_channel_capacity must be at least 1",
            )));
        }
        let mut ids: HashSet<&str> = HashSet::new();
        for route in self.routes.iter() {
            if !ids.insert(&route.id) {
                return Err(ConfigurationError::InvalidSimulationConfig(format!(
                    "duplicate reservoir id '{}'",
                    route.id
                )));
            }
            if route.segment_resolution > 15 {
                return Err(ConfigurationError::InvalidSimulationConfig(format!(
                    "route '{}' has segment_resolution {} beyond the h3 maximum of 15",
                    route.id, route.segment_resolution
                )));
            }
        }
        let route_ids: HashSet<&str> = self.routes.iter().map(|r| r.id.as_str()).collect();
        for depot in self.depots.iter() {
            if !ids.insert(&depot.id) {
                return Err(ConfigurationError::InvalidSimulationConfig(format!(
                    "duplicate reservoir id '{}'",
                    depot.id
                )));
            }
            if !route_ids.contains(depot.route_id.as_str()) {
                return Err(ConfigurationError::InvalidSimulationConfig(format!(
                    "depot '{}' refers to unknown route '{}'",
                    depot.id, depot.route_id
                )));
            }
        }
        self.density_resilience.validate()?;
        self.spawn.default.validate()?;
        for (id, conf) in self.spawn.overrides.iter() {
            conf.validate().map_err(|e| {
                ConfigurationError::InvalidSpawnConfig(format!("override for '{id}': {e}"))
            })?;
        }
        let referenced = std::iter::once(&self.spawn.default)
            .chain(self.spawn.overrides.values())
            .map(|conf| conf.density_source.as_str());
        for source in referenced {
            if !self.density_sources.contains_key(source) {
                return Err(ConfigurationError::UnknownDensitySource(source.to_string()));
            }
        }
        Ok(())
    }
}

impl TryFrom<&String> for SimulationConfig {
    type Error = ConfigurationError;

    fn try_from(f: &String) -> Result<Self, Self::Error> {
        let conf: SimulationConfig = if f.ends_with(".toml") {
            let s = std::fs::read_to_string(f)
                .map_err(|e| ConfigurationError::ReadError(f.clone(), e.to_string()))?;
            toml::from_str(&s)
                .map_err(|e| ConfigurationError::DecodeError(f.clone(), e.to_string()))?
        } else if f.ends_with(".json") {
            let s = std::fs::read_to_string(f)
                .map_err(|e| ConfigurationError::ReadError(f.clone(), e.to_string()))?;
            serde_json::from_str(&s)
                .map_err(|e| ConfigurationError::DecodeError(f.clone(), e.to_string()))?
        } else {
            return Err(ConfigurationError::UnsupportedFileType(f.clone()));
        };
        conf.validate()?;
        Ok(conf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = r#"
        time_scale = 60.0
        seed = 42

        [topology_strategy]
        type = "graph_diameter"

        [persistence]
        type = "json_lines"
        file = "events.jsonl"

        [density_sources.default]
        type = "constant"
        count = 120

        [[routes]]
        id = "r1"
        geometry_file = "r1.geojson"

        [[depots]]
        id = "d1"
        route_id = "r1"
        lon = -105.0
        lat = 39.7

        [spawn.default]
        passengers_per_unit_per_hour = 0.3

        [spawn.overrides.d1]
        passengers_per_unit_per_hour = 2.0
        max_waiting = 50
    "#;

    #[test]
    fn test_decode_toml() {
        let conf: SimulationConfig = toml::from_str(EXAMPLE).unwrap();
        assert!(conf.validate().is_ok());
        assert_eq!(conf.time_scale, 60.0);
        assert_eq!(conf.seed, Some(42));
        assert_eq!(conf.routes[0].segment_resolution, DEFAULT_SEGMENT_RESOLUTION);
        assert_eq!(conf.event_channel_capacity, 1024);
        assert_eq!(
            conf.persistence,
            PersistenceConfig::JsonLines {
                file: String::from("events.jsonl")
            }
        );
        assert_eq!(conf.spawn.overrides["d1"].max_waiting, 50);
        assert_eq!(conf.spawn.default.max_waiting, 500);
    }

    #[test]
    fn test_depot_with_unknown_route_rejected() {
        let mut conf: SimulationConfig = toml::from_str(EXAMPLE).unwrap();
        conf.depots[0].route_id = String::from("r2");
        assert!(matches!(
            conf.validate(),
            Err(ConfigurationError::InvalidSimulationConfig(_))
        ));
    }

    #[test]
    fn test_unknown_density_source_rejected() {
        let mut conf: SimulationConfig = toml::from_str(EXAMPLE).unwrap();
        conf.spawn.default.density_source = String::from("census");
        assert!(matches!(
            conf.validate(),
            Err(ConfigurationError::UnknownDensitySource(_))
        ));
    }

    #[test]
    fn test_unsupported_file_type() {
        let result = SimulationConfig::try_from(&String::from("simulation.yaml"));
        assert!(matches!(
            result,
            Err(ConfigurationError::UnsupportedFileType(_))
        ));
    }
}
