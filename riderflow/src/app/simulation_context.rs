use super::{Clock, RouteRegistry, SimulationError, SystemClock};
use crate::{
    config::{SimulationConfig, SpawnConfigStore},
    model::{density::DensityRegistry, event::EventBus},
};
use std::sync::Arc;

/// everything an orchestrator depends on, assembled once at startup and
/// passed in explicitly
#[derive(Clone)]
pub struct SimulationContext {
    pub config: Arc<SimulationConfig>,
    pub routes: Arc<RouteRegistry>,
    pub spawn_configs: Arc<SpawnConfigStore>,
    pub density: Arc<DensityRegistry>,
    pub bus: EventBus,
    pub clock: Arc<dyn Clock>,
}

impl SimulationContext {
    /// builds routes, spawn configurations and density sources for a
    /// validated configuration, reading simulation time from the system clock.
    /// routes that fail to build are reported and left out.
    pub fn from_config(config: SimulationConfig) -> Result<SimulationContext, SimulationError> {
        config.validate()?;
        let bus = EventBus::new(config.event_channel_capacity);
        let spawn_configs = SpawnConfigStore::new(
            config.spawn.default.clone(),
            config.spawn.overrides.clone(),
        )?;
        let density = DensityRegistry::from_manifest(
            &config.density_sources,
            &config.density_resilience,
            &bus,
        )?;
        let (routes, failures) = RouteRegistry::register(
            &config.routes,
            config.topology_strategy,
            config.parallelize,
            &bus,
        );
        if !failures.is_empty() {
            log::warn!(
                "{} of {} routes failed to register",
                failures.len(),
                config.routes.len()
            );
        }
        let clock = SystemClock::new(config.time_scale);
        Ok(SimulationContext {
            config: Arc::new(config),
            routes: Arc::new(routes),
            spawn_configs: Arc::new(spawn_configs),
            density: Arc::new(density),
            bus,
            clock: Arc::new(clock),
        })
    }
}
