mod configuration_error;
mod rate_table;
mod simulation_config;
mod spawn_config;
mod spawn_config_store;

pub use configuration_error::ConfigurationError;
pub use rate_table::RateTable;
pub use simulation_config::{
    DepotConfig, RouteConfig, SimulationConfig, SpawnSection, DEFAULT_SEGMENT_RESOLUTION,
};
pub use spawn_config::SpawnConfig;
pub use spawn_config_store::SpawnConfigStore;
