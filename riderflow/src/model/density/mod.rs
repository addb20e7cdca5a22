mod constant_density;
pub mod corridor;
mod density_error;
mod density_registry;
mod density_source;
mod density_source_config;
mod point_density;
mod resilience_config;
mod resilient_density;
mod source_health;

pub use constant_density::ConstantDensity;
pub use density_error::DensityError;
pub use density_registry::DensityRegistry;
pub use density_source::DensitySource;
pub use density_source_config::DensitySourceConfig;
pub use point_density::PointDensity;
pub use resilience_config::ResilienceConfig;
pub use resilient_density::{DensityReading, ResilientDensity};
pub use source_health::SourceHealth;
