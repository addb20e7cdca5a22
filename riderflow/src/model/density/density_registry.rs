use super::{DensitySourceConfig, ResilienceConfig, ResilientDensity};
use crate::{config::ConfigurationError, model::event::EventBus};
use std::{collections::HashMap, sync::Arc};

/// density sources by manifest id, each wrapped with fallback handling.
/// populated once at startup from the configuration manifest.
#[derive(Default)]
pub struct DensityRegistry {
    sources: HashMap<String, Arc<ResilientDensity>>,
}

impl DensityRegistry {
    pub fn from_manifest(
        manifest: &HashMap<String, DensitySourceConfig>,
        resilience: &ResilienceConfig,
        bus: &EventBus,
    ) -> Result<DensityRegistry, ConfigurationError> {
        let mut sources = HashMap::with_capacity(manifest.len());
        for (id, conf) in manifest.iter() {
            let source = conf.build(id).map_err(|e| {
                ConfigurationError::InvalidSimulationConfig(format!(
                    "density source '{id}': {e}"
                ))
            })?;
            let resilient = ResilientDensity::new(source, resilience.clone(), bus.clone());
            sources.insert(id.clone(), Arc::new(resilient));
        }
        log::info!("registered {} density sources", sources.len());
        Ok(DensityRegistry { sources })
    }

    pub fn insert(&mut self, id: &str, source: Arc<ResilientDensity>) {
        self.sources.insert(id.to_string(), source);
    }

    pub fn get(&self, id: &str) -> Result<Arc<ResilientDensity>, ConfigurationError> {
        self.sources
            .get(id)
            .cloned()
            .ok_or_else(|| ConfigurationError::UnknownDensitySource(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }
}
