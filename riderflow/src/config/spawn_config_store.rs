use super::{ConfigurationError, SpawnConfig};
use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

/// read-mostly store of spawn configurations keyed by route or depot id,
/// with a global default for ids without an override. updates validate the
/// new configuration and then swap the shared pointer; a live configuration
/// is never mutated in place, so readers holding an `Arc` keep a consistent view.
#[derive(Debug)]
pub struct SpawnConfigStore {
    default: RwLock<Arc<SpawnConfig>>,
    overrides: RwLock<HashMap<String, Arc<SpawnConfig>>>,
}

impl SpawnConfigStore {
    pub fn new(
        default: SpawnConfig,
        overrides: HashMap<String, SpawnConfig>,
    ) -> Result<SpawnConfigStore, ConfigurationError> {
        let (default, overrides) = validated(default, overrides)?;
        Ok(SpawnConfigStore {
            default: RwLock::new(default),
            overrides: RwLock::new(overrides),
        })
    }

    /// the configuration for an id, falling back to the global default
    pub fn get(&self, id: &str) -> Arc<SpawnConfig> {
        let overrides = self.overrides.read().unwrap_or_else(PoisonError::into_inner);
        match overrides.get(id) {
            Some(conf) => conf.clone(),
            None => self
                .default
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }

    pub fn has_override(&self, id: &str) -> bool {
        self.overrides
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }

    /// replaces the override for a single id
    pub fn replace(&self, id: &str, config: SpawnConfig) -> Result<(), ConfigurationError> {
        config.validate()?;
        let mut overrides = self.overrides.write().unwrap_or_else(PoisonError::into_inner);
        overrides.insert(id.to_string(), Arc::new(config));
        log::info!("replaced spawn configuration for '{id}'");
        Ok(())
    }

    /// removes an override so the id falls back to the default
    pub fn remove_override(&self, id: &str) -> bool {
        self.overrides
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some()
    }

    /// replaces all configurations at once. nothing is swapped unless every
    /// new configuration is valid.
    pub fn reload(
        &self,
        default: SpawnConfig,
        overrides: HashMap<String, SpawnConfig>,
    ) -> Result<(), ConfigurationError> {
        let (default, overrides) = validated(default, overrides)?;
        let n_overrides = overrides.len();
        *self.default.write().unwrap_or_else(PoisonError::into_inner) = default;
        *self.overrides.write().unwrap_or_else(PoisonError::into_inner) = overrides;
        log::info!("reloaded spawn configuration with {n_overrides} overrides");
        Ok(())
    }
}

type ValidatedConfigs = (Arc<SpawnConfig>, HashMap<String, Arc<SpawnConfig>>);

fn validated(
    default: SpawnConfig,
    overrides: HashMap<String, SpawnConfig>,
) -> Result<ValidatedConfigs, ConfigurationError> {
    default.validate()?;
    let mut out = HashMap::with_capacity(overrides.len());
    for (id, conf) in overrides.into_iter() {
        conf.validate().map_err(|e| {
            ConfigurationError::InvalidSpawnConfig(format!("override for '{id}': {e}"))
        })?;
        out.insert(id, Arc::new(conf));
    }
    Ok((Arc::new(default), out))
}
