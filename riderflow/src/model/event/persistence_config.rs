use super::{CommuterSink, JsonLinesSink, NoopSink, SinkError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// where simulation events are mirrored for analytics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum PersistenceConfig {
    #[default]
    None,
    JsonLines {
        file: String,
    },
}

impl PersistenceConfig {
    pub fn build(&self) -> Result<Box<dyn CommuterSink>, SinkError> {
        match self {
            PersistenceConfig::None => Ok(Box::new(NoopSink)),
            PersistenceConfig::JsonLines { file } => {
                log::info!("mirroring simulation events to {file}");
                let sink = JsonLinesSink::open(Path::new(file))?;
                Ok(Box::new(sink))
            }
        }
    }
}
