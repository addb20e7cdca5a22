use crate::model::event::EventTopic;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// identifies a depot or a route reservoir by its configured id
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum ReservoirId {
    Depot(String),
    Route(String),
}

impl ReservoirId {
    /// the configured id, also used to look up spawn configuration overrides
    pub fn key(&self) -> &str {
        match self {
            ReservoirId::Depot(id) => id,
            ReservoirId::Route(id) => id,
        }
    }

    pub fn topic(&self) -> EventTopic {
        match self {
            ReservoirId::Depot(_) => EventTopic::Depot,
            ReservoirId::Route(_) => EventTopic::Route,
        }
    }
}

impl Display for ReservoirId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReservoirId::Depot(id) => write!(f, "depot/{id}"),
            ReservoirId::Route(id) => write!(f, "route/{id}"),
        }
    }
}
