use super::EventTopic;
use crate::model::{
    commuter::{Commuter, CommuterId},
    reservoir::ReservoirId,
};
use chrono::{DateTime, Utc};
use geo::Coord;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEventType {
    Spawned,
    Boarded,
    Alighted,
    Expired,
    /// a spawn rejected because the reservoir was at capacity
    Dropped,
}

impl Display for LifecycleEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LifecycleEventType::Spawned => "spawned",
            LifecycleEventType::Boarded => "boarded",
            LifecycleEventType::Alighted => "alighted",
            LifecycleEventType::Expired => "expired",
            LifecycleEventType::Dropped => "dropped",
        };
        write!(f, "{s}")
    }
}

/// a single commuter state transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub event_type: LifecycleEventType,
    /// the commuter id, or none for a dropped spawn
    pub entity_id: Option<CommuterId>,
    pub position: Coord<f64>,
    pub owner: ReservoirId,
    pub vehicle_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl LifecycleEvent {
    pub fn for_commuter(
        event_type: LifecycleEventType,
        commuter: &Commuter,
        timestamp: DateTime<Utc>,
    ) -> LifecycleEvent {
        LifecycleEvent {
            event_type,
            entity_id: Some(commuter.id),
            position: commuter.position,
            owner: commuter.owner.clone(),
            vehicle_id: commuter.vehicle_id.clone(),
            timestamp,
        }
    }

    pub fn dropped(owner: &ReservoirId, position: Coord<f64>, timestamp: DateTime<Utc>) -> Self {
        LifecycleEvent {
            event_type: LifecycleEventType::Dropped,
            entity_id: None,
            position,
            owner: owner.clone(),
            vehicle_id: None,
            timestamp,
        }
    }

    /// boarding and alighting are vehicle activity; everything else belongs
    /// to the topic of the owning reservoir
    pub fn topic(&self) -> EventTopic {
        match self.event_type {
            LifecycleEventType::Boarded | LifecycleEventType::Alighted => EventTopic::Vehicle,
            _ => self.owner.topic(),
        }
    }
}
