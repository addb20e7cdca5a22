use super::{EventTopic, HealthEvent, LifecycleEvent};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum SimulationEvent {
    Lifecycle(LifecycleEvent),
    Health(HealthEvent),
}

impl SimulationEvent {
    pub fn topic(&self) -> EventTopic {
        match self {
            SimulationEvent::Lifecycle(e) => e.topic(),
            SimulationEvent::Health(_) => EventTopic::SystemHealth,
        }
    }
}

impl From<LifecycleEvent> for SimulationEvent {
    fn from(value: LifecycleEvent) -> Self {
        SimulationEvent::Lifecycle(value)
    }
}

impl From<HealthEvent> for SimulationEvent {
    fn from(value: HealthEvent) -> Self {
        SimulationEvent::Health(value)
    }
}
