use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTopic {
    Depot,
    Route,
    Vehicle,
    SystemHealth,
}

impl EventTopic {
    pub const ALL: [EventTopic; 4] = [
        EventTopic::Depot,
        EventTopic::Route,
        EventTopic::Vehicle,
        EventTopic::SystemHealth,
    ];
}

impl Display for EventTopic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EventTopic::Depot => "depot",
            EventTopic::Route => "route",
            EventTopic::Vehicle => "vehicle",
            EventTopic::SystemHealth => "system_health",
        };
        write!(f, "{s}")
    }
}
