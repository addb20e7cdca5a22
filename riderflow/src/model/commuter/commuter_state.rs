use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// lifecycle of a simulated rider. a commuter starts waiting to board and
/// is removed from its reservoir on reaching a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommuterState {
    WaitingToBoard,
    Onboard,
    Alighted,
    Expired,
}

impl CommuterState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CommuterState::Alighted | CommuterState::Expired)
    }
}

impl Display for CommuterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CommuterState::WaitingToBoard => "waiting_to_board",
            CommuterState::Onboard => "onboard",
            CommuterState::Alighted => "alighted",
            CommuterState::Expired => "expired",
        };
        write!(f, "{s}")
    }
}
