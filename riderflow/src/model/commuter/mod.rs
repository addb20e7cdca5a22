mod commuter;
mod commuter_id;
mod commuter_state;
mod direction;

pub use commuter::Commuter;
pub use commuter_id::CommuterId;
pub use commuter_state::CommuterState;
pub use direction::Direction;
