pub mod commuter;
pub mod density;
pub mod event;
pub mod reservoir;
pub mod spawn;
