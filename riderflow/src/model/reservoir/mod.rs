mod commuter_ledger;
mod depot_reservoir;
mod reservoir;
mod reservoir_error;
mod reservoir_id;
pub mod reservoir_ops;
mod reservoir_statistics;
mod route_reservoir;
mod route_segment;
mod spawn_request;

pub use depot_reservoir::DepotReservoir;
pub use reservoir::Reservoir;
pub use reservoir_error::ReservoirError;
pub use reservoir_id::ReservoirId;
pub use reservoir_statistics::ReservoirStatistics;
pub use route_reservoir::RouteReservoir;
pub use route_segment::RouteSegment;
pub use spawn_request::SpawnRequest;
