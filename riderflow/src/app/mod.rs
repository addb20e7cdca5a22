mod clock;
mod orchestrator;
mod route_registry;
mod simulation_context;
mod simulation_error;
mod spawn_cycle_report;

pub use clock::{Clock, ManualClock, SystemClock};
pub use orchestrator::Orchestrator;
pub use route_registry::{RegisteredRoute, RouteRegistry};
pub use simulation_context::SimulationContext;
pub use simulation_error::SimulationError;
pub use spawn_cycle_report::SpawnCycleReport;
