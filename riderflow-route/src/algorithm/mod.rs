pub mod connected_components;
pub mod diameter;
mod geometry_quality;
mod route_topology_builder;
pub mod shortest_path;
pub mod stitching;
mod topology_strategy;

pub use geometry_quality::{GeometryQualityReport, GeometryWarning};
pub use route_topology_builder::{RouteTopology, RouteTopologyBuilder};
pub use topology_strategy::{TopologyStrategy, DEFAULT_SEAM_THRESHOLD_M};
