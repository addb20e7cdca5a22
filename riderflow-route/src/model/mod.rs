pub mod graph;
mod ordered_route;
mod route_error;
mod route_geometry;
mod route_node_key;
mod route_shape;

pub use ordered_route::OrderedRoute;
pub use route_error::RouteError;
pub use route_geometry::{GeometryVariant, RouteGeometry};
pub use route_node_key::{RouteNodeKey, COORDINATE_PRECISION};
pub use route_shape::RouteShape;
