mod route_graph;
mod route_node_id;

pub use route_graph::RouteGraph;
pub use route_node_id::RouteNodeId;
