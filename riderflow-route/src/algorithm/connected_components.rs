use crate::model::{
    graph::{RouteGraph, RouteNodeId},
    RouteError, RouteNodeKey,
};
use itertools::Itertools;
use std::collections::{HashSet, VecDeque};

/// a connected component of the route graph along with its total edge length
#[derive(Debug, Clone)]
pub struct RouteComponent {
    pub nodes: Vec<RouteNodeId>,
    pub length_m: f64,
    /// smallest rounded coordinate in the component, used for deterministic tie-breaking
    pub min_key: RouteNodeKey,
}

/// finds all connected components of the undirected route graph.
///
/// # Result
///
/// a vector of each found component, with node lists sorted by node id
pub fn connected_components(graph: &RouteGraph) -> Result<Vec<RouteComponent>, RouteError> {
    let mut assigned: HashSet<RouteNodeId> = HashSet::new();
    let mut solution: Vec<RouteComponent> = vec![];

    // create a new component any time we find an unattached node
    for node_id in graph.node_ids() {
        if assigned.contains(&node_id) {
            continue;
        }
        let nodes = bfs_undirected(&node_id, graph).into_iter().sorted().collect_vec();
        for n in nodes.iter() {
            assigned.insert(*n);
        }
        let min_key = nodes
            .iter()
            .map(|n| graph.node_key(n).copied())
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .min()
            .ok_or_else(|| RouteError::InternalError(String::from("empty component")))?;
        let length_m = graph.component_length_m(&nodes);
        solution.push(RouteComponent {
            nodes,
            length_m,
            min_key,
        });
    }
    log::debug!("found {} connected components", solution.len());
    Ok(solution)
}

/// runs an undirected breadth-first search from some source to find all connected nodes.
pub fn bfs_undirected(source: &RouteNodeId, graph: &RouteGraph) -> Vec<RouteNodeId> {
    let mut visited: HashSet<RouteNodeId> = HashSet::from([*source]);
    let mut frontier: VecDeque<RouteNodeId> = VecDeque::from([*source]);

    while let Some(next_id) = frontier.pop_front() {
        for (n, _) in graph.neighbors(&next_id) {
            if visited.insert(*n) {
                frontier.push_back(*n);
            }
        }
    }

    visited.into_iter().collect_vec()
}

/// selects the component with the greatest total edge length, discarding
/// disconnected spurs and noise. ties resolve to the component containing
/// the smallest rounded coordinate so the choice does not depend on input order.
///
/// # Result
///
/// the kept component and the total length in meters of all discarded components
pub fn largest_component(graph: &RouteGraph) -> Result<(RouteComponent, f64), RouteError> {
    let components = connected_components(graph)?;
    let total_m: f64 = components.iter().map(|c| c.length_m).sum();
    let largest = components
        .into_iter()
        .max_by(|a, b| {
            a.length_m
                .total_cmp(&b.length_m)
                .then_with(|| b.min_key.cmp(&a.min_key))
        })
        .ok_or(RouteError::EmptyGeometry)?;
    let discarded_m = (total_m - largest.length_m).max(0.0);
    if discarded_m > 0.0 {
        log::warn!(
            "discarding {:.1} meters of disconnected route geometry, keeping component of {:.1} meters",
            discarded_m,
            largest.length_m
        );
    }
    Ok((largest, discarded_m))
}
