use crate::model::{
    graph::{RouteGraph, RouteNodeId},
    RouteError,
};
use ordered_float::OrderedFloat;
use std::{
    cmp::Reverse,
    collections::{BinaryHeap, HashMap},
};

/// result of a single-source shortest path search over the route graph
#[derive(Debug, Clone)]
pub struct ShortestPathTree {
    pub source: RouteNodeId,
    pub distances: HashMap<RouteNodeId, f64>,
    predecessors: HashMap<RouteNodeId, RouteNodeId>,
}

/// runs Dijkstra's algorithm from a source node over great-circle edge weights.
/// the search only reaches nodes connected to the source.
pub fn dijkstra(graph: &RouteGraph, source: RouteNodeId) -> ShortestPathTree {
    let mut distances: HashMap<RouteNodeId, f64> = HashMap::from([(source, 0.0)]);
    let mut predecessors: HashMap<RouteNodeId, RouteNodeId> = HashMap::new();
    let mut queue: BinaryHeap<Reverse<(OrderedFloat<f64>, RouteNodeId)>> = BinaryHeap::new();
    queue.push(Reverse((OrderedFloat(0.0), source)));

    while let Some(Reverse((OrderedFloat(dist), node_id))) = queue.pop() {
        let best = distances.get(&node_id).copied().unwrap_or(f64::INFINITY);
        if dist > best {
            // stale queue entry
            continue;
        }
        for (neighbor, weight) in graph.neighbors(&node_id) {
            let candidate = dist + weight;
            let current = distances.get(neighbor).copied().unwrap_or(f64::INFINITY);
            if candidate < current {
                distances.insert(*neighbor, candidate);
                predecessors.insert(*neighbor, node_id);
                queue.push(Reverse((OrderedFloat(candidate), *neighbor)));
            }
        }
    }

    ShortestPathTree {
        source,
        distances,
        predecessors,
    }
}

impl ShortestPathTree {
    /// the reachable node farthest from the source. ties resolve to the node
    /// with the smallest rounded coordinate so the result does not depend on
    /// node numbering.
    pub fn farthest(&self, graph: &RouteGraph) -> Result<(RouteNodeId, f64), RouteError> {
        let mut best: Option<(RouteNodeId, f64)> = None;
        for (node_id, dist) in self.distances.iter() {
            best = match best {
                None => Some((*node_id, *dist)),
                Some((best_id, best_dist)) => {
                    let replace = match dist.total_cmp(&best_dist) {
                        std::cmp::Ordering::Greater => true,
                        std::cmp::Ordering::Less => false,
                        std::cmp::Ordering::Equal => {
                            graph.node_key(node_id)? < graph.node_key(&best_id)?
                        }
                    };
                    if replace {
                        Some((*node_id, *dist))
                    } else {
                        Some((best_id, best_dist))
                    }
                }
            };
        }
        best.ok_or_else(|| {
            RouteError::InternalError(format!(
                "shortest path tree from {} reached no nodes",
                self.source
            ))
        })
    }

    /// walks the predecessor links back from the target to build the path source -> target.
    pub fn path_to(&self, target: RouteNodeId) -> Result<Vec<RouteNodeId>, RouteError> {
        if !self.distances.contains_key(&target) {
            return Err(RouteError::InternalError(format!(
                "node {} is not reachable from {}",
                target, self.source
            )));
        }
        let mut path = vec![target];
        let mut current = target;
        while current != self.source {
            current = *self.predecessors.get(&current).ok_or_else(|| {
                RouteError::InternalError(format!("node {current} missing predecessor"))
            })?;
            path.push(current);
        }
        path.reverse();
        Ok(path)
    }
}
