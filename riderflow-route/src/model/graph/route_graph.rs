use super::RouteNodeId;
use crate::model::{RouteError, RouteNodeKey, RouteShape};
use crate::util::geo_ops;
use geo::Coord;
use itertools::Itertools;
use std::collections::{BTreeMap, HashMap};

/// undirected weighted graph over the rounded endpoints of raw route shapes.
/// built once per route geometry version and discarded on rebuild.
#[derive(Debug, Clone, Default)]
pub struct RouteGraph {
    /// rounded coordinate of each node, indexed by RouteNodeId
    nodes: Vec<RouteNodeKey>,
    lookup: HashMap<RouteNodeKey, RouteNodeId>,
    /// undirected adjacency with great-circle edge weights in meters.
    /// ordered maps keep neighbor iteration deterministic.
    adj: Vec<BTreeMap<RouteNodeId, f64>>,
    /// how many times each (src, dst) pair appeared in the digitized direction
    digitized: HashMap<(RouteNodeId, RouteNodeId), usize>,
}

impl RouteGraph {
    /// builds the graph from raw shapes. each consecutive pair of rounded
    /// coordinates within a shape becomes an edge; parallel edges keep the
    /// minimum weight.
    ///
    /// # Returns
    ///
    /// the graph, or [`RouteError::EmptyGeometry`] when no shape contributes an edge.
    pub fn from_shapes(shapes: &[RouteShape]) -> Result<RouteGraph, RouteError> {
        let mut graph = RouteGraph::default();
        let mut n_usable = 0;
        for shape in shapes.iter() {
            let coords = shape.rounded_coords();
            if coords.len() < 2 {
                log::debug!(
                    "skipping unusable shape '{}'",
                    shape.name.as_deref().unwrap_or("<unnamed>")
                );
                continue;
            }
            n_usable += 1;
            for (src, dst) in coords.iter().tuple_windows() {
                let src_id = graph.get_or_insert_node(RouteNodeKey::from_coord(src));
                let dst_id = graph.get_or_insert_node(RouteNodeKey::from_coord(dst));
                graph.add_edge(src_id, dst_id, geo_ops::haversine_m(src, dst));
            }
        }
        if n_usable == 0 {
            return Err(RouteError::EmptyGeometry);
        }
        log::debug!(
            "built route graph with {} nodes, {} edges from {} usable shapes",
            graph.n_nodes(),
            graph.n_edges(),
            n_usable
        );
        Ok(graph)
    }

    fn get_or_insert_node(&mut self, key: RouteNodeKey) -> RouteNodeId {
        if let Some(id) = self.lookup.get(&key) {
            return *id;
        }
        let id = RouteNodeId(self.nodes.len());
        self.nodes.push(key);
        self.adj.push(BTreeMap::new());
        self.lookup.insert(key, id);
        id
    }

    /// adds the relations src->dst, dst->src, keeping the minimum weight for
    /// parallel edges. guards against self-loops.
    fn add_edge(&mut self, src: RouteNodeId, dst: RouteNodeId, weight: f64) {
        if src == dst {
            return;
        }
        for (a, b) in [(src, dst), (dst, src)] {
            self.adj[a.0]
                .entry(b)
                .and_modify(|w| *w = w.min(weight))
                .or_insert(weight);
        }
        *self.digitized.entry((src, dst)).or_insert(0) += 1;
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// count of undirected edges
    pub fn n_edges(&self) -> usize {
        self.adj.iter().map(|a| a.len()).sum::<usize>() / 2
    }

    pub fn node_ids(&self) -> impl Iterator<Item = RouteNodeId> {
        (0..self.nodes.len()).map(RouteNodeId)
    }

    pub fn node_key(&self, node_id: &RouteNodeId) -> Result<&RouteNodeKey, RouteError> {
        self.nodes.get(node_id.0).ok_or_else(|| {
            RouteError::InternalError(format!("attempting to get node '{node_id}' not in graph"))
        })
    }

    pub fn node_coord(&self, node_id: &RouteNodeId) -> Result<Coord<f64>, RouteError> {
        self.node_key(node_id).map(|k| k.to_coord())
    }

    /// neighbors of a node with the edge weight in meters. unknown nodes have no neighbors.
    pub fn neighbors(&self, node_id: &RouteNodeId) -> impl Iterator<Item = (&RouteNodeId, &f64)> {
        self.adj.get(node_id.0).into_iter().flatten()
    }

    /// number of times the edge src->dst appeared in its digitized direction
    pub fn digitized_count(&self, src: &RouteNodeId, dst: &RouteNodeId) -> usize {
        self.digitized.get(&(*src, *dst)).copied().unwrap_or_default()
    }

    /// total length of all undirected edges in meters
    pub fn total_length_m(&self) -> f64 {
        self.adj.iter().flat_map(|a| a.values()).sum::<f64>() / 2.0
    }

    /// total length of the undirected edges incident to a set of nodes that
    /// form a connected component.
    pub fn component_length_m(&self, component: &[RouteNodeId]) -> f64 {
        component
            .iter()
            .flat_map(|n| self.neighbors(n).map(|(_, w)| *w))
            .sum::<f64>()
            / 2.0
    }
}
