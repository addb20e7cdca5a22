use super::{connected_components, shortest_path};
use crate::model::{
    graph::{RouteGraph, RouteNodeId},
    OrderedRoute, RouteError, RouteShape,
};
use itertools::Itertools;

/// backbone found by the graph-diameter strategy
#[derive(Debug, Clone)]
pub struct DiameterRoute {
    pub route: OrderedRoute,
    /// length of the disconnected geometry that was dropped
    pub discarded_length_m: f64,
    /// total edge length of the kept component
    pub component_length_m: f64,
}

/// reconstructs the ordered backbone of a route as the approximate diameter
/// of the largest connected component of its geometry graph.
///
/// a double sweep is used: shortest paths from an arbitrary node find the
/// farthest node A, then shortest paths from A find the farthest node B,
/// and the path A -> B becomes the backbone. the result is oriented to follow
/// the digitized direction of the majority of input edges it traverses.
pub fn graph_diameter(shapes: &[RouteShape]) -> Result<DiameterRoute, RouteError> {
    let graph = RouteGraph::from_shapes(shapes)?;
    let (component, discarded_length_m) = connected_components::largest_component(&graph)?;

    let start = component
        .nodes
        .iter()
        .map(|n| graph.node_key(n).map(|k| (*k, *n)))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .min()
        .map(|(_, n)| n)
        .ok_or(RouteError::EmptyGeometry)?;

    let first_sweep = shortest_path::dijkstra(&graph, start);
    let (a, _) = first_sweep.farthest(&graph)?;
    let second_sweep = shortest_path::dijkstra(&graph, a);
    let (b, diameter_m) = second_sweep.farthest(&graph)?;
    let path = second_sweep.path_to(b)?;
    log::debug!(
        "graph diameter {:.1} meters over {} nodes from {} to {}",
        diameter_m,
        path.len(),
        graph.node_key(&a)?,
        graph.node_key(&b)?
    );

    let oriented = orient_path(&graph, path)?;
    let coords = oriented
        .iter()
        .map(|n| graph.node_coord(n))
        .collect::<Result<Vec<_>, _>>()?;
    let route = OrderedRoute::new(coords)?;
    Ok(DiameterRoute {
        route,
        discarded_length_m,
        component_length_m: component.length_m,
    })
}

/// orients a path so that it agrees with the digitized direction of most of
/// the input edges it traverses. with no majority, the path starts at the
/// endpoint with the smaller rounded coordinate.
fn orient_path(graph: &RouteGraph, path: Vec<RouteNodeId>) -> Result<Vec<RouteNodeId>, RouteError> {
    let (forward, backward) = path
        .iter()
        .tuple_windows()
        .fold((0, 0), |(fwd, bwd), (u, v)| {
            (
                fwd + graph.digitized_count(u, v),
                bwd + graph.digitized_count(v, u),
            )
        });
    let reverse = match forward.cmp(&backward) {
        std::cmp::Ordering::Less => true,
        std::cmp::Ordering::Greater => false,
        std::cmp::Ordering::Equal => match (path.first(), path.last()) {
            (Some(first), Some(last)) => graph.node_key(last)? < graph.node_key(first)?,
            _ => false,
        },
    };
    if reverse {
        Ok(path.into_iter().rev().collect_vec())
    } else {
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Coord;

    fn coords(route: &OrderedRoute) -> Vec<(f64, f64)> {
        route.points().iter().map(|c| (c.x, c.y)).collect_vec()
    }

    #[test]
    fn test_scenario_a_two_segments() {
        let shapes = vec![
            RouteShape::from_lon_lat(&[(0.0, 0.0), (0.0, 1.0)]),
            RouteShape::from_lon_lat(&[(0.0, 1.0), (0.0, 2.0)]),
        ];
        let result = graph_diameter(&shapes).unwrap();
        assert_eq!(
            coords(&result.route),
            vec![(0.0, 0.0), (0.0, 1.0), (0.0, 2.0)]
        );
        let km = result.route.length_m() / 1000.0;
        assert!((km - 222.4).abs() < 0.1, "length was {km} km");
    }

    #[test]
    fn test_scenario_b_reverse_input_order() {
        let a = vec![
            RouteShape::from_lon_lat(&[(0.0, 0.0), (0.0, 1.0)]),
            RouteShape::from_lon_lat(&[(0.0, 1.0), (0.0, 2.0)]),
        ];
        let b = a.iter().cloned().rev().collect_vec();
        let route_a = graph_diameter(&a).unwrap().route;
        let route_b = graph_diameter(&b).unwrap().route;
        assert_eq!(route_a, route_b);
    }

    #[test]
    fn test_simple_path_length_is_order_independent() {
        let pts = [
            (-105.0, 39.70),
            (-105.001, 39.701),
            (-105.003, 39.701),
            (-105.004, 39.703),
            (-105.006, 39.704),
            (-105.008, 39.704),
        ];
        let shapes = pts
            .iter()
            .tuple_windows()
            .map(|(a, b)| RouteShape::from_lon_lat(&[*a, *b]))
            .collect_vec();
        let input_length: f64 = shapes
            .iter()
            .map(|s| crate::util::geo_ops::polyline_length_m(&s.rounded_coords()))
            .sum();

        let orders: Vec<Vec<usize>> = vec![
            vec![0, 1, 2, 3, 4],
            vec![4, 3, 2, 1, 0],
            vec![2, 0, 4, 1, 3],
            vec![3, 4, 0, 2, 1],
        ];
        let mut routes = vec![];
        for order in orders.iter() {
            let shuffled = order.iter().map(|i| shapes[*i].clone()).collect_vec();
            let route = graph_diameter(&shuffled).unwrap().route;
            assert!((route.length_m() - input_length).abs() < 1e-6);
            routes.push(route);
        }
        assert!(routes.iter().all_equal());
        assert_eq!(routes[0].first(), &Coord { x: -105.0, y: 39.70 });
    }

    #[test]
    fn test_majority_digitized_direction_wins() {
        // shapes digitized from north to south
        let shapes = vec![
            RouteShape::from_lon_lat(&[(0.0, 0.2), (0.0, 0.1)]),
            RouteShape::from_lon_lat(&[(0.0, 0.1), (0.0, 0.0)]),
        ];
        let route = graph_diameter(&shapes).unwrap().route;
        assert_eq!(route.first(), &Coord { x: 0.0, y: 0.2 });
        assert_eq!(route.last(), &Coord { x: 0.0, y: 0.0 });
    }

    #[test]
    fn test_branch_spur_excluded_from_backbone() {
        // a long trunk with a short side branch in the middle
        let shapes = vec![
            RouteShape::from_lon_lat(&[(0.0, 0.0), (0.0, 0.1), (0.0, 0.2)]),
            RouteShape::from_lon_lat(&[(0.0, 0.1), (0.01, 0.1)]),
        ];
        let result = graph_diameter(&shapes).unwrap();
        assert_eq!(result.route.len(), 3);
        assert_eq!(result.discarded_length_m, 0.0);
    }

    #[test]
    fn test_empty_geometry() {
        assert!(matches!(graph_diameter(&[]), Err(RouteError::EmptyGeometry)));
    }
}
