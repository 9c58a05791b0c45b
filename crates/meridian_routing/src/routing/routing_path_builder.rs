use crate::{
    edge_direction::EdgeDirection,
    geopoint::GeoPoint,
    graph::{GeometryAccess, Graph},
    graph_edge::GraphEdge,
    types::{EdgeId, NodeId},
};

use super::{
    routing_path::RoutingPathLeg,
    shortest_path_algorithm::SearchPath,
    shortest_path_tree::ShortestPathTree,
};

/// Path from the root of a forward tree to `target`
pub fn forward_search_path<G: Graph>(
    graph: &G,
    tree: &ShortestPathTree,
    target: NodeId,
) -> Option<SearchPath> {
    let entry = tree.entry(target)?;
    let mut branch = tree.branch(target);
    branch.reverse();

    let mut path = SearchPath::empty(branch.first().map_or(target, |(parent, _, _)| *parent));
    path.weight = entry.weight;
    path.time = entry.time;
    path.distance = entry.distance;

    for (parent, edge_id, child) in branch {
        path.edges.push((edge_id, graph.edge_direction(edge_id, parent)));
        path.nodes.push(child);
    }

    Some(path)
}

/// Path from `source` to the root of a backward tree
pub fn backward_search_path<G: Graph>(
    graph: &G,
    tree: &ShortestPathTree,
    source: NodeId,
) -> Option<SearchPath> {
    let entry = tree.entry(source)?;

    let mut path = SearchPath::empty(source);
    path.weight = entry.weight;
    path.time = entry.time;
    path.distance = entry.distance;

    // Backward parents point towards the target
    for (next, edge_id, node) in tree.branch(source) {
        path.edges.push((edge_id, graph.edge_direction(edge_id, node)));
        path.nodes.push(next);
    }

    Some(path)
}

/// Joins a forward tree and a backward tree at `meeting_node`
pub fn bidirectional_search_path<G: Graph>(
    graph: &G,
    forward: &ShortestPathTree,
    backward: &ShortestPathTree,
    meeting_node: NodeId,
) -> Option<SearchPath> {
    let mut path = forward_search_path(graph, forward, meeting_node)?;
    path.append(backward_search_path(graph, backward, meeting_node)?);
    Some(path)
}

fn oriented_geometry<G: GeometryAccess>(
    graph: &G,
    edge_id: EdgeId,
    direction: EdgeDirection,
) -> Vec<GeoPoint> {
    match direction {
        EdgeDirection::Forward => graph.edge_geometry(edge_id).to_vec(),
        EdgeDirection::Backward => graph.edge_geometry(edge_id).iter().rev().copied().collect(),
    }
}

pub fn build_routing_path_leg<G: GeometryAccess>(graph: &G, path: &SearchPath) -> RoutingPathLeg {
    let mut points: Vec<GeoPoint> = Vec::with_capacity(path.edges.len() + 1);
    let mut edges: Vec<EdgeId> = Vec::with_capacity(path.edges.len());

    for &(edge_id, direction) in &path.edges {
        let geometry = oriented_geometry(graph, edge_id, direction);
        let skip = usize::from(!points.is_empty());
        points.extend(geometry.into_iter().skip(skip));

        // Virtual edges split from the same base edge collapse into one
        let base_edge = graph.edge(edge_id).id();
        if edges.last() != Some(&base_edge) {
            edges.push(base_edge);
        }
    }

    if points.is_empty()
        && let Some(&node) = path.nodes.first()
    {
        points.push(*graph.node_geometry(node));
    }

    RoutingPathLeg::new(path.distance, path.time, path.weight, points, edges)
}

#[cfg(test)]
mod tests {
    use crate::{
        meters,
        properties::property::TravelMode,
        test_graph_utils::test_graph::line_graph,
    };

    use super::*;

    #[test]
    fn builds_forward_and_backward_branches() {
        let graph = line_graph(4, TravelMode::Foot, 5.0);

        let mut forward = ShortestPathTree::new();
        forward.init_root(0, 0);
        forward.relax(1, 1, 10, meters!(100), 0, 0, 1);

        let mut backward = ShortestPathTree::new();
        backward.init_root(3, 0);
        backward.relax(2, 1, 10, meters!(100), 3, 2, 1);
        backward.relax(1, 2, 20, meters!(200), 2, 1, 2);

        let path = bidirectional_search_path(&graph, &forward, &backward, 1).unwrap();
        assert_eq!(path.nodes, vec![0, 1, 2, 3]);
        assert_eq!(
            path.edges,
            vec![
                (0, EdgeDirection::Forward),
                (1, EdgeDirection::Forward),
                (2, EdgeDirection::Forward)
            ]
        );
        assert_eq!(path.weight, 3);
        assert_eq!(path.time, 30);

        let leg = build_routing_path_leg(&graph, &path);
        assert_eq!(leg.points().len(), 4);
        assert_eq!(leg.edges(), &[0, 1, 2]);
        assert_eq!(leg.points()[3], *graph.node_geometry(3));
    }

    #[test]
    fn backward_traversal_reverses_geometry() {
        let graph = line_graph(2, TravelMode::Foot, 5.0);

        let mut tree = ShortestPathTree::new();
        tree.init_root(1, 0);
        tree.relax(0, 1, 1, meters!(1), 1, 0, 1);

        let path = forward_search_path(&graph, &tree, 0).unwrap();
        assert_eq!(path.edges, vec![(0, EdgeDirection::Backward)]);

        let leg = build_routing_path_leg(&graph, &path);
        assert_eq!(leg.points(), &[*graph.node_geometry(1), *graph.node_geometry(0)]);
    }
}
