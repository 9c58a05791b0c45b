use crate::{
    constants::MAX_WEIGHT,
    distance::{Distance, Meters},
    graph::{Graph, UndirectedEdgeAccess},
    graph_edge::GraphEdge,
    routing::{
        routing_path_builder::{backward_search_path, forward_search_path},
        search_direction::SearchDirection,
        shortest_path_algorithm::SearchPath,
        shortest_path_tree::ShortestPathTree,
    },
    types::NodeId,
    weighting::{Milliseconds, Weight, Weighting},
};

use super::query_graph::QueryGraph;

/// Base graph node a query point reaches over the virtual edges around it
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AccessRoot {
    pub node: NodeId,
    pub weight: Weight,
    pub time: Milliseconds,
    pub distance: Distance<Meters>,
    /// Query graph path between the point and `node`, in travel order
    pub path: SearchPath,
}

impl AccessRoot {
    /// Root of a point lying on `node` itself
    pub fn at(node: NodeId) -> Self {
        AccessRoot {
            node,
            weight: 0,
            time: 0,
            distance: Distance::default(),
            path: SearchPath::empty(node),
        }
    }
}

/// Search from a query graph node that only expands virtual nodes.
///
/// A snapped point is connected to the base graph by the pieces of the edge it was
/// snapped on. The walk follows those pieces until it reaches base nodes, which is
/// where searches over base graph structures (hierarchies, landmark tables) take over.
/// In the backward direction the edges are traversed towards `node`.
pub(crate) struct VirtualAccess {
    direction: SearchDirection,
    tree: ShortestPathTree,
}

impl VirtualAccess {
    pub fn new<W>(graph: &QueryGraph, weighting: &W, origin: NodeId, direction: SearchDirection) -> Self
    where
        W: Weighting + ?Sized,
    {
        let mut tree = ShortestPathTree::new();
        tree.init_root(origin, 0);

        while let Some((node, entry)) = tree.settle_next() {
            if !graph.is_virtual_node(node) {
                continue;
            }

            for edge_id in graph.node_edges_iter(node) {
                let edge = graph.edge(edge_id);
                let adj_node = edge.adj_node(node);
                if adj_node == node {
                    continue;
                }

                let traversal = direction.traversal(graph.edge_direction(edge_id, node));
                let edge_weight = weighting.calc_edge_weight(edge, traversal);
                if edge_weight == MAX_WEIGHT {
                    continue;
                }

                let weight = entry.weight.saturating_add(edge_weight);
                if weight >= MAX_WEIGHT {
                    continue;
                }

                let time = entry
                    .time
                    .saturating_add(weighting.calc_edge_ms(edge, traversal));
                let distance = entry.distance + edge.distance();
                tree.relax(adj_node, weight, time, distance, node, edge_id, weight);
            }
        }

        VirtualAccess {
            direction,
            tree,
        }
    }

    /// Path between the origin and another node the walk reached
    pub fn path_to(&self, graph: &QueryGraph, node: NodeId) -> Option<SearchPath> {
        match self.direction {
            SearchDirection::Forward => forward_search_path(graph, &self.tree, node),
            SearchDirection::Backward => backward_search_path(graph, &self.tree, node),
        }
    }

    /// Base nodes reached, by node id
    pub fn roots(&self, graph: &QueryGraph) -> Vec<AccessRoot> {
        let mut roots: Vec<AccessRoot> = self
            .tree
            .entries()
            .filter(|(node, _)| !graph.is_virtual_node(*node))
            .filter_map(|(node, entry)| {
                Some(AccessRoot {
                    node,
                    weight: entry.weight,
                    time: entry.time,
                    distance: entry.distance,
                    path: self.path_to(graph, node)?,
                })
            })
            .collect();
        roots.sort_by_key(|root| root.node);
        roots
    }

    /// Virtual nodes reached with the weight between them and the origin
    pub fn virtual_nodes<'a>(&'a self, graph: &'a QueryGraph) -> impl Iterator<Item = (NodeId, Weight)> + 'a {
        self.tree
            .entries()
            .filter(|(node, _)| graph.is_virtual_node(*node))
            .map(|(node, entry)| (node, entry.weight))
    }
}
