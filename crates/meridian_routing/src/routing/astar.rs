use std::time::Instant;

use tracing::debug;

use crate::{
    constants::MAX_WEIGHT,
    error::RoutingError,
    geopoint::GeoPoint,
    graph::{GeometryAccess, UndirectedEdgeAccess},
    graph_edge::GraphEdge,
    types::NodeId,
    weighting::Weighting,
};

use super::{
    astar_heuristic::{AStarHeuristic, ZeroHeuristic},
    routing_path_builder::forward_search_path,
    search_budget::SearchBudget,
    shortest_path_algorithm::{
        CalcPathDebugInfo, CalcPathOptions, CalcPathResult, SearchPath, ShortestPathAlgorithm,
    },
    shortest_path_tree::ShortestPathTree,
};

/// Unidirectional A* over an undirected edge store.
///
/// https://en.wikipedia.org/wiki/A*_search_algorithm
pub struct AStar<'a, G, W: ?Sized, H> {
    graph: &'a G,
    weighting: &'a W,
    heuristic: H,
    tree: ShortestPathTree,
}

pub type Dijkstra<'a, G, W> = AStar<'a, G, W, ZeroHeuristic>;

impl<'a, G, W> Dijkstra<'a, G, W>
where
    G: UndirectedEdgeAccess + GeometryAccess,
    W: Weighting<G::Edge> + ?Sized,
{
    pub fn new(graph: &'a G, weighting: &'a W) -> Self {
        AStar::with_heuristic(graph, weighting, ZeroHeuristic)
    }
}

impl<'a, G, W, H> AStar<'a, G, W, H>
where
    G: UndirectedEdgeAccess + GeometryAccess,
    W: Weighting<G::Edge> + ?Sized,
    H: AStarHeuristic,
{
    pub fn with_heuristic(graph: &'a G, weighting: &'a W, heuristic: H) -> Self {
        AStar {
            graph,
            weighting,
            heuristic,
            tree: ShortestPathTree::new(),
        }
    }

    fn search(
        &mut self,
        start: NodeId,
        end: NodeId,
        budget: &mut SearchBudget,
    ) -> Result<SearchPath, RoutingError> {
        self.tree.clear();
        self.tree.init_root(
            start,
            self.heuristic
                .estimate(self.graph, self.weighting, start, end),
        );

        while let Some((node, entry)) = self.tree.settle_next() {
            budget.visit()?;

            if node == end {
                return forward_search_path(self.graph, &self.tree, end)
                    .ok_or(RoutingError::NoPathFound);
            }

            for edge_id in self.graph.node_edges_iter(node) {
                let edge = self.graph.edge(edge_id);
                let adj_node = edge.adj_node(node);
                if adj_node == node {
                    continue;
                }

                let direction = self.graph.edge_direction(edge_id, node);
                let edge_weight = self.weighting.calc_edge_weight(edge, direction);
                if edge_weight == MAX_WEIGHT {
                    continue;
                }

                let weight = entry.weight.saturating_add(edge_weight);
                if weight >= MAX_WEIGHT {
                    continue;
                }

                let improves = self
                    .tree
                    .entry(adj_node)
                    .is_none_or(|adj_entry| weight < adj_entry.weight);
                if !improves {
                    continue;
                }

                let time = entry
                    .time
                    .saturating_add(self.weighting.calc_edge_ms(edge, direction));
                let distance = entry.distance + edge.distance();
                let key = weight.saturating_add(self.heuristic.estimate(
                    self.graph,
                    self.weighting,
                    adj_node,
                    end,
                ));
                // Only heuristics that are not consistent reopen settled nodes
                self.tree
                    .relax_or_reopen(adj_node, weight, time, distance, node, edge_id, key);
            }
        }

        Err(RoutingError::NoPathFound)
    }

    fn debug_info(&self) -> CalcPathDebugInfo {
        let forward_visited_nodes: Vec<GeoPoint> = self
            .tree
            .settled_entries()
            .map(|(node_id, _)| *self.graph.node_geometry(node_id))
            .collect();

        CalcPathDebugInfo {
            forward_visited_nodes,
            backward_visited_nodes: Vec::new(),
        }
    }

    pub fn tree(&self) -> &ShortestPathTree {
        &self.tree
    }
}

impl<G, W, H> ShortestPathAlgorithm for AStar<'_, G, W, H>
where
    G: UndirectedEdgeAccess + GeometryAccess,
    W: Weighting<G::Edge> + ?Sized,
    H: AStarHeuristic,
{
    fn calc_path(
        &mut self,
        start: NodeId,
        end: NodeId,
        options: &CalcPathOptions,
    ) -> Result<CalcPathResult, RoutingError> {
        for node in [start, end] {
            if node >= self.graph.node_count() {
                return Err(RoutingError::InvalidNode(node));
            }
        }

        let started_at = Instant::now();

        if start == end {
            return Ok(CalcPathResult {
                path: SearchPath::empty(start),
                nodes_visited: 0,
                duration: started_at.elapsed(),
                debug: options.include_debug_info.then(CalcPathDebugInfo::default),
            });
        }

        let mut budget = SearchBudget::from_options(options);
        let path = self.search(start, end, &mut budget)?;

        debug!(
            start,
            end,
            nodes_visited = budget.visited_nodes(),
            weight = path.weight,
            "astar path found"
        );

        Ok(CalcPathResult {
            path,
            nodes_visited: budget.visited_nodes(),
            duration: started_at.elapsed(),
            debug: options.include_debug_info.then(|| self.debug_info()),
        })
    }
}
