use std::time::Instant;

use tracing::debug;

use crate::{
    constants::{INVALID_NODE, MAX_WEIGHT},
    error::RoutingError,
    geopoint::GeoPoint,
    graph::{GeometryAccess, UndirectedEdgeAccess},
    graph_edge::GraphEdge,
    types::NodeId,
    weighting::{Weight, Weighting},
};

use super::{
    routing_path_builder::bidirectional_search_path,
    search_budget::SearchBudget,
    search_direction::SearchDirection,
    shortest_path_algorithm::{
        CalcPathDebugInfo, CalcPathOptions, CalcPathResult, SearchPath, ShortestPathAlgorithm,
    },
    shortest_path_tree::ShortestPathTree,
};

/// Dijkstra growing one tree from the start and one from the end, always expanding the
/// direction with the smaller queue head. Stops once both heads together reach the best
/// meeting weight.
pub struct BidirectionalDijkstra<'a, G, W: ?Sized> {
    graph: &'a G,
    weighting: &'a W,

    forward: ShortestPathTree,
    backward: ShortestPathTree,

    best_meeting_node: NodeId,
    best_path_weight: Weight,
}

impl<'a, G, W> BidirectionalDijkstra<'a, G, W>
where
    G: UndirectedEdgeAccess + GeometryAccess,
    W: Weighting<G::Edge> + ?Sized,
{
    pub fn new(graph: &'a G, weighting: &'a W) -> Self {
        BidirectionalDijkstra {
            graph,
            weighting,
            forward: ShortestPathTree::new(),
            backward: ShortestPathTree::new(),
            best_meeting_node: INVALID_NODE,
            best_path_weight: MAX_WEIGHT,
        }
    }

    fn init(&mut self, start: NodeId, end: NodeId) {
        self.forward.clear();
        self.backward.clear();
        self.forward.init_root(start, 0);
        self.backward.init_root(end, 0);
        self.best_meeting_node = INVALID_NODE;
        self.best_path_weight = MAX_WEIGHT;
    }

    fn trees(&mut self, direction: SearchDirection) -> (&mut ShortestPathTree, &ShortestPathTree) {
        match direction {
            SearchDirection::Forward => (&mut self.forward, &self.backward),
            SearchDirection::Backward => (&mut self.backward, &self.forward),
        }
    }

    fn update_meeting(&mut self, node: NodeId, weight: Weight, direction: SearchDirection) {
        let opposite = match direction {
            SearchDirection::Forward => &self.backward,
            SearchDirection::Backward => &self.forward,
        };

        if let Some(entry) = opposite.entry(node) {
            let total = weight.saturating_add(entry.weight);
            if total < self.best_path_weight {
                self.best_path_weight = total;
                self.best_meeting_node = node;
            }
        }
    }

    fn expand(&mut self, direction: SearchDirection, budget: &mut SearchBudget) -> Result<(), RoutingError> {
        let graph = self.graph;
        let weighting = self.weighting;

        let Some((node, entry)) = self.trees(direction).0.settle_next() else {
            return Ok(());
        };
        budget.visit()?;
        self.update_meeting(node, entry.weight, direction);

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

            let (tree, _) = self.trees(direction);
            if tree.relax(adj_node, weight, time, distance, node, edge_id, weight) {
                self.update_meeting(adj_node, weight, direction);
            }
        }

        Ok(())
    }

    fn search(&mut self, start: NodeId, end: NodeId, budget: &mut SearchBudget) -> Result<SearchPath, RoutingError> {
        self.init(start, end);

        loop {
            let forward_min = self.forward.min_key();
            let backward_min = self.backward.min_key();

            if forward_min == MAX_WEIGHT
                || backward_min == MAX_WEIGHT
                || forward_min.saturating_add(backward_min) >= self.best_path_weight
            {
                break;
            }

            let direction = if forward_min <= backward_min {
                SearchDirection::Forward
            } else {
                SearchDirection::Backward
            };
            self.expand(direction, budget)?;
        }

        if self.best_meeting_node == INVALID_NODE {
            return Err(RoutingError::NoPathFound);
        }

        bidirectional_search_path(self.graph, &self.forward, &self.backward, self.best_meeting_node)
            .ok_or(RoutingError::NoPathFound)
    }

    fn debug_info(&self) -> CalcPathDebugInfo {
        let visited = |tree: &ShortestPathTree| -> Vec<GeoPoint> {
            tree.settled_entries()
                .map(|(node_id, _)| *self.graph.node_geometry(node_id))
                .collect()
        };

        CalcPathDebugInfo {
            forward_visited_nodes: visited(&self.forward),
            backward_visited_nodes: visited(&self.backward),
        }
    }
}

impl<G, W> ShortestPathAlgorithm for BidirectionalDijkstra<'_, G, W>
where
    G: UndirectedEdgeAccess + GeometryAccess,
    W: Weighting<G::Edge> + ?Sized,
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
            "bidirectional dijkstra path found"
        );

        Ok(CalcPathResult {
            path,
            nodes_visited: budget.visited_nodes(),
            duration: started_at.elapsed(),
            debug: options.include_debug_info.then(|| self.debug_info()),
        })
    }
}
