use std::time::Instant;

use tracing::debug;

use crate::{
    constants::{INVALID_NODE, MAX_WEIGHT},
    edge_direction::EdgeDirection,
    error::RoutingError,
    graph::{DirectedEdgeAccess, Graph, NodeRank},
    graph_edge::GraphEdge,
    query::{
        query_graph::QueryGraph,
        virtual_access::{AccessRoot, VirtualAccess},
    },
    routing::{
        routing_path_builder::bidirectional_search_path,
        search_budget::SearchBudget,
        search_direction::SearchDirection,
        shortest_path_algorithm::{
            CalcPathDebugInfo, CalcPathOptions, CalcPathResult, SearchPath, ShortestPathAlgorithm,
        },
        shortest_path_tree::ShortestPathTree,
    },
    types::{EdgeId, NodeId},
    weighting::{Weight, Weighting},
};

use super::{ch_edge::CHEdge, ch_graph::CHGraph, ch_storage::CHStorage, ch_weighting::CHWeighting};

/// Settles `node` in an upward search and relaxes its edges towards higher ranked nodes.
/// Returns the settled node, `None` when the tree is exhausted.
pub(crate) fn settle_upward(
    graph: &CHGraph,
    tree: &mut ShortestPathTree,
    direction: SearchDirection,
    budget: &mut SearchBudget,
) -> Result<Option<NodeId>, RoutingError> {
    let Some((node, entry)) = tree.settle_next() else {
        return Ok(None);
    };
    budget.visit()?;

    let edges = match direction {
        SearchDirection::Forward => graph.node_outgoing_edges_iter(node),
        SearchDirection::Backward => graph.node_incoming_edges_iter(node),
    };
    let node_rank = graph.node_rank(node);

    for edge_id in edges {
        let edge = graph.edge(edge_id);
        let adj_node = edge.adj_node(node);
        if graph.node_rank(adj_node) <= node_rank {
            continue;
        }

        let traversal = match direction {
            SearchDirection::Forward => graph.edge_direction(edge_id, node),
            SearchDirection::Backward => graph.edge_direction(edge_id, adj_node),
        };

        let edge_weight = CHWeighting.calc_edge_weight(edge, traversal);
        if edge_weight == MAX_WEIGHT {
            continue;
        }

        let weight = entry.weight.saturating_add(edge_weight);
        if weight >= MAX_WEIGHT {
            continue;
        }

        let time = entry
            .time
            .saturating_add(CHWeighting.calc_edge_ms(edge, traversal));
        let distance = entry.distance + edge.distance();
        tree.relax(adj_node, weight, time, distance, node, edge_id, weight);
    }

    Ok(Some(node))
}

/// Complete upward search tree grown from `roots`
pub(crate) fn upward_tree(
    graph: &CHGraph,
    roots: &[AccessRoot],
    direction: SearchDirection,
    budget: &mut SearchBudget,
) -> Result<ShortestPathTree, RoutingError> {
    let mut tree = ShortestPathTree::new();
    for root in roots {
        tree.init_weighted_root(root.node, root.weight, root.time, root.distance);
    }
    while settle_upward(graph, &mut tree, direction, budget)?.is_some() {}
    Ok(tree)
}

/// Replaces the first and last node of a hierarchy path by the access paths leading
/// to them. The costs of `path` already include the access.
fn attach_access(path: SearchPath, sources: &[AccessRoot], targets: &[AccessRoot]) -> Option<SearchPath> {
    let source = sources.iter().find(|root| Some(root.node) == path.start_node())?;
    let target = targets.iter().find(|root| Some(root.node) == path.end_node())?;

    let mut nodes = source.path.nodes.clone();
    nodes.extend(path.nodes.iter().skip(1));
    nodes.extend(target.path.nodes.iter().skip(1));

    let mut edges = source.path.edges.clone();
    edges.extend(path.edges);
    edges.extend(target.path.edges.iter().copied());

    Some(SearchPath {
        weight: path.weight,
        time: path.time,
        distance: path.distance,
        nodes,
        edges,
    })
}

/// Bidirectional upward Dijkstra on a prepared hierarchy
pub struct CHQuery<'a> {
    graph: CHGraph<'a>,

    forward: ShortestPathTree,
    backward: ShortestPathTree,

    best_meeting_node: NodeId,
    best_path_weight: Weight,
}

impl<'a> CHQuery<'a> {
    pub fn new(storage: &'a CHStorage) -> Self {
        CHQuery {
            graph: CHGraph::new(storage),
            forward: ShortestPathTree::new(),
            backward: ShortestPathTree::new(),
            best_meeting_node: INVALID_NODE,
            best_path_weight: MAX_WEIGHT,
        }
    }

    fn update_meeting(&mut self, node: NodeId) {
        if let (Some(forward), Some(backward)) = (self.forward.entry(node), self.backward.entry(node)) {
            let total = forward.weight.saturating_add(backward.weight);
            if total < self.best_path_weight {
                self.best_path_weight = total;
                self.best_meeting_node = node;
            }
        }
    }

    fn expand(&mut self, direction: SearchDirection, budget: &mut SearchBudget) -> Result<(), RoutingError> {
        let tree = match direction {
            SearchDirection::Forward => &mut self.forward,
            SearchDirection::Backward => &mut self.backward,
        };

        let Some(node) = settle_upward(&self.graph, tree, direction, budget)? else {
            return Ok(());
        };

        self.update_meeting(node);

        let edges: Vec<EdgeId> = match direction {
            SearchDirection::Forward => self.graph.node_outgoing_edges_iter(node).collect(),
            SearchDirection::Backward => self.graph.node_incoming_edges_iter(node).collect(),
        };
        for edge_id in edges {
            let adj_node = self.graph.edge(edge_id).adj_node(node);
            self.update_meeting(adj_node);
        }

        Ok(())
    }

    fn search(
        &mut self,
        sources: &[AccessRoot],
        targets: &[AccessRoot],
        budget: &mut SearchBudget,
    ) -> Result<SearchPath, RoutingError> {
        self.forward.clear();
        self.backward.clear();
        for root in sources {
            self.forward
                .init_weighted_root(root.node, root.weight, root.time, root.distance);
        }
        for root in targets {
            self.backward
                .init_weighted_root(root.node, root.weight, root.time, root.distance);
        }
        self.best_meeting_node = INVALID_NODE;
        self.best_path_weight = MAX_WEIGHT;

        loop {
            // A direction is done once its queue head cannot improve the best meeting
            let forward_min = self.forward.min_key();
            let backward_min = self.backward.min_key();
            let forward_active = forward_min < self.best_path_weight;
            let backward_active = backward_min < self.best_path_weight;

            let direction = match (forward_active, backward_active) {
                (false, false) => break,
                (true, false) => SearchDirection::Forward,
                (false, true) => SearchDirection::Backward,
                (true, true) if forward_min <= backward_min => SearchDirection::Forward,
                (true, true) => SearchDirection::Backward,
            };
            self.expand(direction, budget)?;
        }

        if self.best_meeting_node == INVALID_NODE {
            return Err(RoutingError::NoPathFound);
        }

        let ch_path = bidirectional_search_path(&self.graph, &self.forward, &self.backward, self.best_meeting_node)
            .ok_or(RoutingError::NoPathFound)?;

        Ok(self.unpack(ch_path))
    }

    /// Path between two nodes of a query graph laid over the hierarchy's base graph,
    /// in query graph edges.
    ///
    /// Snapped points leave and enter the hierarchy through the base nodes of the edge
    /// they lie on, paying for the piece of edge in between. Two points on the same
    /// edge may also be joined along that edge without entering the hierarchy.
    /// `weighting` must be the one the hierarchy was prepared with.
    pub fn calc_query_path<W>(
        &mut self,
        query_graph: &QueryGraph,
        weighting: &W,
        start: NodeId,
        end: NodeId,
        options: &CalcPathOptions,
    ) -> Result<CalcPathResult, RoutingError>
    where
        W: Weighting + ?Sized,
    {
        for node in [start, end] {
            if node >= query_graph.node_count() {
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

        let source_access = VirtualAccess::new(query_graph, weighting, start, SearchDirection::Forward);
        let target_access = VirtualAccess::new(query_graph, weighting, end, SearchDirection::Backward);
        let sources = source_access.roots(query_graph);
        let targets = target_access.roots(query_graph);
        let along_edge = source_access.path_to(query_graph, end);

        let mut budget = SearchBudget::from_options(options);
        let through_hierarchy = if sources.is_empty() || targets.is_empty() {
            Err(RoutingError::NoPathFound)
        } else {
            self.search(&sources, &targets, &mut budget)
                .and_then(|path| attach_access(path, &sources, &targets).ok_or(RoutingError::NoPathFound))
        };

        let path = match (through_hierarchy, along_edge) {
            (Ok(path), Some(direct)) if direct.weight <= path.weight => direct,
            (Ok(path), _) => path,
            (Err(RoutingError::NoPathFound), Some(direct)) => direct,
            (Err(error), _) => return Err(error),
        };

        debug!(
            start,
            end,
            sources = sources.len(),
            targets = targets.len(),
            nodes_visited = budget.visited_nodes(),
            weight = path.weight,
            "ch query graph path found"
        );

        Ok(CalcPathResult {
            path,
            nodes_visited: budget.visited_nodes(),
            duration: started_at.elapsed(),
            debug: options.include_debug_info.then(CalcPathDebugInfo::default),
        })
    }

    /// Replaces the hierarchy edges of a path by the base edges they stand for
    fn unpack(&self, ch_path: SearchPath) -> SearchPath {
        let storage = self.graph.storage();

        let mut base_edges = Vec::with_capacity(ch_path.edges.len());
        for (&(edge_id, _), &from) in ch_path.edges.iter().zip(ch_path.nodes.iter()) {
            storage.unpack_edge(edge_id, from, &mut base_edges);
        }

        let mut nodes = Vec::with_capacity(base_edges.len() + 1);
        nodes.extend(ch_path.nodes.first().copied());
        for &(base_edge, direction) in &base_edges {
            if let CHEdge::Base(edge) = storage.edge(base_edge) {
                nodes.push(match direction {
                    EdgeDirection::Forward => edge.end,
                    EdgeDirection::Backward => edge.start,
                });
            }
        }

        SearchPath {
            weight: ch_path.weight,
            time: ch_path.time,
            distance: ch_path.distance,
            nodes,
            edges: base_edges,
        }
    }
}

impl ShortestPathAlgorithm for CHQuery<'_> {
    /// Returns the path in base graph edges
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
        let path = self.search(&[AccessRoot::at(start)], &[AccessRoot::at(end)], &mut budget)?;

        debug!(
            start,
            end,
            nodes_visited = budget.visited_nodes(),
            weight = path.weight,
            "ch path found"
        );

        Ok(CalcPathResult {
            path,
            nodes_visited: budget.visited_nodes(),
            duration: started_at.elapsed(),
            // Hierarchy nodes carry no coordinates
            debug: options.include_debug_info.then(CalcPathDebugInfo::default),
        })
    }
}
