use fxhash::{FxHashMap, FxHashSet};

use crate::{
    constants::MAX_WEIGHT,
    error::RoutingError,
    graph::UndirectedEdgeAccess,
    graph_edge::GraphEdge,
    types::NodeId,
    weighting::{Weight, Weighting},
};

use super::{
    search_budget::SearchBudget,
    search_direction::SearchDirection,
    shortest_path_tree::{ShortestPathTree, TreeEntry},
};

/// Single source Dijkstra that keeps its whole tree, for one-to-many queries and
/// cost bounded reachability.
pub struct DijkstraSearch<'a, G, W: ?Sized> {
    graph: &'a G,
    weighting: &'a W,
    tree: ShortestPathTree,
}

impl<'a, G, W> DijkstraSearch<'a, G, W>
where
    G: UndirectedEdgeAccess,
    W: Weighting<G::Edge> + ?Sized,
{
    pub fn new(graph: &'a G, weighting: &'a W) -> Self {
        DijkstraSearch {
            graph,
            weighting,
            tree: ShortestPathTree::new(),
        }
    }

    /// Settles nodes in weight order until `stop` returns true for a settled node or no
    /// node within `max_weight` is left. A backward search follows edges against their
    /// direction, so its labels are the weights of reaching the sources.
    fn run(
        &mut self,
        sources: &[NodeId],
        direction: SearchDirection,
        max_weight: Weight,
        budget: &mut SearchBudget,
        mut stop: impl FnMut(NodeId) -> bool,
    ) -> Result<(), RoutingError> {
        if let Some(&source) = sources.iter().find(|&&source| source >= self.graph.node_count()) {
            return Err(RoutingError::InvalidNode(source));
        }

        self.tree.clear();
        for &source in sources {
            self.tree.init_root(source, 0);
        }

        while self.tree.min_key() <= max_weight {
            let Some((node, entry)) = self.tree.settle_next() else {
                break;
            };
            budget.visit()?;

            if stop(node) {
                break;
            }

            for edge_id in self.graph.node_edges_iter(node) {
                let edge = self.graph.edge(edge_id);
                let adj_node = edge.adj_node(node);
                if adj_node == node || self.tree.is_settled(adj_node) {
                    continue;
                }

                let traversal = direction.traversal(self.graph.edge_direction(edge_id, node));
                let edge_weight = self.weighting.calc_edge_weight(edge, traversal);
                if edge_weight == MAX_WEIGHT {
                    continue;
                }

                let weight = entry.weight.saturating_add(edge_weight);
                if weight > max_weight || weight >= MAX_WEIGHT {
                    continue;
                }

                if self
                    .tree
                    .entry(adj_node)
                    .is_some_and(|adj_entry| adj_entry.weight <= weight)
                {
                    continue;
                }

                let time = entry
                    .time
                    .saturating_add(self.weighting.calc_edge_ms(edge, traversal));
                let distance = entry.distance + edge.distance();
                self.tree
                    .relax(adj_node, weight, time, distance, node, edge_id, weight);
            }
        }

        Ok(())
    }

    /// Labels of `targets`, `None` for unreachable ones. Stops as soon as every target is settled.
    pub fn calc_one_to_many(
        &mut self,
        source: NodeId,
        targets: &[NodeId],
        budget: &mut SearchBudget,
    ) -> Result<Vec<Option<TreeEntry>>, RoutingError> {
        let mut remaining: FxHashSet<NodeId> = targets.iter().copied().collect();

        self.run(&[source], SearchDirection::Forward, MAX_WEIGHT - 1, budget, |node| {
            remaining.remove(&node);
            remaining.is_empty()
        })?;

        Ok(targets
            .iter()
            .map(|target| {
                self.tree
                    .entry(*target)
                    .filter(|entry| entry.settled)
                    .copied()
            })
            .collect())
    }

    /// Every node whose cheapest path from `source` weighs at most `max_weight`
    pub fn calc_reachable(
        &mut self,
        source: NodeId,
        max_weight: Weight,
        budget: &mut SearchBudget,
    ) -> Result<FxHashMap<NodeId, TreeEntry>, RoutingError> {
        self.run(&[source], SearchDirection::Forward, max_weight, budget, |_| false)?;

        Ok(self
            .tree
            .settled_entries()
            .map(|(node_id, entry)| (node_id, *entry))
            .collect())
    }

    /// Complete tree grown from `sources`. Returns the node settled last, the one
    /// farthest from every source.
    pub(crate) fn calc_tree(
        &mut self,
        sources: &[NodeId],
        direction: SearchDirection,
        budget: &mut SearchBudget,
    ) -> Result<Option<NodeId>, RoutingError> {
        let mut last = None;
        self.run(sources, direction, MAX_WEIGHT - 1, budget, |node| {
            last = Some(node);
            false
        })?;
        Ok(last)
    }

    pub fn tree(&self) -> &ShortestPathTree {
        &self.tree
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        edge_direction::EdgeDirection,
        graph::Graph,
        properties::property::TravelMode,
        routing::{
            astar::Dijkstra,
            shortest_path_algorithm::{CalcPathOptions, ShortestPathAlgorithm},
        },
        test_graph_utils::test_graph::{grid_graph, line_graph, random_graph},
        weighting::{fastest::FastestWeighting, shortest::ShortestWeighting},
    };

    use super::*;

    #[test]
    fn one_to_many_matches_point_to_point() {
        let graph = random_graph(7, 80, 200);
        let weighting = FastestWeighting::new(TravelMode::Car);
        let targets: Vec<NodeId> = (0..80).step_by(9).collect();

        let mut search = DijkstraSearch::new(&graph, &weighting);
        let entries = search
            .calc_one_to_many(3, &targets, &mut SearchBudget::unlimited())
            .unwrap();

        let mut dijkstra = Dijkstra::new(&graph, &weighting);
        for (target, entry) in targets.iter().zip(entries) {
            match dijkstra.calc_path(3, *target, &CalcPathOptions::default()) {
                Ok(result) => assert_eq!(entry.map(|entry| entry.weight), Some(result.path.weight)),
                Err(_) => assert!(entry.is_none()),
            }
        }
    }

    #[test]
    fn cost_limit_is_inclusive() {
        let graph = line_graph(5, TravelMode::Foot, 5.0);
        let weighting = ShortestWeighting::new(TravelMode::Foot);
        let mut search = DijkstraSearch::new(&graph, &weighting);

        let reachable = search
            .calc_reachable(0, 0, &mut SearchBudget::unlimited())
            .unwrap();
        assert_eq!(reachable.len(), 1);

        let one_edge = weighting.calc_edge_weight(graph.edge(0), EdgeDirection::Forward);
        let reachable = search
            .calc_reachable(0, one_edge, &mut SearchBudget::unlimited())
            .unwrap();
        let mut nodes: Vec<NodeId> = reachable.keys().copied().collect();
        nodes.sort();
        assert_eq!(nodes, vec![0, 1]);
    }

    #[test]
    fn reachable_set_respects_budget() {
        let graph = grid_graph(10, 10, 0.001, TravelMode::Car, 50.0);
        let weighting = ShortestWeighting::new(TravelMode::Car);
        let mut search = DijkstraSearch::new(&graph, &weighting);

        let result = search.calc_reachable(0, MAX_WEIGHT - 1, &mut SearchBudget::new(10, None));
        assert_eq!(
            result.unwrap_err(),
            RoutingError::NodeLimitExceeded {
                max_visited_nodes: 10
            }
        );
    }

    #[test]
    fn backward_tree_holds_weights_towards_the_source() {
        let graph = random_graph(11, 40, 100);
        let weighting = FastestWeighting::new(TravelMode::Car);
        let mut search = DijkstraSearch::new(&graph, &weighting);
        search
            .calc_tree(&[5], SearchDirection::Backward, &mut SearchBudget::unlimited())
            .unwrap();

        let mut dijkstra = Dijkstra::new(&graph, &weighting);
        for node in (0..40).step_by(3) {
            let label = search.tree().entry(node).map(|entry| entry.weight);
            match dijkstra.calc_path(node, 5, &CalcPathOptions::default()) {
                Ok(result) => assert_eq!(label, Some(result.path.weight)),
                Err(_) => assert_eq!(label, None),
            }
        }
    }

    #[test]
    fn farthest_node_is_settled_last() {
        let graph = line_graph(6, TravelMode::Foot, 5.0);
        let weighting = ShortestWeighting::new(TravelMode::Foot);
        let mut search = DijkstraSearch::new(&graph, &weighting);

        let farthest = search
            .calc_tree(&[0], SearchDirection::Forward, &mut SearchBudget::unlimited())
            .unwrap();
        assert_eq!(farthest, Some(5));

        let farthest = search
            .calc_tree(&[0, 5], SearchDirection::Forward, &mut SearchBudget::unlimited())
            .unwrap();
        assert!(matches!(farthest, Some(2) | Some(3)));
    }
}
