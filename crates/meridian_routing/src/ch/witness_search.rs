use std::collections::BinaryHeap;

use fxhash::FxHashMap;

use crate::{
    constants::MAX_WEIGHT,
    routing::shortest_path_tree::HeapItem,
    types::NodeId,
    weighting::Weight,
};

use super::preparation_graph::CHPreparationGraph;

#[derive(Clone, Copy)]
struct WitnessEntry {
    weight: Weight,
    settled: bool,
}

/// Bounded local Dijkstra looking for paths that avoid the node being contracted.
///
/// Tentative weights are paths too, so an unsettled target still yields a valid witness.
pub(crate) struct WitnessSearch {
    heap: BinaryHeap<HeapItem>,
    entries: FxHashMap<NodeId, WitnessEntry>,
    sequence: u64,
    settled_nodes: usize,
}

impl WitnessSearch {
    pub fn new() -> Self {
        WitnessSearch {
            heap: BinaryHeap::new(),
            entries: FxHashMap::default(),
            sequence: 0,
            settled_nodes: 0,
        }
    }

    fn push(&mut self, node_id: NodeId, weight: Weight) {
        self.entries.insert(
            node_id,
            WitnessEntry {
                weight,
                settled: false,
            },
        );
        self.heap.push(HeapItem {
            key: weight,
            sequence: self.sequence,
            node_id,
        });
        self.sequence += 1;
    }

    /// Searches from `source` without passing `avoid` until every target is settled,
    /// `max_weight` is exceeded or `max_settled_nodes` nodes are settled
    pub fn run(
        &mut self,
        graph: &CHPreparationGraph,
        source: NodeId,
        avoid: NodeId,
        targets: &[NodeId],
        max_weight: Weight,
        max_settled_nodes: usize,
    ) {
        self.heap.clear();
        self.entries.clear();
        self.sequence = 0;
        self.settled_nodes = 0;
        self.push(source, 0);

        let mut remaining_targets = targets.len();

        while let Some(HeapItem { key, node_id, .. }) = self.heap.pop() {
            if key > max_weight || self.settled_nodes >= max_settled_nodes {
                break;
            }

            let Some(entry) = self.entries.get_mut(&node_id) else {
                continue;
            };
            if entry.settled || entry.weight < key {
                continue;
            }
            entry.settled = true;
            self.settled_nodes += 1;

            if targets.contains(&node_id) {
                remaining_targets -= 1;
                if remaining_targets == 0 {
                    break;
                }
            }

            for &arc_id in graph.out_arcs(node_id) {
                let arc = graph.arc(arc_id);
                if arc.to == avoid {
                    continue;
                }

                let weight = key.saturating_add(arc.weight);
                if weight > max_weight {
                    continue;
                }

                let improves = self
                    .entries
                    .get(&arc.to)
                    .is_none_or(|entry| !entry.settled && weight < entry.weight);
                if improves {
                    self.push(arc.to, weight);
                }
            }
        }
    }

    /// Best witness weight found for `node`, `MAX_WEIGHT` if none
    pub fn weight(&self, node: NodeId) -> Weight {
        self.entries.get(&node).map_or(MAX_WEIGHT, |entry| entry.weight)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        properties::property::TravelMode,
        test_graph_utils::test_graph::ring_with_chord_graph,
        weighting::shortest::ShortestWeighting,
    };

    use super::*;

    #[test]
    fn finds_paths_around_the_avoided_node() {
        let graph = ring_with_chord_graph();
        let preparation_graph =
            CHPreparationGraph::new(&graph, &ShortestWeighting::new(TravelMode::Foot));
        let mut witness_search = WitnessSearch::new();

        witness_search.run(&preparation_graph, 1, 0, &[3, 5], 10, 100);
        assert_eq!(witness_search.weight(3), 2);
        assert_eq!(witness_search.weight(5), 4);
    }

    #[test]
    fn stops_at_weight_limit() {
        let graph = ring_with_chord_graph();
        let preparation_graph =
            CHPreparationGraph::new(&graph, &ShortestWeighting::new(TravelMode::Foot));
        let mut witness_search = WitnessSearch::new();

        witness_search.run(&preparation_graph, 1, 0, &[5], 2, 100);
        assert_eq!(witness_search.weight(5), MAX_WEIGHT);
    }
}
