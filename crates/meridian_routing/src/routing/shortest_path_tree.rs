use std::{cmp::Ordering, collections::BinaryHeap};

use fxhash::FxHashMap;

use crate::{
    constants::{INVALID_EDGE, INVALID_NODE, MAX_WEIGHT},
    distance::{Distance, Meters},
    types::{EdgeId, NodeId},
    weighting::{Milliseconds, Weight},
};

/// Queue entry ordered by key, ties broken by insertion order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapItem {
    pub key: Weight,
    pub sequence: u64,
    pub node_id: NodeId,
}

impl Ord for HeapItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap
        other
            .key
            .cmp(&self.key)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for HeapItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeEntry {
    pub weight: Weight,
    pub time: Milliseconds,
    pub distance: Distance<Meters>,
    /// Neighbor the node was reached from, `INVALID_NODE` for the root
    pub parent: NodeId,
    pub edge_id: EdgeId,
    pub settled: bool,
}

impl TreeEntry {
    pub fn is_root(&self) -> bool {
        self.parent == INVALID_NODE
    }
}

/// Labels and priority queue of a single search direction
#[derive(Debug, Default)]
pub struct ShortestPathTree {
    entries: FxHashMap<NodeId, TreeEntry>,
    heap: BinaryHeap<HeapItem>,
    sequence: u64,
}

impl ShortestPathTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.heap.clear();
        self.sequence = 0;
    }

    pub fn init_root(&mut self, node_id: NodeId, key: Weight) {
        self.entries.insert(
            node_id,
            TreeEntry {
                weight: 0,
                time: 0,
                distance: Distance::default(),
                parent: INVALID_NODE,
                edge_id: INVALID_EDGE,
                settled: false,
            },
        );
        self.push(node_id, key);
    }

    /// Adds a root that already carries the cost of reaching it. Several roots may
    /// share a tree; for the same node the cheaper one wins.
    pub fn init_weighted_root(
        &mut self,
        node_id: NodeId,
        weight: Weight,
        time: Milliseconds,
        distance: Distance<Meters>,
    ) {
        if self
            .entries
            .get(&node_id)
            .is_some_and(|entry| entry.weight <= weight)
        {
            return;
        }

        self.entries.insert(
            node_id,
            TreeEntry {
                weight,
                time,
                distance,
                parent: INVALID_NODE,
                edge_id: INVALID_EDGE,
                settled: false,
            },
        );
        self.push(node_id, weight);
    }

    /// Node the branch of `node_id` starts from
    pub fn root_of(&self, node_id: NodeId) -> Option<NodeId> {
        let mut current = node_id;
        loop {
            let entry = self.entries.get(&current)?;
            if entry.is_root() {
                return Some(current);
            }
            current = entry.parent;
        }
    }

    fn push(&mut self, node_id: NodeId, key: Weight) {
        self.heap.push(HeapItem {
            key,
            sequence: self.sequence,
            node_id,
        });
        self.sequence += 1;
    }

    /// Lowers the label of `node_id` if `weight` improves it. Returns whether it did.
    #[allow(clippy::too_many_arguments)]
    pub fn relax(
        &mut self,
        node_id: NodeId,
        weight: Weight,
        time: Milliseconds,
        distance: Distance<Meters>,
        parent: NodeId,
        edge_id: EdgeId,
        key: Weight,
    ) -> bool {
        if self.is_settled(node_id) {
            return false;
        }
        self.relax_or_reopen(node_id, weight, time, distance, parent, edge_id, key)
    }

    /// Like [`relax`](Self::relax), but a settled node whose label improves is queued
    /// again. Needed by searches whose heuristic is admissible without being consistent.
    #[allow(clippy::too_many_arguments)]
    pub fn relax_or_reopen(
        &mut self,
        node_id: NodeId,
        weight: Weight,
        time: Milliseconds,
        distance: Distance<Meters>,
        parent: NodeId,
        edge_id: EdgeId,
        key: Weight,
    ) -> bool {
        if self
            .entries
            .get(&node_id)
            .is_some_and(|entry| entry.weight <= weight)
        {
            return false;
        }

        self.entries.insert(
            node_id,
            TreeEntry {
                weight,
                time,
                distance,
                parent,
                edge_id,
                settled: false,
            },
        );
        self.push(node_id, key);
        true
    }

    fn discard_stale(&mut self) {
        while let Some(item) = self.heap.peek() {
            let stale = self
                .entries
                .get(&item.node_id)
                .is_none_or(|entry| entry.settled);
            if !stale {
                break;
            }
            self.heap.pop();
        }
    }

    /// Smallest key of an unsettled node, `MAX_WEIGHT` when the queue is exhausted
    pub fn min_key(&mut self) -> Weight {
        self.discard_stale();
        self.heap.peek().map_or(MAX_WEIGHT, |item| item.key)
    }

    /// Pops and settles the next node
    pub fn settle_next(&mut self) -> Option<(NodeId, TreeEntry)> {
        self.discard_stale();
        let item = self.heap.pop()?;
        let entry = self.entries.get_mut(&item.node_id)?;
        entry.settled = true;
        Some((item.node_id, *entry))
    }

    pub fn entry(&self, node_id: NodeId) -> Option<&TreeEntry> {
        self.entries.get(&node_id)
    }

    pub fn is_settled(&self, node_id: NodeId) -> bool {
        self.entries
            .get(&node_id)
            .is_some_and(|entry| entry.settled)
    }

    pub fn entries(&self) -> impl Iterator<Item = (NodeId, &TreeEntry)> {
        self.entries.iter().map(|(node_id, entry)| (*node_id, entry))
    }

    pub fn settled_entries(&self) -> impl Iterator<Item = (NodeId, &TreeEntry)> {
        self.entries().filter(|(_, entry)| entry.settled)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tree edges from `node_id` back to the root, as `(parent, edge, child)` triples
    /// starting at the node
    pub fn branch(&self, node_id: NodeId) -> Vec<(NodeId, EdgeId, NodeId)> {
        let mut branch = Vec::new();
        let mut current = node_id;

        while let Some(entry) = self.entries.get(&current)
            && !entry.is_root()
        {
            branch.push((entry.parent, entry.edge_id, current));
            current = entry.parent;
        }

        branch
    }
}

#[cfg(test)]
mod tests {
    use crate::meters;

    use super::*;

    #[test]
    fn ties_break_in_insertion_order() {
        let mut tree = ShortestPathTree::new();
        tree.init_root(0, 0);
        tree.settle_next();

        tree.relax(2, 5, 0, meters!(0), 0, 1, 5);
        tree.relax(1, 5, 0, meters!(0), 0, 0, 5);
        tree.relax(3, 4, 0, meters!(0), 0, 2, 4);

        let order: Vec<NodeId> = std::iter::from_fn(|| tree.settle_next())
            .map(|(node_id, _)| node_id)
            .collect();
        assert_eq!(order, vec![3, 2, 1]);
    }

    #[test]
    fn stale_entries_are_skipped() {
        let mut tree = ShortestPathTree::new();
        tree.init_root(0, 0);
        tree.settle_next();

        assert!(tree.relax(1, 10, 0, meters!(0), 0, 0, 10));
        assert!(tree.relax(1, 3, 0, meters!(0), 0, 1, 3));
        assert!(!tree.relax(1, 7, 0, meters!(0), 0, 2, 7));

        assert_eq!(tree.min_key(), 3);
        let (node_id, entry) = tree.settle_next().unwrap();
        assert_eq!((node_id, entry.weight, entry.edge_id), (1, 3, 1));
        assert_eq!(tree.min_key(), MAX_WEIGHT);
        assert!(tree.settle_next().is_none());
    }

    #[test]
    fn weighted_roots_keep_the_cheaper_label() {
        let mut tree = ShortestPathTree::new();
        tree.init_weighted_root(0, 7, 70, meters!(7));
        tree.init_weighted_root(1, 2, 20, meters!(2));
        tree.init_weighted_root(0, 9, 90, meters!(9));
        tree.relax(2, 5, 50, meters!(5), 1, 4, 5);

        let (node_id, entry) = tree.settle_next().unwrap();
        assert_eq!((node_id, entry.weight, entry.time), (1, 2, 20));
        assert_eq!(tree.entry(0).map(|entry| entry.weight), Some(7));
        assert_eq!(tree.root_of(2), Some(1));
        assert_eq!(tree.root_of(0), Some(0));
        assert_eq!(tree.root_of(3), None);
    }

    #[test]
    fn settled_nodes_reopen_only_on_request() {
        let mut tree = ShortestPathTree::new();
        tree.init_root(0, 0);
        tree.settle_next();
        tree.relax(1, 10, 0, meters!(0), 0, 0, 10);
        tree.settle_next();

        assert!(!tree.relax(1, 4, 0, meters!(0), 0, 1, 4));
        assert!(tree.relax_or_reopen(1, 4, 0, meters!(0), 0, 1, 4));
        assert!(!tree.is_settled(1));

        let (node_id, entry) = tree.settle_next().unwrap();
        assert_eq!((node_id, entry.weight, entry.edge_id), (1, 4, 1));
    }

    #[test]
    fn branch_walks_back_to_root() {
        let mut tree = ShortestPathTree::new();
        tree.init_root(0, 0);
        tree.relax(1, 1, 0, meters!(0), 0, 10, 1);
        tree.relax(2, 2, 0, meters!(0), 1, 11, 2);

        assert_eq!(tree.branch(2), vec![(1, 11, 2), (0, 10, 1)]);
        assert!(tree.branch(0).is_empty());
    }
}
