use std::path::Path;

use tracing::{debug, info};

use crate::{
    base_graph::BaseGraph,
    constants::{MAX_DURATION, MAX_WEIGHT},
    distance::{Distance, Meters},
    edge_direction::EdgeDirection,
    error::StorageError,
    graph::Graph,
    graph_edge::GraphEdge,
    storage::{read_bytes, write_bytes},
    types::{EdgeId, NodeId},
    weighting::{Milliseconds, Weight, Weighting},
};

use super::{
    ch_edge::{CHBaseEdge, CHEdge},
    shortcut::Shortcut,
};

/// Identifies what a hierarchy was prepared for
#[derive(Debug, Clone, PartialEq, Eq, rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct CHMetadata {
    pub profile: String,
    pub weighting: String,
    pub base_node_count: usize,
    pub base_edge_count: usize,
}

impl CHMetadata {
    pub fn new(profile: &str, weighting: &str, base_graph: &BaseGraph) -> Self {
        CHMetadata {
            profile: profile.to_string(),
            weighting: weighting.to_string(),
            base_node_count: base_graph.node_count(),
            base_edge_count: base_graph.edge_count(),
        }
    }
}

/// Contracted hierarchy of one profile.
///
/// Edge `i < base_edge_count` is base graph edge `i` with the profile weights baked in,
/// shortcuts follow. Adjacency lists hold every edge usable out of / into a node,
/// searches keep the upward ones.
#[derive(Debug, rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct CHStorage {
    metadata: CHMetadata,
    edges: Vec<CHEdge>,
    ranks: Vec<usize>,

    /// For each node, the edges that can be traversed out of it
    outgoing_edges: Vec<Vec<EdgeId>>,

    /// For each node, the edges that can be traversed into it
    incoming_edges: Vec<Vec<EdgeId>>,
}

impl CHStorage {
    pub fn new(metadata: CHMetadata) -> Self {
        let nodes = metadata.base_node_count;
        CHStorage {
            edges: Vec::with_capacity(metadata.base_edge_count),
            ranks: vec![usize::MAX; nodes],
            outgoing_edges: vec![Vec::new(); nodes],
            incoming_edges: vec![Vec::new(); nodes],
            metadata,
        }
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), StorageError> {
        let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map_err(|err| StorageError::Serialization(format!("hierarchy: {}", err)))?;
        write_bytes(&bytes[..], path)?;
        info!(
            path = %path.display(),
            profile = self.metadata.profile,
            size = bytes.len(),
            "Saved hierarchy"
        );
        Ok(())
    }

    /// Reads and fully checks a stored hierarchy
    pub fn from_file(path: &Path) -> Result<Self, StorageError> {
        debug!("Reading hierarchy from {}", path.display());
        let bytes = read_bytes(path)?;
        let storage = rkyv::from_bytes::<Self, rkyv::rancor::Error>(&bytes[..])
            .map_err(|err| StorageError::Serialization(format!("hierarchy: {}", err)))?;
        storage.check()?;
        info!(
            path = %path.display(),
            profile = storage.metadata.profile,
            shortcuts = storage.shortcut_count(),
            "Loaded hierarchy"
        );
        Ok(storage)
    }

    pub fn metadata(&self) -> &CHMetadata {
        &self.metadata
    }

    /// Fails when the hierarchy was not prepared on `base_graph`
    pub fn ensure_built_for(&self, base_graph: &BaseGraph) -> Result<(), StorageError> {
        if self.metadata.base_node_count != base_graph.node_count()
            || self.metadata.base_edge_count != base_graph.edge_count()
        {
            return Err(StorageError::GraphMismatch(format!(
                "hierarchy of profile {} has {} nodes and {} edges, graph has {} nodes and {} edges",
                self.metadata.profile,
                self.metadata.base_node_count,
                self.metadata.base_edge_count,
                base_graph.node_count(),
                base_graph.edge_count()
            )));
        }
        Ok(())
    }

    /// Fails when the base edge costs baked into the hierarchy are not the ones
    /// `weighting` gives on `base_graph`, as after a change of profile parameters or
    /// of edge attributes
    pub fn ensure_weights_of<W>(&self, base_graph: &BaseGraph, weighting: &W) -> Result<(), StorageError>
    where
        W: Weighting + ?Sized,
    {
        self.ensure_built_for(base_graph)?;

        for edge_id in 0..base_graph.edge_count() {
            let edge = base_graph.edge(edge_id);
            let stored = match self.edges.get(edge_id) {
                Some(CHEdge::Base(stored)) => stored,
                _ => {
                    return Err(StorageError::CorruptArtifact(format!(
                        "edge {} of profile {} is not a base edge",
                        edge_id, self.metadata.profile
                    )));
                }
            };

            if stored.start != edge.start_node() || stored.end != edge.end_node() {
                return Err(StorageError::GraphMismatch(format!(
                    "edge {} of profile {} connects other nodes",
                    edge_id, self.metadata.profile
                )));
            }

            for direction in [EdgeDirection::Forward, EdgeDirection::Backward] {
                let expected = (
                    weighting.calc_edge_weight(edge, direction),
                    weighting.calc_edge_ms(edge, direction),
                );
                let actual = (stored.weight(direction), stored.time(direction));
                if actual != expected {
                    return Err(StorageError::GraphMismatch(format!(
                        "edge {} of profile {} costs {:?} {:?} in the hierarchy, {:?} with the current weighting",
                        edge_id, self.metadata.profile, actual, direction, expected
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn node_count(&self) -> usize {
        self.ranks.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn shortcut_count(&self) -> usize {
        self.edges.len().saturating_sub(self.metadata.base_edge_count)
    }

    pub fn node_rank(&self, node_id: NodeId) -> usize {
        self.ranks[node_id]
    }

    pub(crate) fn set_node_rank(&mut self, node_id: NodeId, rank: usize) {
        self.ranks[node_id] = rank;
    }

    pub fn edge(&self, edge_id: EdgeId) -> &CHEdge {
        &self.edges[edge_id]
    }

    pub fn outgoing_edges(&self, node_id: NodeId) -> &[EdgeId] {
        &self.outgoing_edges[node_id]
    }

    pub fn incoming_edges(&self, node_id: NodeId) -> &[EdgeId] {
        &self.incoming_edges[node_id]
    }

    pub fn shortcuts(&self) -> impl Iterator<Item = (EdgeId, &Shortcut)> {
        self.edges
            .iter()
            .enumerate()
            .filter_map(|(edge_id, edge)| match edge {
                CHEdge::Shortcut(shortcut) => Some((edge_id, shortcut)),
                CHEdge::Base(_) => None,
            })
    }

    /// Base edges must be added in id order, before any shortcut
    pub(crate) fn add_base_edge(&mut self, edge: CHBaseEdge) -> EdgeId {
        let edge_id = self.edges.len();
        debug_assert_eq!(edge_id, edge.base_edge);

        if edge.start != edge.end {
            if edge.forward_weight != MAX_WEIGHT {
                self.outgoing_edges[edge.start].push(edge_id);
                self.incoming_edges[edge.end].push(edge_id);
            }

            if edge.backward_weight != MAX_WEIGHT {
                self.incoming_edges[edge.start].push(edge_id);
                self.outgoing_edges[edge.end].push(edge_id);
            }
        }

        self.edges.push(CHEdge::Base(edge));
        edge_id
    }

    pub(crate) fn add_shortcut(&mut self, shortcut: Shortcut) -> EdgeId {
        let edge_id = self.edges.len();
        self.outgoing_edges[shortcut.start].push(edge_id);
        self.incoming_edges[shortcut.end].push(edge_id);

        if shortcut.bidirectional {
            self.outgoing_edges[shortcut.end].push(edge_id);
            self.incoming_edges[shortcut.start].push(edge_id);
        }

        self.edges.push(CHEdge::Shortcut(shortcut));
        edge_id
    }

    /// Expands `edge_id`, traversed starting at `from`, into base edges in travel order
    pub fn unpack_edge(
        &self,
        edge_id: EdgeId,
        from: NodeId,
        base_edges: &mut Vec<(EdgeId, EdgeDirection)>,
    ) {
        let mut stack: Vec<(EdgeId, NodeId)> = vec![(edge_id, from)];

        while let Some((edge_id, from)) = stack.pop() {
            match &self.edges[edge_id] {
                CHEdge::Base(edge) => {
                    let direction = if edge.start == from {
                        EdgeDirection::Forward
                    } else {
                        EdgeDirection::Backward
                    };
                    base_edges.push((edge.base_edge, direction));
                }
                CHEdge::Shortcut(shortcut) => {
                    // Pushed in reverse, the stack pops the part leaving `from` first
                    if from == shortcut.start {
                        stack.push((shortcut.second, shortcut.via));
                        stack.push((shortcut.first, shortcut.start));
                    } else {
                        stack.push((shortcut.first, shortcut.via));
                        stack.push((shortcut.second, shortcut.end));
                    }
                }
            }
        }
    }

    fn check_unpacked(
        &self,
        shortcut_id: EdgeId,
        shortcut: &Shortcut,
        direction: EdgeDirection,
    ) -> Result<(), StorageError> {
        let corrupt = |reason: String| {
            StorageError::CorruptArtifact(format!("shortcut {}: {}", shortcut_id, reason))
        };

        let (from, to) = match direction {
            EdgeDirection::Forward => (shortcut.start, shortcut.end),
            EdgeDirection::Backward => (shortcut.end, shortcut.start),
        };

        let mut base_edges = Vec::new();
        self.unpack_edge(shortcut_id, from, &mut base_edges);

        let mut node = from;
        let mut weight: Weight = 0;
        let mut time: Milliseconds = 0;
        let mut distance = Distance::<Meters>::default();

        for (base_edge, edge_direction) in base_edges {
            let CHEdge::Base(edge) = &self.edges[base_edge] else {
                return Err(corrupt(format!("unpacks into shortcut {}", base_edge)));
            };

            let (start, end, edge_weight, edge_time) = match edge_direction {
                EdgeDirection::Forward => (edge.start, edge.end, edge.forward_weight, edge.forward_time),
                EdgeDirection::Backward => (edge.end, edge.start, edge.backward_weight, edge.backward_time),
            };

            if start != node {
                return Err(corrupt(format!("base edge {} does not continue at node {}", base_edge, node)));
            }
            if edge_weight == MAX_WEIGHT || edge_time == MAX_DURATION {
                return Err(corrupt(format!("base edge {} is not traversable", base_edge)));
            }

            node = end;
            weight = weight.saturating_add(edge_weight);
            time = time.saturating_add(edge_time);
            distance = distance + edge.distance;
        }

        if node != to {
            return Err(corrupt(format!("ends at node {} instead of {}", node, to)));
        }
        if weight != shortcut.weight || time != shortcut.time {
            return Err(corrupt(format!(
                "unpacked weight {} and time {} differ from {} and {}",
                weight, time, shortcut.weight, shortcut.time
            )));
        }
        if (distance.value() - shortcut.distance.value()).abs() > 1e-3 {
            return Err(corrupt(format!(
                "unpacked distance {} differs from {}",
                distance, shortcut.distance
            )));
        }

        Ok(())
    }

    /// Validates the whole hierarchy, unpacking every shortcut
    pub fn check(&self) -> Result<(), StorageError> {
        let nodes = self.node_count();

        if self.outgoing_edges.len() != nodes
            || self.incoming_edges.len() != nodes
            || nodes != self.metadata.base_node_count
            || self.edges.len() < self.metadata.base_edge_count
        {
            return Err(StorageError::CorruptArtifact(
                "hierarchy tables have inconsistent lengths".to_string(),
            ));
        }

        let mut seen_ranks = vec![false; nodes];
        for (node_id, &rank) in self.ranks.iter().enumerate() {
            if rank >= nodes || std::mem::replace(&mut seen_ranks[rank], true) {
                return Err(StorageError::CorruptArtifact(format!(
                    "node {} has invalid rank {}",
                    node_id, rank
                )));
            }
        }

        for (edge_id, edge) in self.edges.iter().enumerate() {
            match edge {
                CHEdge::Base(edge) => {
                    if edge_id >= self.metadata.base_edge_count
                        || edge.base_edge != edge_id
                        || edge.start >= nodes
                        || edge.end >= nodes
                    {
                        return Err(StorageError::CorruptArtifact(format!(
                            "base edge {} is malformed",
                            edge_id
                        )));
                    }
                }
                CHEdge::Shortcut(shortcut) => {
                    if edge_id < self.metadata.base_edge_count
                        || shortcut.first >= edge_id
                        || shortcut.second >= edge_id
                        || [shortcut.start, shortcut.end, shortcut.via]
                            .iter()
                            .any(|&node| node >= nodes)
                        || self.ranks[shortcut.via] >= self.ranks[shortcut.start]
                        || self.ranks[shortcut.via] >= self.ranks[shortcut.end]
                    {
                        return Err(StorageError::CorruptArtifact(format!(
                            "shortcut {} is malformed",
                            edge_id
                        )));
                    }

                    self.check_unpacked(edge_id, shortcut, EdgeDirection::Forward)?;
                    if shortcut.bidirectional {
                        self.check_unpacked(edge_id, shortcut, EdgeDirection::Backward)?;
                    }
                }
            }
        }

        for (node_id, edges) in self.outgoing_edges.iter().chain(self.incoming_edges.iter()).enumerate() {
            let node_id = node_id % nodes.max(1);
            if edges.iter().any(|&edge_id| {
                self.edges.get(edge_id).is_none_or(|edge| {
                    let (start, end) = match edge {
                        CHEdge::Base(edge) => (edge.start, edge.end),
                        CHEdge::Shortcut(shortcut) => (shortcut.start, shortcut.end),
                    };
                    start != node_id && end != node_id
                })
            }) {
                return Err(StorageError::CorruptArtifact(format!(
                    "node {} lists an edge it is not part of",
                    node_id
                )));
            }
        }

        debug!(shortcuts = self.shortcut_count(), "Checked hierarchy");
        Ok(())
    }
}
