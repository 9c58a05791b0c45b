use std::path::Path;

use tracing::{debug, info};

use crate::{
    base_graph::BaseGraph,
    constants::MAX_WEIGHT,
    edge_direction::EdgeDirection,
    error::StorageError,
    graph::Graph,
    graph_edge::GraphEdge,
    storage::{read_bytes, write_bytes},
    types::NodeId,
    weighting::{Weight, Weighting},
};

/// Identifies what a set of landmarks was prepared for
#[derive(Debug, Clone, PartialEq, Eq, rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct LMMetadata {
    pub profile: String,
    pub weighting: String,
    pub base_node_count: usize,
    pub base_edge_count: usize,
}

impl LMMetadata {
    pub fn new(profile: &str, weighting: &str, base_graph: &BaseGraph) -> Self {
        LMMetadata {
            profile: profile.to_string(),
            weighting: weighting.to_string(),
            base_node_count: base_graph.node_count(),
            base_edge_count: base_graph.edge_count(),
        }
    }
}

/// Weights between one landmark and every node, `MAX_WEIGHT` where there is no path
#[derive(Debug, Clone, PartialEq, rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct Landmark {
    pub node_id: NodeId,
    pub weight_from_landmark: Vec<Weight>,
    pub weight_to_landmark: Vec<Weight>,
}

impl Landmark {
    pub fn new(node_id: NodeId, weight_from_landmark: Vec<Weight>, weight_to_landmark: Vec<Weight>) -> Self {
        Landmark {
            node_id,
            weight_from_landmark,
            weight_to_landmark,
        }
    }
}

/// Landmarks of one profile with their weight tables
#[derive(Debug, rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct LandmarkStorage {
    metadata: LMMetadata,
    landmarks: Vec<Landmark>,
}

impl LandmarkStorage {
    pub fn new(metadata: LMMetadata, landmarks: Vec<Landmark>) -> Self {
        LandmarkStorage {
            metadata,
            landmarks,
        }
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), StorageError> {
        let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map_err(|err| StorageError::Serialization(format!("landmarks: {}", err)))?;
        write_bytes(&bytes[..], path)?;
        info!(
            path = %path.display(),
            profile = self.metadata.profile,
            landmarks = self.landmarks.len(),
            size = bytes.len(),
            "Saved landmarks"
        );
        Ok(())
    }

    pub fn from_file(path: &Path) -> Result<Self, StorageError> {
        debug!("Reading landmarks from {}", path.display());
        let bytes = read_bytes(path)?;
        let storage = rkyv::from_bytes::<Self, rkyv::rancor::Error>(&bytes[..])
            .map_err(|err| StorageError::Serialization(format!("landmarks: {}", err)))?;
        storage.check()?;
        info!(
            path = %path.display(),
            profile = storage.metadata.profile,
            landmarks = storage.landmarks.len(),
            "Loaded landmarks"
        );
        Ok(storage)
    }

    fn check(&self) -> Result<(), StorageError> {
        let nodes = self.metadata.base_node_count;
        for landmark in &self.landmarks {
            if landmark.node_id >= nodes
                || landmark.weight_from_landmark.len() != nodes
                || landmark.weight_to_landmark.len() != nodes
            {
                return Err(StorageError::CorruptArtifact(format!(
                    "landmark {} of profile {} does not cover {} nodes",
                    landmark.node_id, self.metadata.profile, nodes
                )));
            }
        }
        Ok(())
    }

    pub fn metadata(&self) -> &LMMetadata {
        &self.metadata
    }

    pub fn landmark_count(&self) -> usize {
        self.landmarks.len()
    }

    pub fn landmark_nodes(&self) -> Vec<NodeId> {
        self.landmarks.iter().map(|landmark| landmark.node_id).collect()
    }

    pub fn weight_from_landmark(&self, landmark: usize, node_id: NodeId) -> Weight {
        self.landmarks[landmark].weight_from_landmark[node_id]
    }

    pub fn weight_to_landmark(&self, landmark: usize, node_id: NodeId) -> Weight {
        self.landmarks[landmark].weight_to_landmark[node_id]
    }

    /// Fails when the landmarks were not prepared on `base_graph`
    pub fn ensure_built_for(&self, base_graph: &BaseGraph) -> Result<(), StorageError> {
        if self.metadata.base_node_count != base_graph.node_count()
            || self.metadata.base_edge_count != base_graph.edge_count()
        {
            return Err(StorageError::GraphMismatch(format!(
                "landmarks of profile {} cover {} nodes and {} edges, graph has {} nodes and {} edges",
                self.metadata.profile,
                self.metadata.base_node_count,
                self.metadata.base_edge_count,
                base_graph.node_count(),
                base_graph.edge_count()
            )));
        }
        Ok(())
    }

    /// Fails unless every table holds the shortest path weights `weighting` gives on
    /// `base_graph`.
    ///
    /// A table is exact when no edge offers a cheaper label to its head and every
    /// reached node other than the landmark gets its label from some edge.
    pub fn ensure_weights_of<W>(&self, base_graph: &BaseGraph, weighting: &W) -> Result<(), StorageError>
    where
        W: Weighting + ?Sized,
    {
        self.ensure_built_for(base_graph)?;

        let mut arcs: Vec<(NodeId, NodeId, Weight)> = Vec::with_capacity(base_graph.edge_count() * 2);
        for edge_id in 0..base_graph.edge_count() {
            let edge = base_graph.edge(edge_id);
            if edge.start_node() == edge.end_node() {
                continue;
            }
            for (direction, from, to) in [
                (EdgeDirection::Forward, edge.start_node(), edge.end_node()),
                (EdgeDirection::Backward, edge.end_node(), edge.start_node()),
            ] {
                let weight = weighting.calc_edge_weight(edge, direction);
                if weight != MAX_WEIGHT {
                    arcs.push((from, to, weight));
                }
            }
        }

        for landmark in &self.landmarks {
            let forward = arcs.iter().copied();
            let backward = arcs.iter().map(|&(from, to, weight)| (to, from, weight));

            if !is_exact_table(&landmark.weight_from_landmark, landmark.node_id, forward)
                || !is_exact_table(&landmark.weight_to_landmark, landmark.node_id, backward)
            {
                return Err(StorageError::GraphMismatch(format!(
                    "weights of landmark {} of profile {} differ from the current weighting",
                    landmark.node_id, self.metadata.profile
                )));
            }
        }

        Ok(())
    }
}

fn is_exact_table(
    table: &[Weight],
    root: NodeId,
    arcs: impl Iterator<Item = (NodeId, NodeId, Weight)>,
) -> bool {
    if table[root] != 0 {
        return false;
    }

    let mut supported = vec![false; table.len()];
    supported[root] = true;

    for (from, to, weight) in arcs {
        if table[from] == MAX_WEIGHT {
            continue;
        }
        let candidate = table[from] as u64 + weight as u64;
        if candidate >= MAX_WEIGHT as u64 {
            continue;
        }
        match candidate.cmp(&(table[to] as u64)) {
            std::cmp::Ordering::Less => return false,
            std::cmp::Ordering::Equal => supported[to] = true,
            std::cmp::Ordering::Greater => {}
        }
    }

    table
        .iter()
        .zip(supported)
        .all(|(&weight, supported)| weight == MAX_WEIGHT || supported)
}
