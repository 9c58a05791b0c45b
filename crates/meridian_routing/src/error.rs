use std::time::Duration;

use thiserror::Error;

use crate::types::NodeId;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RoutingError {
    #[error("No path found")]
    NoPathFound,
    #[error("Search aborted after visiting {max_visited_nodes} nodes, the route is too complex or too far")]
    NodeLimitExceeded { max_visited_nodes: usize },
    #[error("Search aborted after {timeout:?}")]
    TimeoutExceeded { timeout: Duration },
    #[error("Node {0} does not exist in the graph")]
    InvalidNode(NodeId),
    #[error("Unknown profile {0}")]
    UnknownProfile(String),
    #[error("Unknown weighting {0}")]
    UnknownWeighting(String),
    #[error("Profile {profile} cannot serve this request: {reason}")]
    ProfileMismatch { profile: String, reason: String },
    #[error("Could not find a point on the network for location {index}")]
    PointNotFound { index: usize },
    #[error("Too many locations: {actual}, maximum is {max}")]
    TooManyLocations { max: usize, actual: usize },
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

#[derive(Error, Debug)]
pub enum PreparationError {
    #[error("Contraction aborted: {shortcuts} shortcuts exceed the limit of {max_shortcuts}")]
    ShortcutLimitExceeded {
        shortcuts: usize,
        max_shortcuts: usize,
    },
    #[error("Invalid weighting for preparation: {0}")]
    InvalidWeighting(String),
    #[error("Contraction produced an inconsistent hierarchy: {0}")]
    Validation(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize or deserialize {0}")]
    Serialization(String),
    #[error("Corrupt artifact: {0}")]
    CorruptArtifact(String),
    #[error("Artifact was built for another graph: {0}")]
    GraphMismatch(String),
}
