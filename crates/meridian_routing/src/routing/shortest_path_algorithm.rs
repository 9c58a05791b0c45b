use std::time::Duration;

use crate::{
    distance::{Distance, Meters},
    edge_direction::EdgeDirection,
    error::RoutingError,
    geopoint::GeoPoint,
    types::{EdgeId, NodeId},
    weighting::{Milliseconds, Weight},
};

#[derive(Debug, Clone)]
pub struct CalcPathOptions {
    pub max_visited_nodes: usize,
    pub timeout: Option<Duration>,
    pub include_debug_info: bool,
}

impl Default for CalcPathOptions {
    fn default() -> Self {
        CalcPathOptions {
            max_visited_nodes: usize::MAX,
            timeout: None,
            include_debug_info: false,
        }
    }
}

impl CalcPathOptions {
    pub fn with_max_visited_nodes(mut self, max_visited_nodes: usize) -> Self {
        self.max_visited_nodes = max_visited_nodes;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_debug_info(mut self, include_debug_info: bool) -> Self {
        self.include_debug_info = include_debug_info;
        self
    }
}

/// Node sequence of a found path with its costs.
/// `edges[i]` leads from `nodes[i]` to `nodes[i + 1]`, traversed in the given direction.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPath {
    pub weight: Weight,
    pub time: Milliseconds,
    pub distance: Distance<Meters>,
    pub nodes: Vec<NodeId>,
    pub edges: Vec<(EdgeId, EdgeDirection)>,
}

impl SearchPath {
    pub fn empty(node: NodeId) -> Self {
        SearchPath {
            weight: 0,
            time: 0,
            distance: Distance::default(),
            nodes: vec![node],
            edges: Vec::new(),
        }
    }

    pub fn start_node(&self) -> Option<NodeId> {
        self.nodes.first().copied()
    }

    pub fn end_node(&self) -> Option<NodeId> {
        self.nodes.last().copied()
    }

    /// Continues the path with `tail`, which must start where this path ends
    pub fn append(&mut self, tail: SearchPath) {
        debug_assert_eq!(self.end_node(), tail.start_node());
        self.weight = self.weight.saturating_add(tail.weight);
        self.time = self.time.saturating_add(tail.time);
        self.distance = self.distance + tail.distance;
        self.nodes.extend(tail.nodes.into_iter().skip(1));
        self.edges.extend(tail.edges);
    }
}

#[derive(Debug, Default)]
pub struct CalcPathDebugInfo {
    pub forward_visited_nodes: Vec<GeoPoint>,
    pub backward_visited_nodes: Vec<GeoPoint>,
}

#[derive(Debug)]
pub struct CalcPathResult {
    pub path: SearchPath,
    pub nodes_visited: usize,
    pub duration: Duration,
    pub debug: Option<CalcPathDebugInfo>,
}

pub trait ShortestPathAlgorithm {
    fn calc_path(
        &mut self,
        start: NodeId,
        end: NodeId,
        options: &CalcPathOptions,
    ) -> Result<CalcPathResult, RoutingError>;
}
