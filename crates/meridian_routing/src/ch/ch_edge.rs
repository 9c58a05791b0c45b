use crate::{
    constants::{INVALID_EDGE, MAX_DURATION, MAX_WEIGHT},
    distance::{Distance, Meters},
    edge_direction::EdgeDirection,
    graph_edge::GraphEdge,
    properties::property_map::EdgePropertyMap,
    types::{EdgeId, NodeId},
    weighting::{Milliseconds, Weight},
};

use super::shortcut::Shortcut;

static NO_PROPERTIES: EdgePropertyMap = EdgePropertyMap::empty();

/// Base graph edge with the weights of one weighting baked in
#[derive(Debug, Clone, PartialEq, rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct CHBaseEdge {
    pub base_edge: EdgeId,
    pub start: NodeId,
    pub end: NodeId,

    pub distance: Distance<Meters>,
    pub forward_time: Milliseconds,
    pub backward_time: Milliseconds,
    pub forward_weight: Weight,
    pub backward_weight: Weight,
}

impl CHBaseEdge {
    pub fn weight(&self, direction: EdgeDirection) -> Weight {
        match direction {
            EdgeDirection::Forward => self.forward_weight,
            EdgeDirection::Backward => self.backward_weight,
        }
    }

    pub fn time(&self, direction: EdgeDirection) -> Milliseconds {
        match direction {
            EdgeDirection::Forward => self.forward_time,
            EdgeDirection::Backward => self.backward_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub enum CHEdge {
    Base(CHBaseEdge),
    Shortcut(Shortcut),
}

impl CHEdge {
    pub fn weight(&self, direction: EdgeDirection) -> Weight {
        match (self, direction) {
            (CHEdge::Base(edge), _) => edge.weight(direction),
            (CHEdge::Shortcut(shortcut), EdgeDirection::Forward) => shortcut.weight,
            (CHEdge::Shortcut(shortcut), EdgeDirection::Backward) if shortcut.bidirectional => {
                shortcut.weight
            }
            (CHEdge::Shortcut(_), EdgeDirection::Backward) => MAX_WEIGHT,
        }
    }

    pub fn time(&self, direction: EdgeDirection) -> Milliseconds {
        match (self, direction) {
            (CHEdge::Base(edge), _) => edge.time(direction),
            (CHEdge::Shortcut(shortcut), EdgeDirection::Forward) => shortcut.time,
            (CHEdge::Shortcut(shortcut), EdgeDirection::Backward) if shortcut.bidirectional => {
                shortcut.time
            }
            (CHEdge::Shortcut(_), EdgeDirection::Backward) => MAX_DURATION,
        }
    }

    pub fn is_shortcut(&self) -> bool {
        matches!(self, CHEdge::Shortcut(_))
    }
}

impl GraphEdge for CHEdge {
    /// Base graph id, `INVALID_EDGE` for shortcuts
    fn id(&self) -> EdgeId {
        match self {
            CHEdge::Base(edge) => edge.base_edge,
            CHEdge::Shortcut(_) => INVALID_EDGE,
        }
    }

    fn start_node(&self) -> NodeId {
        match self {
            CHEdge::Base(edge) => edge.start,
            CHEdge::Shortcut(shortcut) => shortcut.start,
        }
    }

    fn end_node(&self) -> NodeId {
        match self {
            CHEdge::Base(edge) => edge.end,
            CHEdge::Shortcut(shortcut) => shortcut.end,
        }
    }

    fn distance(&self) -> Distance<Meters> {
        match self {
            CHEdge::Base(edge) => edge.distance,
            CHEdge::Shortcut(shortcut) => shortcut.distance,
        }
    }

    /// Weights are already baked in, hierarchy edges carry no attributes
    fn properties(&self) -> &EdgePropertyMap {
        &NO_PROPERTIES
    }
}
