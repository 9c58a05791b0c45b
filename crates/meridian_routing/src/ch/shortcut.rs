use crate::{
    distance::{Distance, Meters},
    types::{EdgeId, NodeId},
    weighting::{Milliseconds, Weight},
};

/// Edge of the hierarchy skipping a contracted node
#[derive(Debug, Clone, PartialEq, rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct Shortcut {
    pub start: NodeId,
    pub end: NodeId,
    /// Contracted node the shortcut skips, ranked below both endpoints
    pub via: NodeId,

    pub weight: Weight,
    pub time: Milliseconds,
    pub distance: Distance<Meters>,

    /// Hierarchy edge between `start` and `via`
    pub first: EdgeId,
    /// Hierarchy edge between `via` and `end`
    pub second: EdgeId,

    /// Usable from `end` to `start` with the same weight
    pub bidirectional: bool,
}
