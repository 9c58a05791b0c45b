use crate::{
    graph::{DirectedEdgeAccess, Graph, NodeRank},
    types::{EdgeId, NodeId},
};

use super::{ch_edge::CHEdge, ch_storage::CHStorage};

/// Read-only graph view over a prepared hierarchy
#[derive(Clone, Copy)]
pub struct CHGraph<'a> {
    storage: &'a CHStorage,
}

impl<'a> CHGraph<'a> {
    pub fn new(storage: &'a CHStorage) -> Self {
        CHGraph { storage }
    }

    pub fn storage(&self) -> &'a CHStorage {
        self.storage
    }
}

impl Graph for CHGraph<'_> {
    type Edge = CHEdge;
    type EdgeIterator<'b>
        = std::iter::Copied<std::slice::Iter<'b, EdgeId>>
    where
        Self: 'b;

    fn edge_count(&self) -> usize {
        self.storage.edge_count()
    }

    fn node_count(&self) -> usize {
        self.storage.node_count()
    }

    #[inline(always)]
    fn edge(&self, edge_id: EdgeId) -> &Self::Edge {
        self.storage.edge(edge_id)
    }
}

impl DirectedEdgeAccess for CHGraph<'_> {
    fn node_outgoing_edges_iter(&self, node_id: NodeId) -> Self::EdgeIterator<'_> {
        self.storage.outgoing_edges(node_id).iter().copied()
    }

    fn node_incoming_edges_iter(&self, node_id: NodeId) -> Self::EdgeIterator<'_> {
        self.storage.incoming_edges(node_id).iter().copied()
    }
}

impl NodeRank for CHGraph<'_> {
    #[inline(always)]
    fn node_rank(&self, node_id: NodeId) -> usize {
        self.storage.node_rank(node_id)
    }
}
