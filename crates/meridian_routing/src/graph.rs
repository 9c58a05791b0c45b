use crate::{
    edge_direction::EdgeDirection,
    geopoint::GeoPoint,
    graph_edge::GraphEdge,
    types::{EdgeId, NodeId},
};

pub trait Graph {
    type Edge: GraphEdge;
    type EdgeIterator<'a>: Iterator<Item = EdgeId>
    where
        Self: 'a;

    fn edge_count(&self) -> usize;
    fn node_count(&self) -> usize;

    fn edge(&self, edge_id: EdgeId) -> &Self::Edge;

    /// Direction of `edge_id` when it is traversed starting at `start`
    fn edge_direction(&self, edge_id: EdgeId, start: NodeId) -> EdgeDirection {
        if self.edge(edge_id).start_node() == start {
            EdgeDirection::Forward
        } else {
            EdgeDirection::Backward
        }
    }
}

/// Edges stored once and traversable from both endpoints
pub trait UndirectedEdgeAccess: Graph {
    fn node_edges_iter(&self, node_id: NodeId) -> Self::EdgeIterator<'_>;
}

pub trait DirectedEdgeAccess: Graph {
    fn node_outgoing_edges_iter(&self, node_id: NodeId) -> Self::EdgeIterator<'_>;
    fn node_incoming_edges_iter(&self, node_id: NodeId) -> Self::EdgeIterator<'_>;
}

pub trait GeometryAccess: Graph {
    /// Polyline of the edge, from its start node to its end node
    fn edge_geometry(&self, edge_id: EdgeId) -> &[GeoPoint];
    fn node_geometry(&self, node_id: NodeId) -> &GeoPoint;
}

pub trait NodeRank {
    fn node_rank(&self, node_id: NodeId) -> usize;
}
