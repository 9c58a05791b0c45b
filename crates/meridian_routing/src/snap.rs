use crate::{
    base_graph::BaseGraph,
    distance::{Distance, Meters},
    geometry::distance_along,
    geopoint::GeoPoint,
    graph::{GeometryAccess, Graph},
    graph_edge::GraphEdge,
    types::{EdgeId, NodeId},
};

/// A location projected onto the closest point of an edge
#[derive(Debug, Clone)]
pub struct Snap {
    pub edge_id: EdgeId,
    /// Segment of the edge geometry the point lies on
    pub segment_index: usize,
    pub coordinates: GeoPoint,
    distance: Distance<Meters>,
    closest_node: Option<NodeId>,
}

impl Snap {
    pub fn new(
        edge_id: EdgeId,
        segment_index: usize,
        coordinates: GeoPoint,
        distance: Distance<Meters>,
    ) -> Self {
        Snap {
            edge_id,
            segment_index,
            coordinates,
            distance,
            closest_node: None,
        }
    }

    /// Distance between the queried location and the snapped point
    pub fn distance(&self) -> Distance<Meters> {
        self.distance
    }

    /// Node of the query graph standing for this snap, set once the query graph is built
    pub fn closest_node(&self) -> Option<NodeId> {
        self.closest_node
    }

    pub(crate) fn set_closest_node(&mut self, node_id: NodeId) {
        self.closest_node = Some(node_id)
    }

    /// Offset of the snapped point from the start of its edge
    pub fn offset(&self, graph: &BaseGraph) -> Distance<Meters> {
        distance_along(
            graph.edge_geometry(self.edge_id),
            self.segment_index,
            &self.coordinates,
        )
    }

    /// Endpoint of the snapped edge closest to the snapped point, measured along the edge
    pub fn nearest_base_node(&self, graph: &BaseGraph) -> NodeId {
        let edge = graph.edge(self.edge_id);
        let geometry = graph.edge_geometry(self.edge_id);
        let total: Distance<Meters> = crate::geometry::compute_geometry_distance(geometry);
        let offset = self.offset(graph);

        if offset.value() * 2.0 <= total.value() {
            edge.start_node()
        } else {
            edge.end_node()
        }
    }
}
