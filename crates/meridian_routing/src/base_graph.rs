use std::path::Path;

use tracing::info;

use crate::{
    distance::{Distance, Meters},
    error::StorageError,
    geometry::compute_geometry_distance,
    geopoint::GeoPoint,
    graph::{GeometryAccess, Graph, UndirectedEdgeAccess},
    graph_edge::GraphEdge,
    properties::property_map::EdgePropertyMap,
    storage::{read_bytes, write_bytes},
    types::{EdgeId, NodeId},
};

#[derive(Debug, Clone, rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct BaseGraphEdge {
    id: EdgeId,
    start_node: NodeId,
    end_node: NodeId,
    distance: Distance<Meters>,
    properties: EdgePropertyMap,
}

impl BaseGraphEdge {
    pub fn new(
        id: EdgeId,
        start_node: NodeId,
        end_node: NodeId,
        distance: Distance<Meters>,
        properties: EdgePropertyMap,
    ) -> Self {
        BaseGraphEdge {
            id,
            start_node,
            end_node,
            distance,
            properties,
        }
    }
}

impl GraphEdge for BaseGraphEdge {
    fn id(&self) -> EdgeId {
        self.id
    }

    fn start_node(&self) -> NodeId {
        self.start_node
    }

    fn end_node(&self) -> NodeId {
        self.end_node
    }

    fn distance(&self) -> Distance<Meters> {
        self.distance
    }

    fn properties(&self) -> &EdgePropertyMap {
        &self.properties
    }
}

/// Road network: nodes with coordinates and edges with geometry and encoded attributes.
///
/// Append only while it is being imported, read only once it serves queries.
#[derive(Default, rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct BaseGraph {
    nodes: Vec<GeoPoint>,
    edges: Vec<BaseGraphEdge>,
    geometry: Vec<Vec<GeoPoint>>,
    adjacency_list: Vec<Vec<EdgeId>>,
}

impl BaseGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        BaseGraph {
            nodes: Vec::with_capacity(nodes),
            edges: Vec::with_capacity(edges),
            geometry: Vec::with_capacity(edges),
            adjacency_list: Vec::with_capacity(nodes),
        }
    }

    pub fn add_node(&mut self, coordinates: GeoPoint) -> NodeId {
        self.nodes.push(coordinates);
        self.adjacency_list.push(Vec::new());
        self.nodes.len() - 1
    }

    /// Adds an edge drawn as a straight line between its nodes
    pub fn add_edge(&mut self, start: NodeId, end: NodeId, properties: EdgePropertyMap) -> EdgeId {
        let geometry = vec![self.nodes[start], self.nodes[end]];
        self.add_edge_with_geometry(start, end, properties, geometry)
    }

    /// Adds an edge whose length is the haversine length of `geometry`, which goes from `start` to `end`
    pub fn add_edge_with_geometry(
        &mut self,
        start: NodeId,
        end: NodeId,
        properties: EdgePropertyMap,
        geometry: Vec<GeoPoint>,
    ) -> EdgeId {
        let distance = compute_geometry_distance(&geometry);
        self.push_edge(start, end, distance, properties, geometry)
    }

    /// Adds a straight edge with a given length instead of the measured one
    pub fn add_edge_with_distance(
        &mut self,
        start: NodeId,
        end: NodeId,
        distance: Distance<Meters>,
        properties: EdgePropertyMap,
    ) -> EdgeId {
        let geometry = vec![self.nodes[start], self.nodes[end]];
        self.push_edge(start, end, distance, properties, geometry)
    }

    fn push_edge(
        &mut self,
        start: NodeId,
        end: NodeId,
        distance: Distance<Meters>,
        properties: EdgePropertyMap,
        geometry: Vec<GeoPoint>,
    ) -> EdgeId {
        assert!(
            start < self.nodes.len() && end < self.nodes.len(),
            "edge {}-{} references an unknown node",
            start,
            end
        );
        assert!(geometry.len() >= 2, "edge geometry needs at least two points");

        let edge_id = self.edges.len();
        self.edges.push(BaseGraphEdge::new(
            edge_id, start, end, distance, properties,
        ));
        self.geometry.push(geometry);
        self.adjacency_list[start].push(edge_id);
        if start != end {
            self.adjacency_list[end].push(edge_id);
        }
        edge_id
    }

    pub fn node_edges(&self, node_id: NodeId) -> &[EdgeId] {
        &self.adjacency_list[node_id]
    }

    pub fn coordinate_of(&self, node_id: NodeId) -> Option<&GeoPoint> {
        self.nodes.get(node_id)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), StorageError> {
        let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map_err(|err| StorageError::Serialization(format!("graph: {}", err)))?;
        write_bytes(&bytes[..], path)?;
        info!(path = %path.display(), size = bytes.len(), "Saved graph");
        Ok(())
    }

    pub fn from_file(path: &Path) -> Result<Self, StorageError> {
        let bytes = read_bytes(path)?;
        let graph = rkyv::from_bytes::<Self, rkyv::rancor::Error>(&bytes[..])
            .map_err(|err| StorageError::Serialization(format!("graph: {}", err)))?;
        graph.check()?;
        info!(
            path = %path.display(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Loaded graph"
        );
        Ok(graph)
    }

    /// Structural validation, run on every loaded graph
    pub fn check(&self) -> Result<(), StorageError> {
        if self.adjacency_list.len() != self.nodes.len() || self.geometry.len() != self.edges.len() {
            return Err(StorageError::CorruptArtifact(
                "graph tables have inconsistent lengths".to_string(),
            ));
        }

        for (edge_id, edge) in self.edges.iter().enumerate() {
            if edge.id != edge_id
                || edge.start_node >= self.nodes.len()
                || edge.end_node >= self.nodes.len()
            {
                return Err(StorageError::CorruptArtifact(format!(
                    "edge {} is malformed",
                    edge_id
                )));
            }
        }

        for (node_id, edges) in self.adjacency_list.iter().enumerate() {
            for &edge_id in edges {
                let edge = self.edges.get(edge_id).ok_or_else(|| {
                    StorageError::CorruptArtifact(format!("node {} lists unknown edge {}", node_id, edge_id))
                })?;
                if edge.start_node != node_id && edge.end_node != node_id {
                    return Err(StorageError::CorruptArtifact(format!(
                        "node {} lists edge {} it is not part of",
                        node_id, edge_id
                    )));
                }
            }
        }

        Ok(())
    }
}

impl Graph for BaseGraph {
    type Edge = BaseGraphEdge;
    type EdgeIterator<'a> = std::iter::Copied<std::slice::Iter<'a, EdgeId>>;

    fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline(always)]
    fn edge(&self, edge_id: EdgeId) -> &Self::Edge {
        &self.edges[edge_id]
    }
}

impl UndirectedEdgeAccess for BaseGraph {
    fn node_edges_iter(&self, node_id: NodeId) -> Self::EdgeIterator<'_> {
        self.adjacency_list[node_id].iter().copied()
    }
}

impl GeometryAccess for BaseGraph {
    fn edge_geometry(&self, edge_id: EdgeId) -> &[GeoPoint] {
        &self.geometry[edge_id]
    }

    fn node_geometry(&self, node_id: NodeId) -> &GeoPoint {
        &self.nodes[node_id]
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        edge_direction::EdgeDirection, meters, properties::property::TravelMode,
        test_graph_utils::test_graph::temp_file_path,
    };

    use super::*;

    fn small_graph() -> BaseGraph {
        let mut graph = BaseGraph::new();
        let a = graph.add_node(GeoPoint::new(0.0, 0.0));
        let b = graph.add_node(GeoPoint::new(0.0, 0.01));
        let c = graph.add_node(GeoPoint::new(0.01, 0.01));
        let properties = EdgePropertyMap::new().with_access(TravelMode::Car, 50.0, false);
        graph.add_edge(a, b, properties.clone());
        graph.add_edge_with_geometry(
            b,
            c,
            properties.clone(),
            vec![
                GeoPoint::new(0.0, 0.01),
                GeoPoint::new(0.005, 0.012),
                GeoPoint::new(0.01, 0.01),
            ],
        );
        graph.add_edge_with_distance(c, a, meters!(2000), properties);
        graph
    }

    #[test]
    fn adjacency_is_symmetric() {
        let graph = small_graph();
        assert_eq!(graph.node_edges(0), &[0, 2]);
        assert_eq!(graph.node_edges(1), &[0, 1]);
        assert_eq!(graph.node_edges(2), &[1, 2]);
        assert_eq!(graph.edge_direction(2, 2), EdgeDirection::Forward);
        assert_eq!(graph.edge_direction(2, 0), EdgeDirection::Backward);
    }

    #[test]
    fn distance_follows_geometry() {
        let graph = small_graph();
        let straight = graph.edge(0).distance().value();
        assert!((straight - 1111.95).abs() < 0.5, "{}", straight);

        let curved = graph.edge(1).distance();
        assert!(curved > GeoPoint::new(0.0, 0.01).haversine_distance(&GeoPoint::new(0.01, 0.01)));

        assert_eq!(graph.edge(2).distance(), meters!(2000));
    }

    #[test]
    fn save_and_load() {
        let graph = small_graph();
        let path = temp_file_path("base_graph_save_and_load.bin");
        graph.save_to_file(&path).unwrap();

        let loaded = BaseGraph::from_file(&path).unwrap();
        assert_eq!(loaded.node_count(), 3);
        assert_eq!(loaded.edge_count(), 3);
        assert_eq!(loaded.edge_geometry(1).len(), 3);
        assert_eq!(loaded.edge(2).distance(), meters!(2000));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn rejects_garbage_files() {
        let path = temp_file_path("base_graph_garbage.bin");
        std::fs::write(&path, b"not a graph").unwrap();
        assert!(BaseGraph::from_file(&path).is_err());
        std::fs::remove_file(path).unwrap();
    }
}
