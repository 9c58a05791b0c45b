use std::collections::BTreeMap;

use fxhash::FxHashMap;

use crate::{
    base_graph::{BaseGraph, BaseGraphEdge},
    distance::{Distance, Meters},
    geometry::{compute_geometry_distance, distance_along, slice_geometry},
    geopoint::GeoPoint,
    graph::{GeometryAccess, Graph, UndirectedEdgeAccess},
    graph_edge::GraphEdge,
    snap::Snap,
    types::{EdgeId, NodeId},
};

use super::query_graph_edge_iterator::QueryGraphEdgeIterator;

/// Snapped points closer than this to each other, or to an edge end, share a node
const SNAP_TOLERANCE_METERS: f64 = 0.01;

/// Base graph overlaid with the virtual nodes and edges of one query.
///
/// Each snap that falls inside an edge becomes a virtual node splitting the edge into
/// virtual edges. Virtual edges keep the id and attributes of the edge they come from,
/// so edge keyed weightings apply to them as well. The base graph is left untouched.
pub struct QueryGraph<'a> {
    base_graph: &'a BaseGraph,

    virtual_nodes: Vec<GeoPoint>,
    virtual_edges: Vec<BaseGraphEdge>,
    virtual_edge_geometry: Vec<Vec<GeoPoint>>,

    // Edges of the virtual nodes
    virtual_adjacency_list: Vec<Vec<EdgeId>>,

    // Virtual edges attached to nodes of the base graph
    virtual_adjacency_list_existing_nodes: FxHashMap<NodeId, Vec<EdgeId>>,
}

struct SplitPoint {
    offset: f64,
    segment_index: usize,
    point: GeoPoint,
    snaps: Vec<usize>,
}

impl<'a> QueryGraph<'a> {
    /// Builds the overlay and stores in every snap the node standing for it
    pub fn from_base_graph(base_graph: &'a BaseGraph, snaps: &mut [Snap]) -> Self {
        let mut query_graph = QueryGraph {
            base_graph,
            virtual_nodes: Vec::new(),
            virtual_edges: Vec::new(),
            virtual_edge_geometry: Vec::new(),
            virtual_adjacency_list: Vec::new(),
            virtual_adjacency_list_existing_nodes: FxHashMap::default(),
        };

        let mut snaps_by_edge: BTreeMap<EdgeId, Vec<usize>> = BTreeMap::new();
        for (index, snap) in snaps.iter().enumerate() {
            snaps_by_edge.entry(snap.edge_id).or_default().push(index);
        }

        for (edge_id, snap_indices) in snaps_by_edge {
            query_graph.split_edge(edge_id, &snap_indices, snaps);
        }

        query_graph
    }

    fn split_edge(&mut self, edge_id: EdgeId, snap_indices: &[usize], snaps: &mut [Snap]) {
        let base_graph = self.base_graph;
        let edge = base_graph.edge(edge_id);
        let geometry = base_graph.edge_geometry(edge_id);
        let geometry_length = compute_geometry_distance(geometry).value();

        let mut split_points: Vec<SplitPoint> = Vec::new();
        let mut ordered: Vec<(f64, usize)> = snap_indices
            .iter()
            .map(|&index| {
                let snap = &snaps[index];
                let offset = distance_along(geometry, snap.segment_index, &snap.coordinates);
                (offset.value(), index)
            })
            .collect();
        ordered.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        for (offset, index) in ordered {
            if offset <= SNAP_TOLERANCE_METERS {
                snaps[index].set_closest_node(edge.start_node());
                continue;
            }
            if offset >= geometry_length - SNAP_TOLERANCE_METERS {
                snaps[index].set_closest_node(edge.end_node());
                continue;
            }

            match split_points.last_mut() {
                Some(last) if offset - last.offset <= SNAP_TOLERANCE_METERS => last.snaps.push(index),
                _ => split_points.push(SplitPoint {
                    offset,
                    segment_index: snaps[index].segment_index,
                    point: snaps[index].coordinates,
                    snaps: vec![index],
                }),
            }
        }

        if split_points.is_empty() {
            return;
        }

        let piece_distance = |from: f64, to: f64| -> Distance<Meters> {
            if geometry_length > 0.0 {
                Distance::from(edge.distance().value() * (to - from) / geometry_length)
            } else {
                Distance::default()
            }
        };

        let last_segment = geometry.len() - 2;
        let mut previous_node = edge.start_node();
        let mut previous_position = (0, geometry[0], 0.0);

        for split_point in &split_points {
            let virtual_node = self.add_virtual_node(split_point.point);
            for &index in &split_point.snaps {
                snaps[index].set_closest_node(virtual_node);
            }

            self.add_virtual_edge(
                edge,
                previous_node,
                virtual_node,
                piece_distance(previous_position.2, split_point.offset),
                slice_geometry(
                    geometry,
                    (previous_position.0, &previous_position.1),
                    (split_point.segment_index, &split_point.point),
                ),
            );

            previous_node = virtual_node;
            previous_position = (split_point.segment_index, split_point.point, split_point.offset);
        }

        let end_point = geometry[geometry.len() - 1];
        self.add_virtual_edge(
            edge,
            previous_node,
            edge.end_node(),
            piece_distance(previous_position.2, geometry_length),
            slice_geometry(
                geometry,
                (previous_position.0, &previous_position.1),
                (last_segment, &end_point),
            ),
        );
    }

    fn add_virtual_node(&mut self, coordinates: GeoPoint) -> NodeId {
        let node_id = self.node_count();
        self.virtual_nodes.push(coordinates);
        self.virtual_adjacency_list.push(Vec::new());
        node_id
    }

    fn add_virtual_edge(
        &mut self,
        original: &BaseGraphEdge,
        start: NodeId,
        end: NodeId,
        distance: Distance<Meters>,
        geometry: Vec<GeoPoint>,
    ) {
        let edge_id = self.edge_count();
        self.virtual_edges.push(BaseGraphEdge::new(
            original.id(),
            start,
            end,
            distance,
            original.properties().clone(),
        ));
        self.virtual_edge_geometry.push(geometry);
        self.connect_edge(edge_id, start);
        self.connect_edge(edge_id, end);
    }

    fn connect_edge(&mut self, edge_id: EdgeId, node_id: NodeId) {
        if self.is_virtual_node(node_id) {
            let index = node_id - self.base_graph.node_count();
            self.virtual_adjacency_list[index].push(edge_id);
        } else {
            self.virtual_adjacency_list_existing_nodes
                .entry(node_id)
                .or_default()
                .push(edge_id);
        }
    }

    pub fn base_graph(&self) -> &'a BaseGraph {
        self.base_graph
    }

    pub fn is_virtual_node(&self, node_id: NodeId) -> bool {
        node_id >= self.base_graph.node_count()
    }

    pub fn is_virtual_edge(&self, edge_id: EdgeId) -> bool {
        edge_id >= self.base_graph.edge_count()
    }

    pub fn virtual_node_count(&self) -> usize {
        self.virtual_nodes.len()
    }

    pub fn virtual_edge_count(&self) -> usize {
        self.virtual_edges.len()
    }
}

impl Graph for QueryGraph<'_> {
    type Edge = BaseGraphEdge;
    type EdgeIterator<'b>
        = QueryGraphEdgeIterator<'b>
    where
        Self: 'b;

    fn edge_count(&self) -> usize {
        self.base_graph.edge_count() + self.virtual_edges.len()
    }

    fn node_count(&self) -> usize {
        self.base_graph.node_count() + self.virtual_nodes.len()
    }

    fn edge(&self, edge_id: EdgeId) -> &Self::Edge {
        if self.is_virtual_edge(edge_id) {
            &self.virtual_edges[edge_id - self.base_graph.edge_count()]
        } else {
            self.base_graph.edge(edge_id)
        }
    }
}

impl UndirectedEdgeAccess for QueryGraph<'_> {
    fn node_edges_iter(&self, node_id: NodeId) -> Self::EdgeIterator<'_> {
        if self.is_virtual_node(node_id) {
            let index = node_id - self.base_graph.node_count();
            return QueryGraphEdgeIterator::new(&[], &self.virtual_adjacency_list[index]);
        }

        let virtual_edges = self
            .virtual_adjacency_list_existing_nodes
            .get(&node_id)
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        QueryGraphEdgeIterator::new(self.base_graph.node_edges(node_id), virtual_edges)
    }
}

impl GeometryAccess for QueryGraph<'_> {
    fn edge_geometry(&self, edge_id: EdgeId) -> &[GeoPoint] {
        if self.is_virtual_edge(edge_id) {
            &self.virtual_edge_geometry[edge_id - self.base_graph.edge_count()]
        } else {
            self.base_graph.edge_geometry(edge_id)
        }
    }

    fn node_geometry(&self, node_id: NodeId) -> &GeoPoint {
        if self.is_virtual_node(node_id) {
            &self.virtual_nodes[node_id - self.base_graph.node_count()]
        } else {
            self.base_graph.node_geometry(node_id)
        }
    }
}
