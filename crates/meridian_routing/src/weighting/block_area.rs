use fxhash::FxHashSet;
use geo::{BoundingRect, Intersects, LineString, Polygon, Rect};

use crate::{
    base_graph::BaseGraph,
    constants::{MAX_DURATION, MAX_WEIGHT},
    distance::{Distance, Meters},
    edge_direction::EdgeDirection,
    graph::GeometryAccess,
    graph_edge::GraphEdge,
    location_index::LocationIndex,
    types::EdgeId,
};

use super::{Milliseconds, Weight, Weighting};

/// Area a request must not cross
#[derive(Debug, Clone)]
pub enum BlockedArea {
    Polygon(Polygon),
    BoundingBox(Rect),
}

impl BlockedArea {
    fn polygon(&self) -> Polygon {
        match self {
            BlockedArea::Polygon(polygon) => polygon.clone(),
            BlockedArea::BoundingBox(rect) => rect.to_polygon(),
        }
    }
}

/// Base edges whose geometry touches any of the areas
pub fn blocked_edges(graph: &BaseGraph, index: &LocationIndex, areas: &[BlockedArea]) -> FxHashSet<EdgeId> {
    let mut blocked = FxHashSet::default();

    for area in areas {
        let polygon = area.polygon();
        let Some(envelope) = polygon.bounding_rect() else {
            continue;
        };

        for edge_id in index.edges_in_envelope(&envelope) {
            if blocked.contains(&edge_id) {
                continue;
            }

            let line: LineString = graph
                .edge_geometry(edge_id)
                .iter()
                .map(|point| geo::Coord::from(*point))
                .collect();

            if polygon.intersects(&line) {
                blocked.insert(edge_id);
            }
        }
    }

    blocked
}

/// Makes every edge intersecting a blocked area impassable
pub struct BlockAreaWeighting<W> {
    inner: W,
    blocked: FxHashSet<EdgeId>,
}

impl<W> BlockAreaWeighting<W> {
    pub fn new(inner: W, blocked: FxHashSet<EdgeId>) -> Self {
        BlockAreaWeighting { inner, blocked }
    }

    pub fn blocked_edge_count(&self) -> usize {
        self.blocked.len()
    }
}

impl<E: GraphEdge, W: Weighting<E>> Weighting<E> for BlockAreaWeighting<W> {
    fn calc_edge_weight(&self, edge: &E, direction: EdgeDirection) -> Weight {
        if self.blocked.contains(&edge.id()) {
            return MAX_WEIGHT;
        }
        self.inner.calc_edge_weight(edge, direction)
    }

    fn calc_edge_ms(&self, edge: &E, direction: EdgeDirection) -> Milliseconds {
        if self.blocked.contains(&edge.id()) {
            return MAX_DURATION;
        }
        self.inner.calc_edge_ms(edge, direction)
    }

    fn min_weight(&self, distance: Distance<Meters>) -> Weight {
        self.inner.min_weight(distance)
    }
}

#[cfg(test)]
mod tests {
    use geo::{coord, polygon};

    use crate::{
        graph::Graph,
        properties::property::TravelMode,
        test_graph_utils::test_graph::grid_graph,
        weighting::shortest::ShortestWeighting,
    };

    use super::*;

    #[test]
    fn blocks_edges_crossing_the_area() {
        // 3x3 grid, 0.01 degrees apart, origin at (0, 0)
        let graph = grid_graph(3, 3, 0.01, TravelMode::Foot, 5.0);
        let index = LocationIndex::build_from_graph(&graph);

        // Small square around the center node (1, 1)
        let area = BlockedArea::Polygon(polygon![
            (x: 0.009, y: 0.009),
            (x: 0.011, y: 0.009),
            (x: 0.011, y: 0.011),
            (x: 0.009, y: 0.011),
        ]);
        let blocked = blocked_edges(&graph, &index, &[area]);

        // The center node has four incident edges
        assert_eq!(blocked.len(), 4);
        let center = 4;
        for edge_id in graph.node_edges(center) {
            assert!(blocked.contains(edge_id));
        }

        let weighting = BlockAreaWeighting::new(ShortestWeighting::new(TravelMode::Foot), blocked);
        let center_edge = graph.edge(graph.node_edges(center)[0]);
        assert_eq!(weighting.calc_edge_weight(center_edge, EdgeDirection::Forward), MAX_WEIGHT);
        assert_ne!(weighting.calc_edge_weight(graph.edge(0), EdgeDirection::Forward), MAX_WEIGHT);
    }

    #[test]
    fn bounding_boxes_are_supported() {
        let graph = grid_graph(3, 3, 0.01, TravelMode::Foot, 5.0);
        let index = LocationIndex::build_from_graph(&graph);
        let area = BlockedArea::BoundingBox(Rect::new(
            coord! { x: -0.001, y: -0.001 },
            coord! { x: 0.001, y: 0.001 },
        ));

        // Node 0 sits in the corner of the grid with two edges
        let blocked = blocked_edges(&graph, &index, &[area]);
        assert_eq!(blocked.len(), 2);
    }
}
