use fxhash::FxHashMap;
use geo::{Closest, HaversineClosestPoint, Rect};
use rstar::primitives::GeomWithData;
use rstar::{AABB, PointDistance, RStarInsertionStrategy, RTree, RTreeObject, RTreeParams};
use tracing::info;

use crate::{
    base_graph::{BaseGraph, BaseGraphEdge},
    constants::METERS_PER_DEGREE_LAT,
    geopoint::GeoPoint,
    graph::{GeometryAccess, Graph},
    snap::Snap,
    stopwatch::Stopwatch,
    types::EdgeId,
    weighting::Weighting,
};

struct IndexedLine(geo::Line);

impl IndexedLine {
    fn new(start: &GeoPoint, end: &GeoPoint) -> Self {
        IndexedLine(geo::Line::new(
            geo::Coord::from(*start),
            geo::Coord::from(*end),
        ))
    }

    fn line(&self) -> &geo::Line {
        &self.0
    }
}

impl RTreeObject for IndexedLine {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        let line = self.line();
        AABB::from_corners([line.start.x, line.start.y], [line.end.x, line.end.y])
    }
}

impl PointDistance for IndexedLine {
    /// Planar distance in degrees, only used to order candidates
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let line = self.line();
        let (dx, dy) = (line.end.x - line.start.x, line.end.y - line.start.y);
        let length_2 = dx * dx + dy * dy;

        let t = if length_2 == 0.0 {
            0.0
        } else {
            (((point[0] - line.start.x) * dx + (point[1] - line.start.y) * dy) / length_2)
                .clamp(0.0, 1.0)
        };

        let (px, py) = (line.start.x + t * dx, line.start.y + t * dy);
        (point[0] - px).powi(2) + (point[1] - py).powi(2)
    }
}

struct IndexedData {
    edge_id: EdgeId,
    segment_index: usize,
}

type LocationIndexObject = GeomWithData<IndexedLine, IndexedData>;

struct LocationIndexTreeParams;

impl RTreeParams for LocationIndexTreeParams {
    type DefaultInsertionStrategy = RStarInsertionStrategy;

    const MAX_SIZE: usize = 64;
    const MIN_SIZE: usize = 28;
    const REINSERTION_COUNT: usize = 5;
}

/// Spatial index over every segment of every edge geometry
pub struct LocationIndex {
    tree: RTree<LocationIndexObject, LocationIndexTreeParams>,
}

impl LocationIndex {
    pub fn build_from_graph(graph: &BaseGraph) -> LocationIndex {
        let stopwatch = Stopwatch::started("location_index/build");

        let segments: Vec<LocationIndexObject> = (0..graph.edge_count())
            .flat_map(|edge_id| {
                graph
                    .edge_geometry(edge_id)
                    .windows(2)
                    .enumerate()
                    .map(move |(segment_index, pair)| {
                        LocationIndexObject::new(
                            IndexedLine::new(&pair[0], &pair[1]),
                            IndexedData {
                                edge_id,
                                segment_index,
                            },
                        )
                    })
            })
            .collect();

        let segment_count = segments.len();
        let tree = RTree::bulk_load_with_params(segments);

        stopwatch.report();
        info!(segments = segment_count, "Built location index");

        LocationIndex { tree }
    }

    fn project(object: &LocationIndexObject, coordinates: &GeoPoint) -> Snap {
        let line = object.geom().line();
        let closest_point: GeoPoint = match line.haversine_closest_point(&coordinates.into()) {
            Closest::Intersection(point) => point.into(),
            Closest::SinglePoint(point) => point.into(),
            Closest::Indeterminate => GeoPoint::new(line.start.y, line.start.x),
        };

        Snap::new(
            object.data.edge_id,
            object.data.segment_index,
            closest_point,
            coordinates.haversine_distance(&closest_point),
        )
    }

    /// Closest point on an edge the weighting can traverse
    pub fn snap<W>(&self, graph: &BaseGraph, weighting: &W, coordinates: &GeoPoint) -> Option<Snap>
    where
        W: Weighting<BaseGraphEdge> + ?Sized,
    {
        self.tree
            .nearest_neighbor_iter(&[coordinates.lon(), coordinates.lat()])
            .find(|candidate| weighting.can_access_edge(graph.edge(candidate.data.edge_id)))
            .map(|candidate| Self::project(candidate, coordinates))
    }

    /// Up to `k` accessible edges within `radius` meters, one snap per edge, closest first
    pub fn k_nearest<W>(
        &self,
        graph: &BaseGraph,
        weighting: &W,
        coordinates: &GeoPoint,
        k: usize,
        radius: f64,
    ) -> Vec<Snap>
    where
        W: Weighting<BaseGraphEdge> + ?Sized,
    {
        // Degrees covering `radius` in both axes, the longitude one grows with the latitude
        let lat_degrees = radius / METERS_PER_DEGREE_LAT;
        let lon_degrees = lat_degrees / coordinates.lat().to_radians().cos().max(0.01);
        let search_radius = lat_degrees.max(lon_degrees);

        let mut best: FxHashMap<EdgeId, Snap> = FxHashMap::default();
        for candidate in self.tree.locate_within_distance(
            [coordinates.lon(), coordinates.lat()],
            search_radius * search_radius,
        ) {
            if !weighting.can_access_edge(graph.edge(candidate.data.edge_id)) {
                continue;
            }

            let snap = Self::project(candidate, coordinates);
            if snap.distance().value() > radius {
                continue;
            }

            match best.get(&snap.edge_id) {
                Some(existing) if existing.distance() <= snap.distance() => {}
                _ => {
                    best.insert(snap.edge_id, snap);
                }
            }
        }

        let mut snaps: Vec<Snap> = best.into_values().collect();
        snaps.sort_by(|a, b| a.distance().cmp(&b.distance()).then(a.edge_id.cmp(&b.edge_id)));
        snaps.truncate(k);
        snaps
    }

    /// Edges with at least one segment whose bounding box intersects `envelope`
    pub fn edges_in_envelope(&self, envelope: &Rect) -> Vec<EdgeId> {
        let aabb = AABB::from_corners(
            [envelope.min().x, envelope.min().y],
            [envelope.max().x, envelope.max().y],
        );

        let mut edges: Vec<EdgeId> = self
            .tree
            .locate_in_envelope_intersecting(&aabb)
            .map(|object| object.data.edge_id)
            .collect();
        edges.sort_unstable();
        edges.dedup();
        edges
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        properties::property::TravelMode, test_graph_utils::test_graph::grid_graph,
        weighting::shortest::ShortestWeighting,
    };

    use super::*;

    #[test]
    fn snaps_onto_the_closest_edge() {
        let graph = grid_graph(3, 3, 0.01, TravelMode::Foot, 5.0);
        let index = LocationIndex::build_from_graph(&graph);
        let weighting = ShortestWeighting::new(TravelMode::Foot);

        // Slightly north of edge 0 -> 1, closer to node 0
        let snap = index
            .snap(&graph, &weighting, &GeoPoint::new(0.0005, 0.004))
            .unwrap();
        assert_eq!(snap.edge_id, 0);
        assert_eq!(snap.segment_index, 0);
        assert!((snap.coordinates.lon - 0.004).abs() < 1e-6);
        assert!(snap.coordinates.lat.abs() < 1e-6);
        assert!((snap.distance().value() - 55.6).abs() < 0.5);
        assert_eq!(snap.nearest_base_node(&graph), 0);
    }

    #[test]
    fn skips_inaccessible_edges() {
        let graph = grid_graph(3, 3, 0.01, TravelMode::Foot, 5.0);
        let index = LocationIndex::build_from_graph(&graph);
        let weighting = ShortestWeighting::new(TravelMode::Car);
        assert!(index.snap(&graph, &weighting, &GeoPoint::new(0.0, 0.005)).is_none());
    }

    #[test]
    fn k_nearest_respects_radius() {
        let graph = grid_graph(3, 3, 0.01, TravelMode::Foot, 5.0);
        let index = LocationIndex::build_from_graph(&graph);
        let weighting = ShortestWeighting::new(TravelMode::Foot);

        // Close to node 4, every incident edge is within 60 m
        let point = GeoPoint::new(0.0101, 0.0101);
        let candidates = index.k_nearest(&graph, &weighting, &point, 10, 60.0);
        assert_eq!(candidates.len(), 4);
        assert!(candidates.windows(2).all(|pair| pair[0].distance() <= pair[1].distance()));

        let limited = index.k_nearest(&graph, &weighting, &point, 2, 60.0);
        assert_eq!(limited.len(), 2);

        let none = index.k_nearest(&graph, &weighting, &GeoPoint::new(0.005, 0.005), 10, 60.0);
        assert!(none.is_empty());
    }
}
