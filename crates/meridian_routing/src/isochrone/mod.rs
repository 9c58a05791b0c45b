pub mod isochrone_request;

use std::time::{Duration, Instant};

use fxhash::FxHashMap;
use geo::{ConcaveHull, MultiPoint, Polygon};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde::Deserialize;
use tracing::debug;

use crate::{
    constants::MAX_WEIGHT,
    error::RoutingError,
    graph::{GeometryAccess, UndirectedEdgeAccess},
    graph_edge::GraphEdge,
    routing::{
        dijkstra_search::DijkstraSearch, search_budget::SearchBudget,
        shortest_path_algorithm::CalcPathOptions, shortest_path_tree::TreeEntry,
    },
    types::{EdgeId, NodeId},
    weighting::{
        Weight, Weighting,
        metric::{CostMetric, MetricWeighting},
    },
};

pub const DEFAULT_CONCAVITY: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelRangeType {
    /// Ranges in seconds
    Time,
    /// Ranges in meters
    Distance,
}

impl TravelRangeType {
    fn metric(self) -> CostMetric {
        match self {
            TravelRangeType::Time => CostMetric::Time,
            TravelRangeType::Distance => CostMetric::Distance,
        }
    }

    /// Largest accumulated weight within `range`
    fn ceiling(self, range: f64) -> Weight {
        let weight = match self {
            TravelRangeType::Time => range * 1000.0,
            TravelRangeType::Distance => range,
        };
        weight.floor().min((MAX_WEIGHT - 1) as f64) as Weight
    }
}

/// Everything reachable within one range
#[derive(Debug, Clone)]
pub struct IsochroneBand {
    range: f64,
    max_weight: Weight,
    nodes: Vec<NodeId>,
    edges: Vec<EdgeId>,
    polygon: Option<Polygon<f64>>,
}

impl IsochroneBand {
    pub fn range(&self) -> f64 {
        self.range
    }

    pub fn max_weight(&self) -> Weight {
        self.max_weight
    }

    /// Reachable nodes, cheapest first
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Edges that can be traversed completely within the range
    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    /// Concave hull of the reachable nodes, `None` below three nodes
    pub fn polygon(&self) -> Option<&Polygon<f64>> {
        self.polygon.as_ref()
    }
}

#[derive(Debug)]
pub struct IsochroneResult {
    pub source: NodeId,
    pub range_type: TravelRangeType,
    /// Ordered by ascending range
    pub bands: Vec<IsochroneBand>,
    pub visited_nodes: usize,
    pub duration: Duration,
}

impl IsochroneResult {
    /// One polygon feature per band holding a polygon, largest band first
    pub fn to_geojson(&self) -> FeatureCollection {
        let features = self
            .bands
            .iter()
            .rev()
            .filter_map(|band| {
                let polygon = band.polygon()?;
                let ring: Vec<Vec<f64>> = polygon
                    .exterior()
                    .coords()
                    .map(|coord| vec![coord.x, coord.y])
                    .collect();

                let mut properties = JsonObject::new();
                properties.insert("range".to_string(), band.range().into());
                properties.insert("nodes".to_string(), band.nodes().len().into());

                Some(Feature {
                    bbox: None,
                    geometry: Some(Geometry::new(Value::Polygon(vec![ring]))),
                    id: None,
                    properties: Some(properties),
                    foreign_members: None,
                })
            })
            .collect();

        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }
}

/// Cost bounded search from one source, split into bands after a single run
pub struct IsochroneBuilder<'a, G, W: ?Sized> {
    graph: &'a G,
    weighting: &'a W,
    concavity: f64,
    reported_nodes: usize,
}

impl<'a, G, W> IsochroneBuilder<'a, G, W>
where
    G: UndirectedEdgeAccess + GeometryAccess,
    W: Weighting<G::Edge> + ?Sized,
{
    pub fn new(graph: &'a G, weighting: &'a W) -> Self {
        IsochroneBuilder {
            graph,
            weighting,
            concavity: DEFAULT_CONCAVITY,
            reported_nodes: usize::MAX,
        }
    }

    pub fn with_concavity(mut self, concavity: f64) -> Self {
        self.concavity = concavity;
        self
    }

    /// Keeps nodes from `node_count` on out of the bands. On a query graph these are the
    /// virtual nodes of snapped points.
    pub fn with_reported_nodes(mut self, node_count: usize) -> Self {
        self.reported_nodes = node_count;
        self
    }

    pub fn calc(
        &self,
        source: NodeId,
        range_type: TravelRangeType,
        ranges: &[f64],
        options: &CalcPathOptions,
    ) -> Result<IsochroneResult, RoutingError> {
        if ranges.is_empty() {
            return Err(RoutingError::InvalidRequest("at least one range is required".to_string()));
        }
        if let Some(range) = ranges.iter().find(|range| !range.is_finite() || **range <= 0.0) {
            return Err(RoutingError::InvalidRequest(format!("invalid range {}", range)));
        }

        let started_at = Instant::now();

        let mut ranges = ranges.to_vec();
        ranges.sort_by(f64::total_cmp);
        let ceilings: Vec<Weight> = ranges.iter().map(|&range| range_type.ceiling(range)).collect();
        let max_ceiling = ceilings.last().copied().unwrap_or_default();

        let weighting = MetricWeighting::new(self.weighting, range_type.metric());
        let mut search = DijkstraSearch::new(self.graph, &weighting);
        let mut budget = SearchBudget::from_options(options);
        let reachable = search.calc_reachable(source, max_ceiling, &mut budget)?;

        let mut nodes: Vec<(Weight, NodeId)> = reachable
            .iter()
            .filter(|&(&node, _)| node < self.reported_nodes)
            .map(|(&node, entry)| (entry.weight, node))
            .collect();
        nodes.sort_unstable();

        let edges = self.edge_costs(&weighting, &reachable, max_ceiling);

        let bands = ranges
            .iter()
            .zip(ceilings)
            .map(|(&range, max_weight)| {
                let count = nodes.partition_point(|&(weight, _)| weight <= max_weight);
                let band_nodes: Vec<NodeId> = nodes[..count].iter().map(|&(_, node)| node).collect();

                let mut band_edges: Vec<EdgeId> = edges
                    .iter()
                    .filter(|&(_, &cost)| cost <= max_weight)
                    .map(|(&edge_id, _)| edge_id)
                    .collect();
                band_edges.sort_unstable();

                let polygon = self.hull(&band_nodes);
                IsochroneBand {
                    range,
                    max_weight,
                    nodes: band_nodes,
                    edges: band_edges,
                    polygon,
                }
            })
            .collect();

        debug!(
            source,
            reachable = nodes.len(),
            visited_nodes = budget.visited_nodes(),
            "isochrone computed"
        );

        Ok(IsochroneResult {
            source,
            range_type,
            bands,
            visited_nodes: budget.visited_nodes(),
            duration: started_at.elapsed(),
        })
    }

    /// Cheapest cost of traversing each edge completely, over both entry points.
    /// Pieces of split edges do not count, the edge they come from is still there whole.
    fn edge_costs<M>(
        &self,
        weighting: &M,
        reachable: &FxHashMap<NodeId, TreeEntry>,
        max_weight: Weight,
    ) -> FxHashMap<EdgeId, Weight>
    where
        M: Weighting<G::Edge>,
    {
        let mut costs: FxHashMap<EdgeId, Weight> = FxHashMap::default();

        for (&node, entry) in reachable {
            for edge_id in self.graph.node_edges_iter(node) {
                let edge = self.graph.edge(edge_id);
                if edge.id() != edge_id {
                    continue;
                }
                let edge_weight = weighting.calc_edge_weight(edge, self.graph.edge_direction(edge_id, node));
                if edge_weight == MAX_WEIGHT {
                    continue;
                }

                let cost = entry.weight.saturating_add(edge_weight);
                if cost > max_weight {
                    continue;
                }

                let current = costs.entry(edge.id()).or_insert(cost);
                *current = (*current).min(cost);
            }
        }

        costs
    }

    fn hull(&self, nodes: &[NodeId]) -> Option<Polygon<f64>> {
        if nodes.len() < 3 {
            return None;
        }

        let points: MultiPoint<f64> = nodes
            .iter()
            .map(|&node| geo::Point::from(self.graph.node_geometry(node)))
            .collect();
        Some(points.concave_hull(self.concavity))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        geopoint::GeoPoint,
        graph::Graph,
        location_index::LocationIndex,
        properties::property::TravelMode,
        query::query_graph::QueryGraph,
        routing::{astar::Dijkstra, shortest_path_algorithm::ShortestPathAlgorithm},
        test_graph_utils::test_graph::{grid_graph, line_graph},
        weighting::fastest::FastestWeighting,
    };

    use super::*;

    #[test]
    fn matches_brute_force_reachability() {
        let graph = grid_graph(8, 8, 0.001, TravelMode::Foot, 5.0);
        let weighting = FastestWeighting::new(TravelMode::Foot);
        let source = 27;

        let result = IsochroneBuilder::new(&graph, &weighting)
            .calc(source, TravelRangeType::Time, &[300.0], &CalcPathOptions::default())
            .unwrap();

        let time_weighting = MetricWeighting::new(&weighting, CostMetric::Time);
        let mut expected: Vec<NodeId> = (0..64)
            .filter(|&node| {
                Dijkstra::new(&graph, &time_weighting)
                    .calc_path(source, node, &CalcPathOptions::default())
                    .is_ok_and(|result| result.path.weight <= 300_000)
            })
            .collect();
        expected.sort_unstable();

        let mut actual = result.bands[0].nodes().to_vec();
        actual.sort_unstable();

        assert!(actual.len() > 1 && actual.len() < 64);
        assert_eq!(actual, expected);
        assert!(result.bands[0].polygon().is_some());
        assert_eq!(result.to_geojson().features.len(), 1);
    }

    #[test]
    fn bands_are_sorted_and_nested() {
        let graph = grid_graph(8, 8, 0.001, TravelMode::Foot, 5.0);
        let weighting = FastestWeighting::new(TravelMode::Foot);

        let result = IsochroneBuilder::new(&graph, &weighting)
            .calc(0, TravelRangeType::Time, &[400.0, 150.0], &CalcPathOptions::default())
            .unwrap();

        assert_eq!(result.bands.len(), 2);
        assert_eq!(result.bands[0].range(), 150.0);
        assert_eq!(result.bands[0].max_weight(), 150_000);

        let inner = result.bands[0].nodes();
        let outer = result.bands[1].nodes();
        assert!(inner.len() < outer.len());
        assert_eq!(inner, &outer[..inner.len()]);
        assert!(result.bands[0].edges().iter().all(|edge| result.bands[1].edges().contains(edge)));
    }

    #[test]
    fn distance_band_counts_whole_edges() {
        // Nodes about 111 m apart
        let graph = line_graph(5, TravelMode::Car, 50.0);
        let weighting = FastestWeighting::new(TravelMode::Car);

        let result = IsochroneBuilder::new(&graph, &weighting)
            .calc(0, TravelRangeType::Distance, &[250.0], &CalcPathOptions::default())
            .unwrap();

        assert_eq!(result.bands[0].nodes(), &[0, 1, 2]);
        assert_eq!(result.bands[0].edges(), &[0, 1]);
    }

    #[test]
    fn snapped_source_inside_an_edge() {
        let graph = line_graph(3, TravelMode::Car, 50.0);
        let weighting = FastestWeighting::new(TravelMode::Car);
        let index = LocationIndex::build_from_graph(&graph);
        let mut snaps = [index
            .snap(&graph, &weighting, &GeoPoint::new(0.0, 0.0005))
            .unwrap()];
        let query_graph = QueryGraph::from_base_graph(&graph, &mut snaps);
        let source = snaps[0].closest_node().unwrap();
        assert!(query_graph.is_virtual_node(source));

        let result = IsochroneBuilder::new(&query_graph, &weighting)
            .with_reported_nodes(graph.node_count())
            .calc(source, TravelRangeType::Distance, &[100.0, 200.0], &CalcPathOptions::default())
            .unwrap();

        // Both ends of the split edge are about 56 m away, node 2 about 167 m
        let mut near = result.bands[0].nodes().to_vec();
        near.sort_unstable();
        assert_eq!(near, vec![0, 1]);
        assert!(result.bands[0].edges().is_empty());

        let mut far = result.bands[1].nodes().to_vec();
        far.sort_unstable();
        assert_eq!(far, vec![0, 1, 2]);
        assert_eq!(result.bands[1].edges(), &[0, 1]);
    }

    #[test]
    fn rejects_invalid_ranges() {
        let graph = line_graph(2, TravelMode::Car, 50.0);
        let weighting = FastestWeighting::new(TravelMode::Car);
        let builder = IsochroneBuilder::new(&graph, &weighting);

        for ranges in [&[][..], &[-1.0], &[f64::NAN]] {
            assert!(matches!(
                builder.calc(0, TravelRangeType::Time, ranges, &CalcPathOptions::default()),
                Err(RoutingError::InvalidRequest(_))
            ));
        }
    }
}
