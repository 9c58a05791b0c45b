use std::{sync::Arc, time::Duration};

use geo::{LineString, Polygon};
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::{
    ch::ch_query::CHQuery,
    config::{ProfileConfig, RoutingConfig},
    error::RoutingError,
    generation::GraphGeneration,
    geopoint::GeoPoint,
    graph::Graph,
    isochrone::{IsochroneBuilder, IsochroneResult, TravelRangeType, isochrone_request::IsochroneRequest},
    landmarks::landmark_heuristic::LandmarkHeuristic,
    map_matching::{MapMatchResult, MapMatcher, map_match_request::MapMatchRequest},
    matrix::{
        ch_matrix_algorithm::CHMatrixAlgorithm,
        dijkstra_matrix_algorithm::DijkstraMatrixAlgorithm,
        matrix::Matrix,
        matrix_algorithm::{MatrixAlgorithm, MatrixAlgorithmResult},
        matrix_request::MatrixRequest,
    },
    query::query_graph::QueryGraph,
    routing::{
        astar::{AStar, Dijkstra},
        astar_heuristic::BeelineHeuristic,
        bidirectional_dijkstra::BidirectionalDijkstra,
        routing_path::{RoutingPath, RoutingPathLeg},
        routing_path_builder::build_routing_path_leg,
        routing_request::{RequestOptions, RouteRequest, RoutingAlgorithm},
        shortest_path_algorithm::{CalcPathDebugInfo, CalcPathOptions, CalcPathResult, ShortestPathAlgorithm},
    },
    snap::Snap,
    types::NodeId,
    weighting::{
        Weighting,
        block_area::{BlockAreaWeighting, BlockedArea, blocked_edges},
        registry::{WeightingParams, WeightingRegistry},
        traffic::{TrafficSpeeds, TrafficWeighting},
    },
};

#[derive(Debug)]
pub struct RouteResponse {
    pub path: RoutingPath,
    pub algorithm: RoutingAlgorithm,
    pub nodes_visited: usize,
    pub duration: Duration,
    /// Generation the route was computed on
    pub generation: u64,
    /// One entry per leg when requested
    pub debug: Vec<CalcPathDebugInfo>,
}

#[derive(Debug)]
pub struct MatrixResponse {
    pub matrix: Matrix,
    pub used_ch: bool,
    pub visited_nodes: usize,
    pub duration: Duration,
    pub generation: u64,
}

/// Profile of one request, with the weighting the request asks for
struct ResolvedProfile<'c> {
    config: &'c ProfileConfig,
    weighting: Box<dyn Weighting>,
    /// Why the prepared hierarchy cannot serve the request, `None` when it can
    ch_unavailable: Option<String>,
    /// Why the prepared landmarks cannot guide the request, `None` when they can
    lm_unavailable: Option<String>,
}

impl ResolvedProfile<'_> {
    fn mismatch(&self) -> RoutingError {
        RoutingError::ProfileMismatch {
            profile: self.config.name.clone(),
            reason: self
                .ch_unavailable
                .clone()
                .unwrap_or_else(|| "no hierarchy".to_string()),
        }
    }

    fn lm_mismatch(&self) -> RoutingError {
        RoutingError::ProfileMismatch {
            profile: self.config.name.clone(),
            reason: self
                .lm_unavailable
                .clone()
                .unwrap_or_else(|| "no landmarks".to_string()),
        }
    }

    fn use_ch(&self, options: &RequestOptions) -> Result<bool, RoutingError> {
        match &self.ch_unavailable {
            None => Ok(true),
            Some(_) if options.force_ch => Err(self.mismatch()),
            Some(_) => Ok(false),
        }
    }
}

/// Routing engine. Queries read the active graph generation and traffic table through
/// shared snapshots, so swapping either never disturbs queries in flight.
pub struct Meridian {
    config: RoutingConfig,
    registry: WeightingRegistry,
    generation: RwLock<Arc<GraphGeneration>>,
    traffic: RwLock<Arc<TrafficSpeeds>>,
}

impl Meridian {
    pub fn new(config: RoutingConfig, registry: WeightingRegistry, generation: GraphGeneration) -> Result<Self, RoutingError> {
        if let Some(profile) = config
            .profiles
            .iter()
            .find(|profile| !registry.contains(&profile.weighting))
        {
            return Err(RoutingError::UnknownWeighting(profile.weighting.clone()));
        }

        info!(
            generation = generation.id(),
            profiles = config.profiles.len(),
            ch = ?generation.ch_profiles(),
            landmarks = ?generation.lm_profiles(),
            "engine ready"
        );

        Ok(Meridian {
            config,
            registry,
            generation: RwLock::new(Arc::new(generation)),
            traffic: RwLock::new(Arc::new(TrafficSpeeds::default())),
        })
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// Snapshot of the active generation
    pub fn generation(&self) -> Arc<GraphGeneration> {
        self.generation.read().clone()
    }

    /// Activates `generation` and returns the previous one, which stays valid for
    /// the queries still holding it
    pub fn swap_generation(&self, generation: GraphGeneration) -> Arc<GraphGeneration> {
        let id = generation.id();
        let previous = std::mem::replace(&mut *self.generation.write(), Arc::new(generation));
        info!(previous = previous.id(), generation = id, "generation swapped");
        previous
    }

    pub fn traffic(&self) -> Arc<TrafficSpeeds> {
        self.traffic.read().clone()
    }

    /// Replaces the traffic table as a whole
    pub fn update_traffic(&self, speeds: TrafficSpeeds) {
        let version = speeds.version();
        let edges = speeds.len();
        *self.traffic.write() = Arc::new(speeds);
        info!(version, edges, "traffic updated");
    }

    fn resolve<'c>(
        &'c self,
        generation: &GraphGeneration,
        profile_name: &str,
        options: &RequestOptions,
    ) -> Result<ResolvedProfile<'c>, RoutingError> {
        let config = self
            .config
            .profile(profile_name)
            .ok_or_else(|| RoutingError::UnknownProfile(profile_name.to_string()))?;

        let weighting_name = options.weighting.as_deref().unwrap_or(&config.weighting);
        let mut weighting: Box<dyn Weighting> = Box::new(
            self.registry
                .create(weighting_name, &WeightingParams::from(config))?,
        );

        if config.traffic {
            weighting = Box::new(TrafficWeighting::new(weighting, self.traffic()));
        }

        if !options.blocked_areas.is_empty() {
            let areas: Vec<BlockedArea> = options
                .blocked_areas
                .iter()
                .map(|ring| {
                    let exterior: LineString = ring.iter().map(|point| geo::Coord::from(*point)).collect();
                    BlockedArea::Polygon(Polygon::new(exterior, Vec::new()))
                })
                .collect();
            let blocked = blocked_edges(generation.graph(), generation.index(), &areas);
            debug!(areas = areas.len(), blocked = blocked.len(), "blocked areas resolved");
            weighting = Box::new(BlockAreaWeighting::new(weighting, blocked));
        }

        let ch_unavailable = if options.disable_ch {
            Some("hierarchies are disabled for this request".to_string())
        } else if generation.ch(&config.name).is_none() {
            Some("no hierarchy is prepared for this profile".to_string())
        } else if weighting_name != config.weighting {
            Some(format!("the hierarchy is prepared for weighting {}", config.weighting))
        } else if config.traffic {
            Some("the profile uses live traffic".to_string())
        } else if !options.blocked_areas.is_empty() {
            Some("blocked areas need a flexible search".to_string())
        } else {
            None
        };

        // Traffic and blocked areas only raise edge costs, the landmark bounds still hold
        let lm_unavailable = if generation.landmarks(&config.name).is_none() {
            Some("no landmarks are prepared for this profile".to_string())
        } else if weighting_name != config.weighting {
            Some(format!("the landmarks are prepared for weighting {}", config.weighting))
        } else {
            None
        };

        Ok(ResolvedProfile {
            config,
            weighting,
            ch_unavailable,
            lm_unavailable,
        })
    }

    fn calc_path_options(&self, options: &RequestOptions) -> CalcPathOptions {
        let max_visited_nodes = options
            .max_visited_nodes
            .map_or(self.config.max_visited_nodes, |max| max.min(self.config.max_visited_nodes));

        CalcPathOptions::default()
            .with_max_visited_nodes(max_visited_nodes)
            .with_timeout(self.config.timeout())
    }

    /// Snaps every point, `first_index` being the request index of the first one
    fn snap_points<W>(
        &self,
        generation: &GraphGeneration,
        weighting: &W,
        points: &[GeoPoint],
        first_index: usize,
    ) -> Result<Vec<Snap>, RoutingError>
    where
        W: Weighting + ?Sized,
    {
        points
            .iter()
            .enumerate()
            .map(|(offset, point)| {
                generation
                    .index()
                    .snap(generation.graph(), weighting, point)
                    .filter(|snap| {
                        self.config
                            .snap_radius
                            .is_none_or(|radius| snap.distance().value() <= radius)
                    })
                    .ok_or(RoutingError::PointNotFound {
                        index: first_index + offset,
                    })
            })
            .collect()
    }

    fn select_algorithm(
        &self,
        profile: &ResolvedProfile,
        requested: Option<RoutingAlgorithm>,
        options: &RequestOptions,
    ) -> Result<RoutingAlgorithm, RoutingError> {
        match requested {
            Some(RoutingAlgorithm::Ch) => match profile.ch_unavailable {
                None => Ok(RoutingAlgorithm::Ch),
                Some(_) => Err(profile.mismatch()),
            },
            Some(_) if options.force_ch => Err(RoutingError::InvalidRequest(
                "force_ch contradicts the requested algorithm".to_string(),
            )),
            Some(RoutingAlgorithm::Alt) => match profile.lm_unavailable {
                None => Ok(RoutingAlgorithm::Alt),
                Some(_) => Err(profile.lm_mismatch()),
            },
            Some(algorithm) => Ok(algorithm),
            None if profile.use_ch(options)? => Ok(RoutingAlgorithm::Ch),
            None if profile.lm_unavailable.is_none() => Ok(RoutingAlgorithm::Alt),
            None => Ok(RoutingAlgorithm::BidirectionalDijkstra),
        }
    }

    pub fn route(&self, request: &RouteRequest) -> Result<RouteResponse, RoutingError> {
        if request.points.len() < 2 {
            return Err(RoutingError::InvalidRequest(
                "a route needs at least two points".to_string(),
            ));
        }

        let generation = self.generation();
        let graph = generation.graph();
        let profile = self.resolve(&generation, &request.profile, &request.options)?;
        let algorithm = self.select_algorithm(&profile, request.algorithm, &request.options)?;
        let options = self
            .calc_path_options(&request.options)
            .with_debug_info(request.include_debug_info);
        let weighting = profile.weighting.as_ref();
        let mut snaps = self.snap_points(&generation, weighting, &request.points, 0)?;

        let query_graph = QueryGraph::from_base_graph(graph, &mut snaps);
        let nodes = closest_nodes(&snaps)?;

        let mut legs: Vec<(CalcPathResult, RoutingPathLeg)> = Vec::with_capacity(nodes.len() - 1);
        match algorithm {
            RoutingAlgorithm::Ch => {
                let storage = generation
                    .ch(&profile.config.name)
                    .ok_or_else(|| profile.mismatch())?;
                let mut query = CHQuery::new(storage);
                for pair in nodes.windows(2) {
                    let result = query.calc_query_path(&query_graph, weighting, pair[0], pair[1], &options)?;
                    let leg = build_routing_path_leg(&query_graph, &result.path);
                    legs.push((result, leg));
                }
            }
            RoutingAlgorithm::Alt => {
                let storage = generation
                    .landmarks(&profile.config.name)
                    .ok_or_else(|| profile.lm_mismatch())?;
                // Landmark weights of snapped points come from the weighting the
                // landmarks were prepared with, not from the decorated one
                let prepared = self
                    .registry
                    .create(&profile.config.weighting, &WeightingParams::from(profile.config))?;
                let heuristic = LandmarkHeuristic::for_query_graph(storage, &query_graph, prepared.as_ref());
                let mut alt = AStar::with_heuristic(&query_graph, weighting, heuristic);
                for pair in nodes.windows(2) {
                    let result = alt.calc_path(pair[0], pair[1], &options)?;
                    let leg = build_routing_path_leg(&query_graph, &result.path);
                    legs.push((result, leg));
                }
            }
            _ => {
                for pair in nodes.windows(2) {
                    let result = match algorithm {
                        RoutingAlgorithm::Dijkstra => {
                            Dijkstra::new(&query_graph, weighting).calc_path(pair[0], pair[1], &options)
                        }
                        RoutingAlgorithm::Astar => AStar::with_heuristic(&query_graph, weighting, BeelineHeuristic)
                            .calc_path(pair[0], pair[1], &options),
                        _ => BidirectionalDijkstra::new(&query_graph, weighting).calc_path(pair[0], pair[1], &options),
                    }?;
                    let leg = build_routing_path_leg(&query_graph, &result.path);
                    legs.push((result, leg));
                }
            }
        }

        let nodes_visited: usize = legs.iter().map(|(result, _)| result.nodes_visited).sum();
        let duration: Duration = legs.iter().map(|(result, _)| result.duration).sum();
        let mut debug_info = Vec::new();
        let mut path_legs = Vec::with_capacity(legs.len());
        for (result, leg) in legs {
            debug_info.extend(result.debug);
            path_legs.push(leg);
        }

        debug!(
            profile = request.profile,
            algorithm = algorithm.name(),
            nodes_visited,
            "route computed"
        );

        Ok(RouteResponse {
            path: RoutingPath::new(path_legs),
            algorithm,
            nodes_visited,
            duration,
            generation: generation.id(),
            debug: debug_info,
        })
    }

    pub fn matrix(&self, request: &MatrixRequest) -> Result<MatrixResponse, RoutingError> {
        if request.sources.is_empty() || request.targets.is_empty() {
            return Err(RoutingError::InvalidRequest(
                "a matrix needs at least one source and one target".to_string(),
            ));
        }

        let max = self.config.max_matrix_locations;
        let actual = request.sources.len().max(request.targets.len());
        if actual > max {
            return Err(RoutingError::TooManyLocations { max, actual });
        }

        let generation = self.generation();
        let graph = generation.graph();
        let profile = self.resolve(&generation, &request.profile, &request.options)?;
        let used_ch = profile.use_ch(&request.options)?;
        let options = self.calc_path_options(&request.options);
        let weighting = profile.weighting.as_ref();

        // One query graph holds the snapped points of both sides
        let mut snaps = self.snap_points(&generation, weighting, &request.sources, 0)?;
        snaps.extend(self.snap_points(&generation, weighting, &request.targets, request.sources.len())?);
        let query_graph = QueryGraph::from_base_graph(graph, &mut snaps);
        let nodes = closest_nodes(&snaps)?;
        let (sources, targets) = nodes.split_at(request.sources.len());

        let MatrixAlgorithmResult {
            matrix,
            visited_nodes,
            duration,
        } = match generation.ch(&profile.config.name) {
            Some(storage) if used_ch => {
                CHMatrixAlgorithm::new(storage).calc_query_matrix(&query_graph, weighting, sources, targets, &options)?
            }
            _ => DijkstraMatrixAlgorithm::new(&query_graph, weighting).calc_matrix(sources, targets, &options)?,
        };

        debug!(
            profile = request.profile,
            used_ch,
            visited_nodes,
            "matrix computed"
        );

        Ok(MatrixResponse {
            matrix,
            used_ch,
            visited_nodes,
            duration,
            generation: generation.id(),
        })
    }

    pub fn isochrone(&self, request: &IsochroneRequest) -> Result<IsochroneResult, RoutingError> {
        let limits = &self.config.isochrone;
        if request.ranges.len() > limits.max_bands {
            return Err(RoutingError::InvalidRequest(format!(
                "{} ranges requested, at most {} are allowed",
                request.ranges.len(),
                limits.max_bands
            )));
        }

        let max_range = match request.range_type {
            TravelRangeType::Time => limits.max_time_range,
            TravelRangeType::Distance => limits.max_distance_range,
        };
        if let Some(range) = request.ranges.iter().find(|&&range| range > max_range) {
            return Err(RoutingError::InvalidRequest(format!(
                "range {} exceeds the maximum of {}",
                range, max_range
            )));
        }

        let generation = self.generation();
        let graph = generation.graph();
        let profile = self.resolve(&generation, &request.profile, &request.options)?;
        let weighting = profile.weighting.as_ref();
        let mut snaps = self.snap_points(&generation, weighting, std::slice::from_ref(&request.location), 0)?;
        let query_graph = QueryGraph::from_base_graph(graph, &mut snaps);
        let source = closest_nodes(&snaps)?
            .first()
            .copied()
            .ok_or(RoutingError::PointNotFound { index: 0 })?;

        let mut result = IsochroneBuilder::new(&query_graph, weighting)
            .with_concavity(limits.concavity)
            .with_reported_nodes(graph.node_count())
            .calc(
                source,
                request.range_type,
                &request.ranges,
                &self.calc_path_options(&request.options),
            )?;
        result.source = snaps[0].nearest_base_node(graph);
        Ok(result)
    }

    pub fn map_match(&self, request: &MapMatchRequest) -> Result<MapMatchResult, RoutingError> {
        let generation = self.generation();
        let profile = self.resolve(&generation, &request.profile, &request.options)?;

        MapMatcher::new(
            generation.graph(),
            generation.index(),
            profile.weighting.as_ref(),
            &self.config.map_matching,
        )
        .match_trace(&request.points, &self.calc_path_options(&request.options))
    }
}

/// Query graph nodes standing for `snaps`, in request order
fn closest_nodes(snaps: &[Snap]) -> Result<Vec<NodeId>, RoutingError> {
    snaps
        .iter()
        .enumerate()
        .map(|(index, snap)| snap.closest_node().ok_or(RoutingError::PointNotFound { index }))
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::{
        base_graph::BaseGraph,
        constants::NO_ROUTE,
        graph::Graph,
        edge_direction::EdgeDirection,
        properties::{property::TravelMode, property_map::EdgePropertyMap},
        test_graph_utils::test_graph::{grid_graph, line_graph},
    };

    use super::*;

    /// 5x5 car grid with an unreachable two node island
    fn network() -> BaseGraph {
        let mut graph = grid_graph(5, 5, 0.001, TravelMode::Car, 50.0);
        let a = graph.add_node(GeoPoint::new(0.02, 0.02));
        let b = graph.add_node(GeoPoint::new(0.02, 0.021));
        graph.add_edge(a, b, EdgePropertyMap::new().with_access(TravelMode::Car, 50.0, false));
        graph
    }

    fn config() -> RoutingConfig {
        RoutingConfig {
            profiles: vec![
                ProfileConfig::new("car", "fastest", TravelMode::Car),
                ProfileConfig::new("car_live", "fastest", TravelMode::Car)
                    .with_ch(false)
                    .with_traffic(true),
            ],
            ..RoutingConfig::default()
        }
    }

    fn engine(config: RoutingConfig) -> Meridian {
        let registry = WeightingRegistry::default();
        let generation = GraphGeneration::prepare(1, network(), &config, &registry).unwrap();
        Meridian::new(config, registry, generation).unwrap()
    }

    fn corners() -> Vec<GeoPoint> {
        vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.004, 0.004)]
    }

    #[test]
    fn ch_and_flexible_routes_agree() {
        let engine = engine(config());

        let ch = engine.route(&RouteRequest::new("car", corners())).unwrap();
        assert_eq!(ch.algorithm, RoutingAlgorithm::Ch);

        for algorithm in [
            RoutingAlgorithm::Dijkstra,
            RoutingAlgorithm::Astar,
            RoutingAlgorithm::BidirectionalDijkstra,
        ] {
            let flexible = engine
                .route(&RouteRequest::new("car", corners()).with_algorithm(algorithm))
                .unwrap();
            assert_eq!(flexible.algorithm, algorithm);
            assert_eq!(flexible.path.weight(), ch.path.weight());
            assert_eq!(flexible.path.time(), ch.path.time());
        }
    }

    /// Points inside edges of the grid, none on a node
    fn inner_points() -> Vec<GeoPoint> {
        vec![GeoPoint::new(0.001, 0.0014), GeoPoint::new(0.003, 0.0026)]
    }

    #[test]
    fn ch_matches_flexible_between_points_inside_edges() {
        let engine = engine(config());

        let ch = engine.route(&RouteRequest::new("car", inner_points())).unwrap();
        assert_eq!(ch.algorithm, RoutingAlgorithm::Ch);
        let flexible = engine
            .route(&RouteRequest::new("car", inner_points()).with_algorithm(RoutingAlgorithm::Dijkstra))
            .unwrap();

        assert_eq!(ch.path.weight(), flexible.path.weight());
        assert_eq!(ch.path.time(), flexible.path.time());
        // Neither route starts or ends on the nearest grid node
        let corners = engine.route(&RouteRequest::new(
            "car",
            vec![GeoPoint::new(0.001, 0.001), GeoPoint::new(0.003, 0.003)],
        ));
        assert!(ch.path.distance() < corners.unwrap().path.distance());
    }

    #[test]
    fn ch_matrix_matches_flexible_between_points_inside_edges() {
        let engine = engine(config());
        let points = inner_points();
        let targets = vec![points[1], GeoPoint::new(0.0, 0.0), points[0]];

        let ch = engine
            .matrix(&MatrixRequest::new("car", vec![points[0]], targets.clone()))
            .unwrap();
        assert!(ch.used_ch);
        assert_eq!(ch.matrix.weight(0, 2), 0);

        let mut request = MatrixRequest::new("car", vec![points[0]], targets);
        request.options.disable_ch = true;
        let flexible = engine.matrix(&request).unwrap();
        assert_eq!(flexible.matrix.weights(), ch.matrix.weights());

        let route = engine.route(&RouteRequest::new("car", points)).unwrap();
        assert_eq!(ch.matrix.weight(0, 0), route.path.weight());
    }

    #[test]
    fn landmarks_guide_profiles_without_hierarchy() {
        let mut config = config();
        config
            .profiles
            .push(ProfileConfig::new("car_lm", "fastest", TravelMode::Car).with_ch(false).with_landmarks(4));
        let engine = engine(config);

        let alt = engine.route(&RouteRequest::new("car_lm", inner_points())).unwrap();
        assert_eq!(alt.algorithm, RoutingAlgorithm::Alt);
        let dijkstra = engine
            .route(&RouteRequest::new("car_lm", inner_points()).with_algorithm(RoutingAlgorithm::Dijkstra))
            .unwrap();
        assert_eq!(alt.path.weight(), dijkstra.path.weight());
        assert_eq!(alt.path.time(), dijkstra.path.time());

        let result = engine.route(&RouteRequest::new("car", corners()).with_algorithm(RoutingAlgorithm::Alt));
        assert!(matches!(
            result,
            Err(RoutingError::ProfileMismatch { ref profile, .. }) if profile == "car"
        ));

        let other_weighting = RequestOptions {
            weighting: Some("shortest".to_string()),
            ..RequestOptions::default()
        };
        let fallback = engine
            .route(&RouteRequest::new("car_lm", corners()).with_options(other_weighting))
            .unwrap();
        assert_eq!(fallback.algorithm, RoutingAlgorithm::BidirectionalDijkstra);
    }

    #[test]
    fn hierarchy_cannot_serve_every_request() {
        let engine = engine(config());

        let forced = RequestOptions {
            force_ch: true,
            ..RequestOptions::default()
        };
        let result = engine.route(&RouteRequest::new("car_live", corners()).with_options(forced));
        assert!(matches!(
            result,
            Err(RoutingError::ProfileMismatch { ref profile, .. }) if profile == "car_live"
        ));

        let disabled = RequestOptions {
            disable_ch: true,
            ..RequestOptions::default()
        };
        let result = engine.route(
            &RouteRequest::new("car", corners())
                .with_algorithm(RoutingAlgorithm::Ch)
                .with_options(disabled.clone()),
        );
        assert!(matches!(result, Err(RoutingError::ProfileMismatch { .. })));

        let fallback = engine
            .route(&RouteRequest::new("car", corners()).with_options(disabled))
            .unwrap();
        assert_eq!(fallback.algorithm, RoutingAlgorithm::BidirectionalDijkstra);
    }

    #[test]
    fn unknown_names_are_rejected() {
        let engine = engine(config());

        let result = engine.route(&RouteRequest::new("bus", corners()));
        assert_eq!(result.unwrap_err(), RoutingError::UnknownProfile("bus".to_string()));

        let options = RequestOptions {
            weighting: Some("scenic".to_string()),
            ..RequestOptions::default()
        };
        let result = engine.route(&RouteRequest::new("car", corners()).with_options(options));
        assert_eq!(result.unwrap_err(), RoutingError::UnknownWeighting("scenic".to_string()));

        let mut config = config();
        config.profiles[0].weighting = "scenic".to_string();
        let registry = WeightingRegistry::default();
        let generation = GraphGeneration::new(1, network());
        assert!(Meridian::new(config, registry, generation).is_err());
    }

    #[test]
    fn blocked_area_forces_a_detour() {
        let engine = engine(config());
        let points = vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 0.004)];

        let direct = engine.route(&RouteRequest::new("car", points.clone())).unwrap();

        let options = RequestOptions {
            blocked_areas: vec![vec![
                GeoPoint::new(-0.0002, 0.0018),
                GeoPoint::new(-0.0002, 0.0022),
                GeoPoint::new(0.0002, 0.0022),
                GeoPoint::new(0.0002, 0.0018),
            ]],
            ..RequestOptions::default()
        };
        let detour = engine
            .route(&RouteRequest::new("car", points).with_options(options))
            .unwrap();

        assert_eq!(detour.algorithm, RoutingAlgorithm::BidirectionalDijkstra);
        assert!(detour.path.distance() > direct.path.distance());
    }

    #[test]
    fn traffic_update_slows_live_profile() {
        let engine = engine(config());
        let before = engine.route(&RouteRequest::new("car_live", corners())).unwrap();

        let mut speeds = TrafficSpeeds::new(2);
        for edge_id in 0..engine.generation().graph().edge_count() {
            speeds.set_speed(edge_id, EdgeDirection::Forward, 10.0);
            speeds.set_speed(edge_id, EdgeDirection::Backward, 10.0);
        }
        engine.update_traffic(speeds);

        let after = engine.route(&RouteRequest::new("car_live", corners())).unwrap();
        assert_eq!(engine.traffic().version(), 2);
        assert!(after.path.time() > before.path.time());

        // Profiles without live traffic keep their hierarchy and costs
        let car = engine.route(&RouteRequest::new("car", corners())).unwrap();
        assert_eq!(car.algorithm, RoutingAlgorithm::Ch);
        assert_eq!(car.path.time(), before.path.time());
    }

    #[test]
    fn swapped_generation_leaves_held_snapshot_intact() {
        let engine = engine(config());
        let held = engine.generation();

        let previous = engine.swap_generation(GraphGeneration::new(2, line_graph(3, TravelMode::Car, 50.0)));
        assert_eq!(previous.id(), 1);
        assert_eq!(held.graph().node_count(), 27);
        assert!(held.ch("car").is_some());

        let response = engine
            .route(&RouteRequest::new(
                "car",
                vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 0.002)],
            ))
            .unwrap();
        assert_eq!(response.generation, 2);
        assert_eq!(response.algorithm, RoutingAlgorithm::BidirectionalDijkstra);
        assert_eq!(response.path.edges(), vec![0, 1]);
    }

    #[test]
    fn matrix_marks_unreachable_targets() {
        let engine = engine(config());
        let targets = vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.004, 0.004),
            GeoPoint::new(0.02, 0.02),
        ];

        let ch = engine
            .matrix(&MatrixRequest::new("car", vec![GeoPoint::new(0.0, 0.0)], targets.clone()))
            .unwrap();
        assert!(ch.used_ch);
        assert_eq!(ch.matrix.weight(0, 0), 0);
        assert_eq!(ch.matrix.weight(0, 2), NO_ROUTE);

        let mut request = MatrixRequest::new("car", vec![GeoPoint::new(0.0, 0.0)], targets);
        request.options.disable_ch = true;
        let flexible = engine.matrix(&request).unwrap();
        assert!(!flexible.used_ch);
        assert_eq!(flexible.matrix.weights(), ch.matrix.weights());
    }

    #[test]
    fn request_limits_are_enforced() {
        let engine = engine(RoutingConfig {
            max_matrix_locations: 2,
            snap_radius: Some(100.0),
            ..config()
        });

        let result = engine.matrix(&MatrixRequest::new(
            "car",
            vec![GeoPoint::new(0.0, 0.0)],
            vec![GeoPoint::new(0.0, 0.0); 3],
        ));
        assert_eq!(result.unwrap_err(), RoutingError::TooManyLocations { max: 2, actual: 3 });

        let result = engine.route(&RouteRequest::new(
            "car",
            vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 1.0)],
        ));
        assert_eq!(result.unwrap_err(), RoutingError::PointNotFound { index: 1 });

        let result = engine.route(&RouteRequest::new("car", vec![GeoPoint::new(0.0, 0.0)]));
        assert!(matches!(result, Err(RoutingError::InvalidRequest(_))));
    }

    #[test]
    fn isochrone_ranges_are_bounded_by_config() {
        let engine = engine(config());
        let origin = GeoPoint::new(0.002, 0.002);

        let result = engine.isochrone(&IsochroneRequest::new(
            "car",
            origin,
            TravelRangeType::Time,
            vec![3_601.0],
        ));
        assert!(matches!(result, Err(RoutingError::InvalidRequest(_))));

        let result = engine.isochrone(&IsochroneRequest::new(
            "car",
            origin,
            TravelRangeType::Distance,
            (1..=11).map(|range| range as f64 * 10.0).collect(),
        ));
        assert!(matches!(result, Err(RoutingError::InvalidRequest(_))));

        let isochrone = engine
            .isochrone(&IsochroneRequest::new("car", origin, TravelRangeType::Time, vec![600.0]))
            .unwrap();
        // The whole grid is reachable within ten minutes, the island is not
        assert_eq!(isochrone.bands[0].nodes().len(), 25);
    }

    #[test]
    fn isochrone_starts_inside_an_edge() {
        let engine = engine(config());

        // Halfway between nodes 12 and 13, each about four seconds away
        let isochrone = engine
            .isochrone(&IsochroneRequest::new(
                "car",
                GeoPoint::new(0.002, 0.0025),
                TravelRangeType::Time,
                vec![10.0],
            ))
            .unwrap();

        let mut nodes = isochrone.bands[0].nodes().to_vec();
        nodes.sort_unstable();
        assert_eq!(nodes, vec![12, 13]);
        assert!(isochrone.bands[0].edges().is_empty());
        assert!(nodes.contains(&isochrone.source));
    }

    #[test]
    fn map_match_follows_the_trace() {
        let engine = engine(config());
        let trace = vec![
            GeoPoint::new(0.0, 0.0005),
            GeoPoint::new(0.0, 0.0015),
            GeoPoint::new(0.0, 0.0025),
        ];

        let result = engine.map_match(&MapMatchRequest::new("car", trace)).unwrap();
        assert_eq!(result.matched.len(), 3);
        assert!(result.unmatched.is_empty());
        assert_eq!(result.sequences, 1);
    }
}
