use serde::Deserialize;

use crate::geopoint::GeoPoint;

/// Search algorithm of a route request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingAlgorithm {
    Dijkstra,
    Astar,
    BidirectionalDijkstra,
    /// Prepared hierarchy of the profile
    Ch,
    /// A* guided by the prepared landmarks of the profile
    Alt,
}

impl RoutingAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            RoutingAlgorithm::Dijkstra => "dijkstra",
            RoutingAlgorithm::Astar => "astar",
            RoutingAlgorithm::BidirectionalDijkstra => "bidirectional_dijkstra",
            RoutingAlgorithm::Ch => "ch",
            RoutingAlgorithm::Alt => "alt",
        }
    }
}

/// Request options shared by every entry point of the engine
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RequestOptions {
    /// Weighting name replacing the one of the profile
    pub weighting: Option<String>,
    /// Lowers the configured node visit limit
    pub max_visited_nodes: Option<usize>,
    /// Never use a prepared hierarchy
    pub disable_ch: bool,
    /// Fail with a profile mismatch instead of falling back to a flexible search
    pub force_ch: bool,
    /// Rings of polygons the route must not cross
    pub blocked_areas: Vec<Vec<GeoPoint>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteRequest {
    pub profile: String,
    /// Start, optional via points and destination
    pub points: Vec<GeoPoint>,
    #[serde(default)]
    pub algorithm: Option<RoutingAlgorithm>,
    #[serde(default)]
    pub include_debug_info: bool,
    #[serde(default)]
    pub options: RequestOptions,
}

impl RouteRequest {
    pub fn new(profile: &str, points: Vec<GeoPoint>) -> Self {
        RouteRequest {
            profile: profile.to_string(),
            points,
            algorithm: None,
            include_debug_info: false,
            options: RequestOptions::default(),
        }
    }

    pub fn with_algorithm(mut self, algorithm: RoutingAlgorithm) -> Self {
        self.algorithm = Some(algorithm);
        self
    }

    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }
}
