use crate::{
    constants::MAX_WEIGHT,
    distance::{Distance, Meters},
    edge_direction::EdgeDirection,
    graph_edge::GraphEdge,
    properties::property::{Property, TravelMode},
};

use super::{
    Milliseconds, Weight, Weighting, fastest::FastestWeighting, finite_weight, lower_bound,
};

pub const PRIORITY_EXCLUDE: u8 = 0;
pub const PRIORITY_UNCHANGED: u8 = 4;
pub const PRIORITY_BEST: u8 = 7;

/// Fastest weighting scaled down on preferred ways and up on ways to avoid.
/// A priority of 0 excludes the edge.
pub struct PriorityWeighting {
    mode: TravelMode,
    fastest: FastestWeighting,
}

impl PriorityWeighting {
    pub fn new(mode: TravelMode) -> Self {
        PriorityWeighting {
            mode,
            fastest: FastestWeighting::new(mode),
        }
    }

    pub fn with_fastest(mode: TravelMode, fastest: FastestWeighting) -> Self {
        PriorityWeighting { mode, fastest }
    }

    fn factor(priority: u8) -> f64 {
        1.0 / (0.5 + priority.min(PRIORITY_BEST) as f64 / PRIORITY_BEST as f64)
    }
}

impl<E: GraphEdge> Weighting<E> for PriorityWeighting {
    fn calc_edge_weight(&self, edge: &E, direction: EdgeDirection) -> Weight {
        let priority = edge
            .properties()
            .get_u8(Property::Priority(self.mode), direction)
            .unwrap_or(PRIORITY_UNCHANGED);

        if priority == PRIORITY_EXCLUDE {
            return MAX_WEIGHT;
        }

        match self.fastest.exact_weight(edge, direction) {
            Some(weight) => finite_weight(weight * Self::factor(priority)),
            None => MAX_WEIGHT,
        }
    }

    fn calc_edge_ms(&self, edge: &E, direction: EdgeDirection) -> Milliseconds {
        self.fastest.calc_edge_ms(edge, direction)
    }

    fn min_weight(&self, distance: Distance<Meters>) -> Weight {
        lower_bound(self.fastest.exact_min_weight(distance) * Self::factor(PRIORITY_BEST))
    }
}
