use crate::{
    constants::{MAX_DURATION, MAX_WEIGHT},
    distance::{Distance, Meters},
    edge_direction::EdgeDirection,
    graph_edge::GraphEdge,
    properties::property::TravelMode,
};

use super::{
    Milliseconds, Weight, Weighting, edge_speed, finite_duration, finite_weight, lower_bound,
    travel_time_ms,
};

/// Weight is the length of the edge in meters
pub struct ShortestWeighting {
    mode: TravelMode,
}

impl ShortestWeighting {
    pub fn new(mode: TravelMode) -> Self {
        ShortestWeighting { mode }
    }
}

impl<E: GraphEdge> Weighting<E> for ShortestWeighting {
    fn calc_edge_weight(&self, edge: &E, direction: EdgeDirection) -> Weight {
        match edge_speed(edge, self.mode, direction, self.mode.max_speed()) {
            Some(_) => finite_weight(edge.distance().value()),
            None => MAX_WEIGHT,
        }
    }

    fn calc_edge_ms(&self, edge: &E, direction: EdgeDirection) -> Milliseconds {
        match edge_speed(edge, self.mode, direction, self.mode.max_speed()) {
            Some(speed) => finite_duration(travel_time_ms(edge.distance(), speed)),
            None => MAX_DURATION,
        }
    }

    fn min_weight(&self, distance: Distance<Meters>) -> Weight {
        lower_bound(distance.value())
    }
}
