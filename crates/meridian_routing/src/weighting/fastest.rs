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

/// Weight is the travel time in milliseconds plus an optional cost per meter
pub struct FastestWeighting {
    mode: TravelMode,
    max_speed: f32,
    distance_influence: f64,
}

impl FastestWeighting {
    pub fn new(mode: TravelMode) -> Self {
        FastestWeighting {
            mode,
            max_speed: mode.max_speed(),
            distance_influence: 0.0,
        }
    }

    /// Caps edge speeds, in km/h
    pub fn with_max_speed(mut self, max_speed: f32) -> Self {
        self.max_speed = max_speed.min(self.mode.max_speed());
        self
    }

    /// Extra weight per meter, in weight units (milliseconds)
    pub fn with_distance_influence(mut self, distance_influence: f64) -> Self {
        self.distance_influence = distance_influence.max(0.0);
        self
    }

    pub(crate) fn exact_weight<E: GraphEdge>(&self, edge: &E, direction: EdgeDirection) -> Option<f64> {
        let speed = edge_speed(edge, self.mode, direction, self.max_speed)?;
        let distance = edge.distance();
        Some(travel_time_ms(distance, speed) + distance.value() * self.distance_influence)
    }

    pub(crate) fn exact_min_weight(&self, distance: Distance<Meters>) -> f64 {
        travel_time_ms(distance, self.max_speed) + distance.value() * self.distance_influence
    }
}

impl<E: GraphEdge> Weighting<E> for FastestWeighting {
    fn calc_edge_weight(&self, edge: &E, direction: EdgeDirection) -> Weight {
        match self.exact_weight(edge, direction) {
            Some(weight) => finite_weight(weight),
            None => MAX_WEIGHT,
        }
    }

    fn calc_edge_ms(&self, edge: &E, direction: EdgeDirection) -> Milliseconds {
        match edge_speed(edge, self.mode, direction, self.max_speed) {
            Some(speed) => finite_duration(travel_time_ms(edge.distance(), speed)),
            None => MAX_DURATION,
        }
    }

    fn min_weight(&self, distance: Distance<Meters>) -> Weight {
        lower_bound(self.exact_min_weight(distance))
    }
}
