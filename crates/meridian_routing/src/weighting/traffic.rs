use std::sync::Arc;

use fxhash::FxHashMap;

use crate::{
    constants::{MAX_DURATION, MAX_WEIGHT},
    distance::{Distance, Meters},
    edge_direction::EdgeDirection,
    graph_edge::GraphEdge,
    types::EdgeId,
};

use super::{Milliseconds, Weight, Weighting, finite_duration, finite_weight, travel_time_ms};

/// Live speeds keyed by base edge and direction, in km/h.
///
/// A table is never mutated once published: updates build a new table
/// that replaces the previous one as a whole.
#[derive(Debug, Default, Clone)]
pub struct TrafficSpeeds {
    version: u64,
    speeds: FxHashMap<(EdgeId, EdgeDirection), f32>,
}

impl TrafficSpeeds {
    pub fn new(version: u64) -> Self {
        TrafficSpeeds {
            version,
            speeds: FxHashMap::default(),
        }
    }

    pub fn set_speed(&mut self, edge_id: EdgeId, direction: EdgeDirection, speed_kmh: f32) {
        self.speeds.insert((edge_id, direction), speed_kmh);
    }

    pub fn speed(&self, edge_id: EdgeId, direction: EdgeDirection) -> Option<f32> {
        self.speeds.get(&(edge_id, direction)).copied()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.speeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.speeds.is_empty()
    }
}

/// Slows edges down to the speed observed in a traffic snapshot.
///
/// Traffic never makes an edge faster than the wrapped weighting, which keeps
/// its lower bounds valid. A reported speed of 0 closes the edge.
pub struct TrafficWeighting<W> {
    inner: W,
    speeds: Arc<TrafficSpeeds>,
}

impl<W> TrafficWeighting<W> {
    pub fn new(inner: W, speeds: Arc<TrafficSpeeds>) -> Self {
        TrafficWeighting { inner, speeds }
    }

    pub fn version(&self) -> u64 {
        self.speeds.version()
    }
}

impl<W> TrafficWeighting<W> {
    /// Slowdown factor (>= 1) for the edge, `None` when traffic closes it
    fn slowdown<E: GraphEdge>(&self, edge: &E, direction: EdgeDirection, inner_ms: Milliseconds) -> Option<f64> {
        let Some(speed) = self.speeds.speed(edge.id(), direction) else {
            return Some(1.0);
        };

        if speed <= 0.0 {
            return None;
        }

        if inner_ms == 0 {
            return Some(1.0);
        }

        let traffic_ms = travel_time_ms(edge.distance(), speed);
        Some((traffic_ms / inner_ms as f64).max(1.0))
    }
}

impl<E: GraphEdge, W: Weighting<E>> Weighting<E> for TrafficWeighting<W> {
    fn calc_edge_weight(&self, edge: &E, direction: EdgeDirection) -> Weight {
        let weight = self.inner.calc_edge_weight(edge, direction);
        if weight == MAX_WEIGHT {
            return MAX_WEIGHT;
        }

        let inner_ms = self.inner.calc_edge_ms(edge, direction);
        match self.slowdown(edge, direction, inner_ms) {
            Some(factor) if factor > 1.0 => finite_weight(weight as f64 * factor),
            Some(_) => weight,
            None => MAX_WEIGHT,
        }
    }

    fn calc_edge_ms(&self, edge: &E, direction: EdgeDirection) -> Milliseconds {
        let ms = self.inner.calc_edge_ms(edge, direction);
        if ms == MAX_DURATION {
            return MAX_DURATION;
        }

        match self.slowdown(edge, direction, ms) {
            Some(factor) if factor > 1.0 => finite_duration(ms as f64 * factor),
            Some(_) => ms,
            None => MAX_DURATION,
        }
    }

    fn min_weight(&self, distance: Distance<Meters>) -> Weight {
        self.inner.min_weight(distance)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        base_graph::BaseGraphEdge,
        meters,
        properties::{property::TravelMode, property_map::EdgePropertyMap},
        weighting::fastest::FastestWeighting,
    };

    use super::*;

    fn edge() -> BaseGraphEdge {
        BaseGraphEdge::new(
            3,
            0,
            1,
            meters!(1000),
            EdgePropertyMap::new().with_access(TravelMode::Car, 72.0, false),
        )
    }

    #[test]
    fn slower_traffic_increases_weight_and_time() {
        let mut speeds = TrafficSpeeds::new(1);
        speeds.set_speed(3, EdgeDirection::Forward, 36.0);
        let weighting = TrafficWeighting::new(FastestWeighting::new(TravelMode::Car), Arc::new(speeds));

        assert_eq!(weighting.calc_edge_ms(&edge(), EdgeDirection::Forward), 100_000);
        assert_eq!(weighting.calc_edge_weight(&edge(), EdgeDirection::Forward), 100_000);
        // No traffic reported backwards
        assert_eq!(weighting.calc_edge_ms(&edge(), EdgeDirection::Backward), 50_000);
    }

    #[test]
    fn faster_traffic_is_ignored() {
        let mut speeds = TrafficSpeeds::new(1);
        speeds.set_speed(3, EdgeDirection::Forward, 130.0);
        let weighting = TrafficWeighting::new(FastestWeighting::new(TravelMode::Car), Arc::new(speeds));

        assert_eq!(weighting.calc_edge_weight(&edge(), EdgeDirection::Forward), 50_000);
    }

    #[test]
    fn zero_speed_closes_the_edge() {
        let mut speeds = TrafficSpeeds::new(2);
        speeds.set_speed(3, EdgeDirection::Backward, 0.0);
        let weighting = TrafficWeighting::new(FastestWeighting::new(TravelMode::Car), Arc::new(speeds));

        assert_eq!(weighting.calc_edge_weight(&edge(), EdgeDirection::Backward), MAX_WEIGHT);
        assert_eq!(weighting.calc_edge_ms(&edge(), EdgeDirection::Backward), MAX_DURATION);
        assert_eq!(weighting.version(), 2);
    }
}
