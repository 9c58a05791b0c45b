use std::sync::Arc;

use crate::{
    base_graph::BaseGraphEdge,
    constants::{MAX_DURATION, MAX_WEIGHT},
    distance::{Distance, Meters},
    edge_direction::EdgeDirection,
    graph_edge::GraphEdge,
    properties::property::{Property, TravelMode},
};

pub mod addition;
pub mod block_area;
pub mod fastest;
pub mod metric;
pub mod priority;
pub mod registry;
pub mod shortest;
pub mod traffic;

pub type Weight = u32;
pub type Milliseconds = u32;

/// Cost function of a routing profile.
///
/// `MAX_WEIGHT` marks an edge that cannot be traversed in the given direction.
/// Every other weight must be finite and weights must not decrease when a decorator
/// is applied on top of a weighting, so that searches can prune on them.
pub trait Weighting<E: GraphEdge = BaseGraphEdge>: Send + Sync {
    fn calc_edge_weight(&self, edge: &E, direction: EdgeDirection) -> Weight;
    fn calc_edge_ms(&self, edge: &E, direction: EdgeDirection) -> Milliseconds;

    /// Lower bound of the weight of any path covering `distance`
    fn min_weight(&self, distance: Distance<Meters>) -> Weight;

    fn can_access_edge(&self, edge: &E) -> bool {
        self.calc_edge_weight(edge, EdgeDirection::Forward) != MAX_WEIGHT
            || self.calc_edge_weight(edge, EdgeDirection::Backward) != MAX_WEIGHT
    }
}

impl<E: GraphEdge, W: Weighting<E> + ?Sized> Weighting<E> for &W {
    fn calc_edge_weight(&self, edge: &E, direction: EdgeDirection) -> Weight {
        (**self).calc_edge_weight(edge, direction)
    }

    fn calc_edge_ms(&self, edge: &E, direction: EdgeDirection) -> Milliseconds {
        (**self).calc_edge_ms(edge, direction)
    }

    fn min_weight(&self, distance: Distance<Meters>) -> Weight {
        (**self).min_weight(distance)
    }
}

impl<E: GraphEdge, W: Weighting<E> + ?Sized> Weighting<E> for Box<W> {
    fn calc_edge_weight(&self, edge: &E, direction: EdgeDirection) -> Weight {
        (**self).calc_edge_weight(edge, direction)
    }

    fn calc_edge_ms(&self, edge: &E, direction: EdgeDirection) -> Milliseconds {
        (**self).calc_edge_ms(edge, direction)
    }

    fn min_weight(&self, distance: Distance<Meters>) -> Weight {
        (**self).min_weight(distance)
    }
}

impl<E: GraphEdge, W: Weighting<E> + ?Sized> Weighting<E> for Arc<W> {
    fn calc_edge_weight(&self, edge: &E, direction: EdgeDirection) -> Weight {
        (**self).calc_edge_weight(edge, direction)
    }

    fn calc_edge_ms(&self, edge: &E, direction: EdgeDirection) -> Milliseconds {
        (**self).calc_edge_ms(edge, direction)
    }

    fn min_weight(&self, distance: Distance<Meters>) -> Weight {
        (**self).min_weight(distance)
    }
}

/// Speed in km/h of `edge` for `mode`, `None` when the mode has no access
pub(crate) fn edge_speed<E: GraphEdge>(
    edge: &E,
    mode: TravelMode,
    direction: EdgeDirection,
    max_speed: f32,
) -> Option<f32> {
    let properties = edge.properties();
    if !properties
        .get_bool(Property::Access(mode), direction)
        .unwrap_or(false)
    {
        return None;
    }

    let speed = properties
        .get_f32(Property::AverageSpeed(mode), direction)
        .unwrap_or(0.0)
        .min(max_speed);

    (speed > 0.0).then_some(speed)
}

pub(crate) fn travel_time_ms(distance: Distance<Meters>, speed_kmh: f32) -> f64 {
    distance.value() * 3600.0 / speed_kmh as f64
}

/// Rounds a finite cost up, so that summed edge weights never undercut a lower bound
pub(crate) fn finite_weight(value: f64) -> Weight {
    value.ceil().clamp(0.0, (MAX_WEIGHT - 1) as f64) as Weight
}

pub(crate) fn finite_duration(value: f64) -> Milliseconds {
    value.ceil().clamp(0.0, (MAX_DURATION - 1) as f64) as Milliseconds
}

pub(crate) fn lower_bound(value: f64) -> Weight {
    value.floor().clamp(0.0, (MAX_WEIGHT - 1) as f64) as Weight
}
