use crate::{
    distance::{Distance, Meters},
    edge_direction::EdgeDirection,
    weighting::{Milliseconds, Weight, Weighting},
};

use super::ch_edge::CHEdge;

/// Reads the weights baked into hierarchy edges
#[derive(Debug, Clone, Copy, Default)]
pub struct CHWeighting;

impl Weighting<CHEdge> for CHWeighting {
    #[inline(always)]
    fn calc_edge_weight(&self, edge: &CHEdge, direction: EdgeDirection) -> Weight {
        edge.weight(direction)
    }

    #[inline(always)]
    fn calc_edge_ms(&self, edge: &CHEdge, direction: EdgeDirection) -> Milliseconds {
        edge.time(direction)
    }

    fn min_weight(&self, _distance: Distance<Meters>) -> Weight {
        0
    }
}
