use serde::Deserialize;

use crate::{
    constants::MAX_WEIGHT,
    distance::{Distance, Meters},
    edge_direction::EdgeDirection,
    graph_edge::GraphEdge,
};

use super::{Milliseconds, Weight, Weighting, finite_weight, lower_bound};

/// Quantity accumulated by cost bounded searches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostMetric {
    /// Milliseconds
    Time,
    /// Meters, rounded up per edge
    Distance,
}

/// Orders a search by travel time or by distance while keeping the
/// access rules of the wrapped profile weighting.
pub struct MetricWeighting<W> {
    inner: W,
    metric: CostMetric,
}

impl<W> MetricWeighting<W> {
    pub fn new(inner: W, metric: CostMetric) -> Self {
        MetricWeighting { inner, metric }
    }
}

impl<E: GraphEdge, W: Weighting<E>> Weighting<E> for MetricWeighting<W> {
    fn calc_edge_weight(&self, edge: &E, direction: EdgeDirection) -> Weight {
        if self.inner.calc_edge_weight(edge, direction) == MAX_WEIGHT {
            return MAX_WEIGHT;
        }

        match self.metric {
            CostMetric::Time => self.inner.calc_edge_ms(edge, direction),
            CostMetric::Distance => finite_weight(edge.distance().value()),
        }
    }

    fn calc_edge_ms(&self, edge: &E, direction: EdgeDirection) -> Milliseconds {
        self.inner.calc_edge_ms(edge, direction)
    }

    fn min_weight(&self, distance: Distance<Meters>) -> Weight {
        match self.metric {
            CostMetric::Time => 0,
            CostMetric::Distance => lower_bound(distance.value()),
        }
    }
}
