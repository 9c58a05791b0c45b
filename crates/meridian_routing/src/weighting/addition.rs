use crate::{
    constants::MAX_WEIGHT,
    distance::{Distance, Meters},
    edge_direction::EdgeDirection,
    graph_edge::GraphEdge,
};

use super::{Milliseconds, Weight, Weighting};

/// Sum of a base weighting and additional penalty weightings.
/// Travel time comes from the base weighting only.
pub struct AdditionWeighting<W> {
    base: W,
    additions: Vec<W>,
}

impl<W> AdditionWeighting<W> {
    pub fn new(base: W, additions: Vec<W>) -> Self {
        AdditionWeighting { base, additions }
    }
}

impl<E: GraphEdge, W: Weighting<E>> Weighting<E> for AdditionWeighting<W> {
    fn calc_edge_weight(&self, edge: &E, direction: EdgeDirection) -> Weight {
        let mut total = self.base.calc_edge_weight(edge, direction);
        for addition in &self.additions {
            if total == MAX_WEIGHT {
                break;
            }
            let weight = addition.calc_edge_weight(edge, direction);
            if weight == MAX_WEIGHT {
                return MAX_WEIGHT;
            }
            total = total.saturating_add(weight).min(MAX_WEIGHT - 1);
        }
        total
    }

    fn calc_edge_ms(&self, edge: &E, direction: EdgeDirection) -> Milliseconds {
        self.base.calc_edge_ms(edge, direction)
    }

    fn min_weight(&self, distance: Distance<Meters>) -> Weight {
        self.additions
            .iter()
            .fold(self.base.min_weight(distance), |total, addition| {
                total.saturating_add(addition.min_weight(distance))
            })
            .min(MAX_WEIGHT - 1)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        base_graph::BaseGraphEdge,
        meters,
        properties::{property::TravelMode, property_map::EdgePropertyMap},
        weighting::{fastest::FastestWeighting, shortest::ShortestWeighting},
    };

    use super::*;

    #[test]
    fn sums_components() {
        let edge = BaseGraphEdge::new(
            0,
            0,
            1,
            meters!(1000),
            EdgePropertyMap::new().with_access(TravelMode::Car, 36.0, true),
        );
        let base: Arc<dyn Weighting> = Arc::new(FastestWeighting::new(TravelMode::Car));
        let shortest: Arc<dyn Weighting> = Arc::new(ShortestWeighting::new(TravelMode::Car));
        let weighting = AdditionWeighting::new(base, vec![shortest]);

        assert_eq!(weighting.calc_edge_weight(&edge, EdgeDirection::Forward), 101_000);
        assert_eq!(weighting.calc_edge_ms(&edge, EdgeDirection::Forward), 100_000);
        assert_eq!(weighting.calc_edge_weight(&edge, EdgeDirection::Backward), MAX_WEIGHT);
        assert_eq!(
            Weighting::<BaseGraphEdge>::min_weight(&weighting, meters!(1000)),
            25_714 + 1000
        );
    }
}
