use crate::{
    graph::GeometryAccess,
    types::NodeId,
    weighting::{Weight, Weighting},
};

pub trait AStarHeuristic {
    fn estimate<G, W>(&self, graph: &G, weighting: &W, node: NodeId, target: NodeId) -> Weight
    where
        G: GeometryAccess,
        W: Weighting<G::Edge> + ?Sized;
}

/// Turns A* into plain Dijkstra
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroHeuristic;

impl AStarHeuristic for ZeroHeuristic {
    #[inline(always)]
    fn estimate<G, W>(&self, _graph: &G, _weighting: &W, _node: NodeId, _target: NodeId) -> Weight
    where
        G: GeometryAccess,
        W: Weighting<G::Edge> + ?Sized,
    {
        0
    }
}

/// Weighting lower bound of the great circle distance to the target.
/// Only admissible on graphs whose edges are at least as long as the straight line
/// between their endpoints.
#[derive(Debug, Clone, Copy, Default)]
pub struct BeelineHeuristic;

impl AStarHeuristic for BeelineHeuristic {
    fn estimate<G, W>(&self, graph: &G, weighting: &W, node: NodeId, target: NodeId) -> Weight
    where
        G: GeometryAccess,
        W: Weighting<G::Edge> + ?Sized,
    {
        let distance = graph
            .node_geometry(node)
            .haversine_distance(graph.node_geometry(target));
        weighting.min_weight(distance)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        graph::Graph,
        properties::property::TravelMode,
        test_graph_utils::test_graph::line_graph,
        weighting::{fastest::FastestWeighting, shortest::ShortestWeighting},
    };

    use super::*;

    #[test]
    fn beeline_never_overestimates_an_edge() {
        let graph = line_graph(4, TravelMode::Car, 140.0);
        let weighting = FastestWeighting::new(TravelMode::Car);

        let estimate = BeelineHeuristic.estimate(&graph, &weighting, 0, 3);
        let actual: Weight = (0..3)
            .map(|edge_id| {
                weighting.calc_edge_weight(graph.edge(edge_id), crate::edge_direction::EdgeDirection::Forward)
            })
            .sum();

        assert!(estimate > 0);
        assert!(estimate <= actual);
    }

    #[test]
    fn zero_heuristic() {
        let graph = line_graph(2, TravelMode::Foot, 5.0);
        assert_eq!(
            ZeroHeuristic.estimate(&graph, &ShortestWeighting::new(TravelMode::Foot), 0, 1),
            0
        );
    }
}
