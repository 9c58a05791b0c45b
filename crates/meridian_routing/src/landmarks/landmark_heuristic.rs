use fxhash::FxHashMap;

use crate::{
    constants::MAX_WEIGHT,
    graph::{GeometryAccess, Graph},
    query::{query_graph::QueryGraph, virtual_access::VirtualAccess},
    routing::{astar_heuristic::AStarHeuristic, search_direction::SearchDirection},
    types::NodeId,
    weighting::{Weight, Weighting},
};

use super::landmark_storage::LandmarkStorage;

/// Weights between one landmark and a node, `None` where there is no path
#[derive(Debug, Clone, Copy, PartialEq)]
struct LandmarkWeights {
    from_landmark: Option<u64>,
    to_landmark: Option<u64>,
}

/// ALT lower bound: by the triangle inequality, for every landmark `L`
/// `d(v, t) >= d(L, t) - d(L, v)` and `d(v, t) >= d(v, L) - d(t, L)`.
///
/// Virtual nodes of a query graph get their landmark weights through the base nodes
/// their virtual edges lead to. Splitting an edge may shift its weight by rounding, so
/// the bound gives up one unit per virtual edge to stay admissible. The estimates are
/// admissible but not always consistent.
pub struct LandmarkHeuristic<'a> {
    landmarks: &'a LandmarkStorage,
    base_node_count: usize,
    virtual_weights: FxHashMap<NodeId, Vec<LandmarkWeights>>,
    slack: u64,
}

impl<'a> LandmarkHeuristic<'a> {
    /// Heuristic for searches on the base graph itself
    pub fn new(landmarks: &'a LandmarkStorage) -> Self {
        LandmarkHeuristic {
            landmarks,
            base_node_count: landmarks.metadata().base_node_count,
            virtual_weights: FxHashMap::default(),
            slack: 0,
        }
    }

    /// Heuristic for searches on `query_graph`. `weighting` must be the one the landmarks
    /// were prepared with.
    pub fn for_query_graph<W>(landmarks: &'a LandmarkStorage, query_graph: &QueryGraph, weighting: &W) -> Self
    where
        W: Weighting + ?Sized,
    {
        let mut heuristic = LandmarkHeuristic::new(landmarks);
        heuristic.slack = query_graph.virtual_edge_count() as u64;

        for node in heuristic.base_node_count..query_graph.node_count() {
            let forward = VirtualAccess::new(query_graph, weighting, node, SearchDirection::Forward);
            let backward = VirtualAccess::new(query_graph, weighting, node, SearchDirection::Backward);
            let forward_roots = forward.roots(query_graph);
            let backward_roots = backward.roots(query_graph);

            let weights = (0..landmarks.landmark_count())
                .map(|landmark| LandmarkWeights {
                    // a path from the landmark enters the node through a backward root
                    from_landmark: backward_roots
                        .iter()
                        .filter_map(|root| {
                            known(landmarks.weight_from_landmark(landmark, root.node))
                                .map(|weight| weight + root.weight as u64)
                        })
                        .min(),
                    to_landmark: forward_roots
                        .iter()
                        .filter_map(|root| {
                            known(landmarks.weight_to_landmark(landmark, root.node))
                                .map(|weight| weight + root.weight as u64)
                        })
                        .min(),
                })
                .collect();
            heuristic.virtual_weights.insert(node, weights);
        }

        heuristic
    }

    fn weights(&self, landmark: usize, node: NodeId) -> Option<LandmarkWeights> {
        if node < self.base_node_count {
            return Some(LandmarkWeights {
                from_landmark: known(self.landmarks.weight_from_landmark(landmark, node)),
                to_landmark: known(self.landmarks.weight_to_landmark(landmark, node)),
            });
        }
        self.virtual_weights
            .get(&node)
            .map(|weights| weights[landmark])
    }

    /// Largest landmark bound on the weight from `node` to `target`
    pub fn lower_bound(&self, node: NodeId, target: NodeId) -> Weight {
        if node == target {
            return 0;
        }

        let mut bound: u64 = 0;
        for landmark in 0..self.landmarks.landmark_count() {
            let (Some(node_weights), Some(target_weights)) =
                (self.weights(landmark, node), self.weights(landmark, target))
            else {
                continue;
            };

            if let (Some(to_target), Some(to_node)) =
                (target_weights.from_landmark, node_weights.from_landmark)
            {
                bound = bound.max(to_target.saturating_sub(to_node));
            }
            if let (Some(from_node), Some(from_target)) =
                (node_weights.to_landmark, target_weights.to_landmark)
            {
                bound = bound.max(from_node.saturating_sub(from_target));
            }
        }

        bound
            .saturating_sub(self.slack)
            .min(MAX_WEIGHT as u64 - 1) as Weight
    }
}

fn known(weight: Weight) -> Option<u64> {
    (weight != MAX_WEIGHT).then_some(weight as u64)
}

impl AStarHeuristic for LandmarkHeuristic<'_> {
    fn estimate<G, W>(&self, _graph: &G, _weighting: &W, node: NodeId, target: NodeId) -> Weight
    where
        G: GeometryAccess,
        W: Weighting<G::Edge> + ?Sized,
    {
        self.lower_bound(node, target)
    }
}
