pub mod hmm;
pub mod map_match_request;
pub mod viterbi;

use tracing::{debug, warn};

use crate::{
    base_graph::{BaseGraph, BaseGraphEdge},
    config::MapMatchingConfig,
    distance::{Distance, Meters},
    error::RoutingError,
    geopoint::GeoPoint,
    location_index::LocationIndex,
    query::query_graph::QueryGraph,
    routing::{
        astar::Dijkstra,
        dijkstra_search::DijkstraSearch,
        routing_path::{RoutingPath, RoutingPathLeg},
        routing_path_builder::build_routing_path_leg,
        search_budget::SearchBudget,
        shortest_path_algorithm::{CalcPathOptions, ShortestPathAlgorithm},
    },
    snap::Snap,
    types::{EdgeId, NodeId},
    weighting::Weighting,
};

use self::{hmm::HmmProbabilities, viterbi::Viterbi};

#[derive(Debug, Clone)]
pub struct MatchedObservation {
    /// Position of the observation in the trace
    pub index: usize,
    pub edge_id: EdgeId,
    pub point: GeoPoint,
    pub distance: Distance<Meters>,
}

#[derive(Debug)]
pub struct MapMatchResult {
    pub matched: Vec<MatchedObservation>,
    /// Observations without any candidate edge within the search radius
    pub unmatched: Vec<usize>,
    /// Traversed base edges including the ones connecting matched observations
    pub edges: Vec<EdgeId>,
    /// One leg per pair of consecutive matched observations of a sequence
    pub path: RoutingPath,
    /// Number of independently decoded sequences, greater than one when the trace breaks
    pub sequences: usize,
}

struct Candidate {
    snap: Snap,
    node: NodeId,
}

struct Step {
    index: usize,
    point: GeoPoint,
    candidates: Vec<Candidate>,
}

/// Hidden Markov model map matcher: candidates from the location index, emissions from
/// the snap distance, transitions from shortest path lengths between candidates.
pub struct MapMatcher<'a, W: ?Sized> {
    graph: &'a BaseGraph,
    index: &'a LocationIndex,
    weighting: &'a W,
    probabilities: HmmProbabilities,
    search_radius: f64,
    max_candidates: usize,
}

impl<'a, W> MapMatcher<'a, W>
where
    W: Weighting<BaseGraphEdge> + ?Sized,
{
    pub fn new(graph: &'a BaseGraph, index: &'a LocationIndex, weighting: &'a W, config: &MapMatchingConfig) -> Self {
        MapMatcher {
            graph,
            index,
            weighting,
            probabilities: HmmProbabilities::new(config.sigma_z, config.beta),
            search_radius: config.search_radius,
            max_candidates: config.max_candidates,
        }
    }

    pub fn match_trace(&self, observations: &[GeoPoint], options: &CalcPathOptions) -> Result<MapMatchResult, RoutingError> {
        if observations.is_empty() {
            return Err(RoutingError::InvalidRequest("the trace has no observations".to_string()));
        }

        let mut snaps: Vec<Snap> = Vec::new();
        let mut candidate_counts: Vec<usize> = Vec::with_capacity(observations.len());
        for observation in observations {
            let candidates = self.index.k_nearest(
                self.graph,
                self.weighting,
                observation,
                self.max_candidates,
                self.search_radius,
            );
            candidate_counts.push(candidates.len());
            snaps.extend(candidates);
        }

        let query_graph = QueryGraph::from_base_graph(self.graph, &mut snaps);

        let mut snaps = snaps.into_iter();
        let mut steps: Vec<Step> = Vec::new();
        let mut unmatched: Vec<usize> = Vec::new();
        for (index, (&count, observation)) in candidate_counts.iter().zip(observations).enumerate() {
            let candidates: Vec<Candidate> = snaps
                .by_ref()
                .take(count)
                .filter_map(|snap| snap.closest_node().map(|node| Candidate { snap, node }))
                .collect();

            if candidates.is_empty() {
                unmatched.push(index);
            } else {
                steps.push(Step {
                    index,
                    point: *observation,
                    candidates,
                });
            }
        }

        let sequences = self.decode(&query_graph, &steps, options)?;

        let mut matched: Vec<MatchedObservation> = Vec::with_capacity(steps.len());
        let mut legs: Vec<RoutingPathLeg> = Vec::new();
        let mut edges: Vec<EdgeId> = Vec::new();
        for sequence in &sequences {
            let mut previous: Option<&Candidate> = None;
            for &(step_index, candidate_index) in sequence {
                let step = &steps[step_index];
                let candidate = &step.candidates[candidate_index];
                matched.push(MatchedObservation {
                    index: step.index,
                    edge_id: candidate.snap.edge_id,
                    point: candidate.snap.coordinates,
                    distance: candidate.snap.distance(),
                });

                match previous {
                    None => push_edge(&mut edges, candidate.snap.edge_id),
                    Some(from) => {
                        let result = Dijkstra::new(&query_graph, self.weighting).calc_path(from.node, candidate.node, options)?;
                        let leg = build_routing_path_leg(&query_graph, &result.path);
                        if leg.edges().is_empty() {
                            push_edge(&mut edges, candidate.snap.edge_id);
                        }
                        for &edge_id in leg.edges() {
                            push_edge(&mut edges, edge_id);
                        }
                        legs.push(leg);
                    }
                }
                previous = Some(candidate);
            }
        }

        if sequences.len() > 1 {
            warn!(sequences = sequences.len(), "trace matched in disconnected sequences");
        }
        debug!(
            observations = observations.len(),
            matched = matched.len(),
            unmatched = unmatched.len(),
            "trace matched"
        );

        Ok(MapMatchResult {
            matched,
            unmatched,
            edges,
            path: RoutingPath::new(legs),
            sequences: sequences.len(),
        })
    }

    /// Most likely candidate of each step as (step, candidate) pairs, split into a new
    /// sequence wherever no candidate of a step is reachable from the previous one
    fn decode(
        &self,
        query_graph: &QueryGraph,
        steps: &[Step],
        options: &CalcPathOptions,
    ) -> Result<Vec<Vec<(usize, usize)>>, RoutingError> {
        let mut sequences: Vec<Vec<(usize, usize)>> = Vec::new();
        let mut viterbi = Viterbi::new();
        let mut first_step = 0;

        for (step_index, step) in steps.iter().enumerate() {
            let emissions: Vec<f64> = step
                .candidates
                .iter()
                .map(|candidate| self.probabilities.emission_log_probability(candidate.snap.distance().value()))
                .collect();

            if viterbi.is_empty() {
                viterbi.start(&emissions);
                continue;
            }

            let previous = &steps[step_index - 1];
            let transitions = self.transitions(query_graph, previous, step, options)?;
            if !viterbi.next_step(&emissions, |from, to| transitions[from][to]) {
                sequences.push(Self::sequence(&viterbi, first_step));
                first_step = step_index;
                viterbi.start(&emissions);
            }
        }

        if !viterbi.is_empty() {
            sequences.push(Self::sequence(&viterbi, first_step));
        }

        Ok(sequences)
    }

    fn sequence(viterbi: &Viterbi, first_step: usize) -> Vec<(usize, usize)> {
        viterbi
            .most_likely_sequence()
            .into_iter()
            .enumerate()
            .map(|(offset, candidate)| (first_step + offset, candidate))
            .collect()
    }

    /// Transition log probabilities, indexed by previous then current candidate
    fn transitions(
        &self,
        query_graph: &QueryGraph,
        previous: &Step,
        current: &Step,
        options: &CalcPathOptions,
    ) -> Result<Vec<Vec<f64>>, RoutingError> {
        let linear_distance = previous.point.haversine_distance(&current.point).value();
        let targets: Vec<NodeId> = current.candidates.iter().map(|candidate| candidate.node).collect();
        let mut search = DijkstraSearch::new(query_graph, self.weighting);

        previous
            .candidates
            .iter()
            .map(|candidate| {
                let mut budget = SearchBudget::from_options(options);
                let labels = search.calc_one_to_many(candidate.node, &targets, &mut budget)?;
                Ok(labels
                    .into_iter()
                    .map(|label| match label {
                        Some(entry) => self
                            .probabilities
                            .transition_log_probability(entry.distance.value(), linear_distance),
                        None => f64::NEG_INFINITY,
                    })
                    .collect())
            })
            .collect()
    }
}

fn push_edge(edges: &mut Vec<EdgeId>, edge_id: EdgeId) {
    if edges.last() != Some(&edge_id) {
        edges.push(edge_id);
    }
}
