use std::time::Instant;

use fxhash::FxHashMap;
use tracing::{debug, info};

use crate::{
    base_graph::{BaseGraph, BaseGraphEdge},
    edge_direction::EdgeDirection,
    error::PreparationError,
    graph::Graph,
    graph_edge::GraphEdge,
    stopwatch::Stopwatch,
    types::{EdgeId, NodeId},
    weighting::Weighting,
};

use super::{
    ch_edge::CHBaseEdge,
    ch_storage::{CHMetadata, CHStorage},
    contraction_params::ContractionParams,
    node_contractor,
    preparation_graph::{ArcId, ArcKind, CHPreparationGraph},
    priority_queue::PriorityQueue,
    shortcut::Shortcut,
    witness_search::WitnessSearch,
};

struct ContractionState {
    preparation_graph: CHPreparationGraph,
    witness_search: WitnessSearch,
    storage: CHStorage,
    /// Hierarchy edge written for each shortcut arc
    arc_edge_ids: FxHashMap<ArcId, EdgeId>,
    rank: usize,
}

pub struct CHGraphBuilder<'a> {
    base_graph: &'a BaseGraph,
    params: ContractionParams,
    build_stopwatch: Stopwatch,
    priority_stopwatch: Stopwatch,
    contract_node_stopwatch: Stopwatch,
    contracted_nodes: usize,
    shortcut_arcs: usize,
}

impl<'a> CHGraphBuilder<'a> {
    pub fn new(base_graph: &'a BaseGraph, params: ContractionParams) -> Self {
        CHGraphBuilder {
            base_graph,
            params,
            build_stopwatch: Stopwatch::new("build_ch_graph"),
            priority_stopwatch: Stopwatch::new("calc_priority"),
            contract_node_stopwatch: Stopwatch::new("contract_node"),
            contracted_nodes: 0,
            shortcut_arcs: 0,
        }
    }

    fn max_shortcut_arcs(&self) -> usize {
        (self.params.max_shortcut_ratio * self.base_graph.edge_count().max(1) as f64) as usize
    }

    fn init<W>(&mut self, weighting: &W, metadata: CHMetadata) -> ContractionState
    where
        W: Weighting<BaseGraphEdge> + ?Sized,
    {
        self.build_stopwatch.start();
        self.contracted_nodes = 0;
        self.shortcut_arcs = 0;

        let mut storage = CHStorage::new(metadata);
        for edge_id in 0..self.base_graph.edge_count() {
            let edge = self.base_graph.edge(edge_id);
            storage.add_base_edge(CHBaseEdge {
                base_edge: edge_id,
                start: edge.start_node(),
                end: edge.end_node(),
                distance: edge.distance(),
                forward_time: weighting.calc_edge_ms(edge, EdgeDirection::Forward),
                backward_time: weighting.calc_edge_ms(edge, EdgeDirection::Backward),
                forward_weight: weighting.calc_edge_weight(edge, EdgeDirection::Forward),
                backward_weight: weighting.calc_edge_weight(edge, EdgeDirection::Backward),
            });
        }

        info!(
            nodes = self.base_graph.node_count(),
            edges = self.base_graph.edge_count(),
            "Start CH contraction"
        );

        ContractionState {
            preparation_graph: CHPreparationGraph::new(self.base_graph, weighting),
            witness_search: WitnessSearch::new(),
            storage,
            arc_edge_ids: FxHashMap::default(),
            rank: 0,
        }
    }

    fn finish(&mut self, state: ContractionState) -> Result<CHStorage, PreparationError> {
        self.build_stopwatch.stop();
        self.report_timings();

        state
            .storage
            .check()
            .map_err(|err| PreparationError::Validation(err.to_string()))?;

        info!(
            shortcuts = state.storage.shortcut_count(),
            base_edges = self.base_graph.edge_count(),
            duration = ?self.build_stopwatch.total_duration(),
            "Finished contraction"
        );

        Ok(state.storage)
    }

    /// Contracts nodes by lazily updated priority
    pub fn build<W>(&mut self, weighting: &W, metadata: CHMetadata) -> Result<CHStorage, PreparationError>
    where
        W: Weighting<BaseGraphEdge> + ?Sized,
    {
        let mut state = self.init(weighting, metadata);
        let node_count = self.base_graph.node_count();
        let priority_params = self.params.priority;
        let priority_limit = self.params.priority_witness_search_limit;

        let mut queue: PriorityQueue<i64> = PriorityQueue::new(node_count);
        let mut contracted_neighbors = vec![0usize; node_count];
        let mut depths = vec![0usize; node_count];

        for node in 0..node_count {
            let priority = node_contractor::calc_priority(
                &state.preparation_graph,
                &mut state.witness_search,
                node,
                &priority_params,
                priority_limit,
                0,
                0,
            );
            queue
                .push(node, priority)
                .map_err(|err| PreparationError::Validation(err.to_string()))?;
        }

        debug!("Computed initial priority of every node");

        let mut last_report = Instant::now();

        while let Some((node, _)) = queue.pop() {
            // Lazy update: the stored priority may be stale
            if let Some(&(_, least_priority)) = queue.peek() {
                self.priority_stopwatch.start();
                let recomputed = node_contractor::calc_priority(
                    &state.preparation_graph,
                    &mut state.witness_search,
                    node,
                    &priority_params,
                    priority_limit,
                    contracted_neighbors[node],
                    depths[node],
                );
                self.priority_stopwatch.stop();

                if recomputed > least_priority {
                    queue
                        .push(node, recomputed)
                        .map_err(|err| PreparationError::Validation(err.to_string()))?;
                    continue;
                }
            }

            let neighbors = self.contract(&mut state, node)?;

            for &neighbor in &neighbors {
                contracted_neighbors[neighbor] += 1;
                depths[neighbor] = depths[neighbor].max(depths[node] + 1);
            }

            let max_updates = self.params.max_neighbor_updates.unwrap_or(usize::MAX);
            self.priority_stopwatch.start();
            for &neighbor in neighbors.iter().take(max_updates) {
                let priority = node_contractor::calc_priority(
                    &state.preparation_graph,
                    &mut state.witness_search,
                    neighbor,
                    &priority_params,
                    priority_limit,
                    contracted_neighbors[neighbor],
                    depths[neighbor],
                );
                queue.update_priority(neighbor, priority);
            }
            self.priority_stopwatch.stop();

            if last_report.elapsed().as_secs() >= 3 {
                debug!(
                    contracted = self.contracted_nodes,
                    remaining = queue.len(),
                    shortcuts = self.shortcut_arcs,
                    "Contraction progress"
                );
                last_report = Instant::now();
            }
        }

        self.finish(state)
    }

    /// Contracts nodes in the given order, which must list every node exactly once
    pub fn build_with_node_order<W>(
        &mut self,
        weighting: &W,
        metadata: CHMetadata,
        order: &[NodeId],
    ) -> Result<CHStorage, PreparationError>
    where
        W: Weighting<BaseGraphEdge> + ?Sized,
    {
        let node_count = self.base_graph.node_count();
        let mut seen = vec![false; node_count];
        let is_permutation = order.len() == node_count
            && order
                .iter()
                .all(|&node| node < node_count && !std::mem::replace(&mut seen[node], true));
        if !is_permutation {
            return Err(PreparationError::Validation(format!(
                "node order must list each of the {} nodes once",
                node_count
            )));
        }

        let mut state = self.init(weighting, metadata);
        for &node in order {
            self.contract(&mut state, node)?;
        }

        self.finish(state)
    }

    /// Writes the arcs of `node`, adds its shortcuts and removes it. Returns its neighbors.
    fn contract(&mut self, state: &mut ContractionState, node: NodeId) -> Result<Vec<NodeId>, PreparationError> {
        self.contract_node_stopwatch.start();

        let neighbors = state.preparation_graph.neighbors(node);

        write_shortcuts(state, node)?;
        state.storage.set_node_rank(node, state.rank);
        state.rank += 1;

        let shortcuts = node_contractor::find_shortcuts(
            &state.preparation_graph,
            &mut state.witness_search,
            node,
            self.params.witness_search_limit,
        );
        for shortcut in shortcuts {
            if state.preparation_graph.add_arc(shortcut).is_some() {
                self.shortcut_arcs += 1;
            }
        }

        let max_shortcut_arcs = self.max_shortcut_arcs();
        if self.shortcut_arcs > max_shortcut_arcs {
            return Err(PreparationError::ShortcutLimitExceeded {
                shortcuts: self.shortcut_arcs,
                max_shortcuts: max_shortcut_arcs,
            });
        }

        state.preparation_graph.disconnect_node(node);
        self.contracted_nodes += 1;
        self.contract_node_stopwatch.stop();

        Ok(neighbors)
    }

    fn report_timings(&self) {
        info!(
            contracted = self.contracted_nodes,
            shortcut_arcs = self.shortcut_arcs,
            "CH preparation timings"
        );
        self.priority_stopwatch.report();
        self.contract_node_stopwatch.report();
    }
}

fn arc_edge_id(state: &ContractionState, arc_id: ArcId) -> Option<EdgeId> {
    match state.preparation_graph.arc(arc_id).kind {
        ArcKind::Base { base_edge } => Some(base_edge),
        ArcKind::Shortcut { .. } => state.arc_edge_ids.get(&arc_id).copied(),
    }
}

/// Skipped hierarchy edges of a shortcut arc
fn skipped_edges(state: &ContractionState, arc_id: ArcId) -> Result<(EdgeId, EdgeId, NodeId), PreparationError> {
    let ArcKind::Shortcut { first, second, via } = state.preparation_graph.arc(arc_id).kind else {
        return Err(PreparationError::Validation(format!("arc {} is not a shortcut", arc_id)));
    };

    match (arc_edge_id(state, first), arc_edge_id(state, second)) {
        (Some(first), Some(second)) => Ok((first, second, via)),
        _ => Err(PreparationError::Validation(format!(
            "shortcut arc {} skips arcs that were never written",
            arc_id
        ))),
    }
}

/// Writes the shortcut arcs still attached to `node`, merging opposite arcs that skip
/// the same edges with the same costs into one bidirectional shortcut
fn write_shortcuts(state: &mut ContractionState, node: NodeId) -> Result<(), PreparationError> {
    let graph = &state.preparation_graph;
    let is_shortcut = |arc_id: &ArcId| matches!(graph.arc(*arc_id).kind, ArcKind::Shortcut { .. });

    let out_arcs: Vec<ArcId> = graph.out_arcs(node).iter().copied().filter(is_shortcut).collect();
    let mut in_arcs: Vec<ArcId> = graph.in_arcs(node).iter().copied().filter(is_shortcut).collect();

    for out_arc_id in out_arcs {
        let (first, second, via) = skipped_edges(state, out_arc_id)?;
        let out_arc = *state.preparation_graph.arc(out_arc_id);

        let mut reverse = None;
        for (index, &in_arc_id) in in_arcs.iter().enumerate() {
            let in_arc = state.preparation_graph.arc(in_arc_id);
            if in_arc.from != out_arc.to
                || in_arc.weight != out_arc.weight
                || in_arc.time != out_arc.time
                || in_arc.distance != out_arc.distance
            {
                continue;
            }
            if skipped_edges(state, in_arc_id)? == (second, first, via) {
                reverse = Some(index);
                break;
            }
        }
        let reverse_arc_id = reverse.map(|index| in_arcs.swap_remove(index));

        let edge_id = state.storage.add_shortcut(Shortcut {
            start: node,
            end: out_arc.to,
            via,
            weight: out_arc.weight,
            time: out_arc.time,
            distance: out_arc.distance,
            first,
            second,
            bidirectional: reverse_arc_id.is_some(),
        });

        state.arc_edge_ids.insert(out_arc_id, edge_id);
        if let Some(reverse_arc_id) = reverse_arc_id {
            state.arc_edge_ids.insert(reverse_arc_id, edge_id);
        }
    }

    for in_arc_id in in_arcs {
        let (first, second, via) = skipped_edges(state, in_arc_id)?;
        let in_arc = *state.preparation_graph.arc(in_arc_id);

        let edge_id = state.storage.add_shortcut(Shortcut {
            start: in_arc.from,
            end: node,
            via,
            weight: in_arc.weight,
            time: in_arc.time,
            distance: in_arc.distance,
            first,
            second,
            bidirectional: false,
        });
        state.arc_edge_ids.insert(in_arc_id, edge_id);
    }

    Ok(())
}
