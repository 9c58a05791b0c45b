use crate::{constants::MAX_WEIGHT, types::NodeId};

use super::{
    contraction_params::PriorityParams,
    preparation_graph::{ArcKind, CHPreparationGraph, PreparationArc},
    witness_search::WitnessSearch,
};

/// Shortcuts required to keep all shortest paths through `node` once it is removed.
/// An equally heavy witness suffices.
pub(crate) fn find_shortcuts(
    graph: &CHPreparationGraph,
    witness_search: &mut WitnessSearch,
    node: NodeId,
    max_settled_nodes: usize,
) -> Vec<PreparationArc> {
    let mut shortcuts = Vec::new();

    for &in_arc_id in graph.in_arcs(node) {
        let in_arc = graph.arc(in_arc_id);
        let source = in_arc.from;

        let out_arcs: Vec<_> = graph
            .out_arcs(node)
            .iter()
            .copied()
            .filter(|&out_arc_id| graph.arc(out_arc_id).to != source)
            .collect();
        if out_arcs.is_empty() {
            continue;
        }

        let targets: Vec<NodeId> = out_arcs
            .iter()
            .map(|&out_arc_id| graph.arc(out_arc_id).to)
            .collect();
        let max_weight = out_arcs
            .iter()
            .map(|&out_arc_id| in_arc.weight.saturating_add(graph.arc(out_arc_id).weight))
            .max()
            .unwrap_or(0);

        witness_search.run(
            graph,
            source,
            node,
            &targets,
            max_weight,
            max_settled_nodes,
        );

        for out_arc_id in out_arcs {
            let out_arc = graph.arc(out_arc_id);
            let via_weight = in_arc.weight.saturating_add(out_arc.weight);
            if via_weight >= MAX_WEIGHT {
                continue;
            }

            if witness_search.weight(out_arc.to) <= via_weight {
                continue;
            }

            shortcuts.push(PreparationArc {
                from: source,
                to: out_arc.to,
                weight: via_weight,
                time: in_arc.time.saturating_add(out_arc.time),
                distance: in_arc.distance + out_arc.distance,
                original_edges: in_arc.original_edges + out_arc.original_edges,
                kind: ArcKind::Shortcut {
                    first: in_arc_id,
                    second: out_arc_id,
                    via: node,
                },
            });
        }
    }

    shortcuts
}

/// Priority of contracting `node` next, lower goes first
pub(crate) fn calc_priority(
    graph: &CHPreparationGraph,
    witness_search: &mut WitnessSearch,
    node: NodeId,
    params: &PriorityParams,
    max_settled_nodes: usize,
    contracted_neighbors: usize,
    depth: usize,
) -> i64 {
    let shortcuts = find_shortcuts(graph, witness_search, node, max_settled_nodes);

    let removed_arcs = graph.degree(node) as i64;
    let removed_original_edges: usize = graph
        .out_arcs(node)
        .iter()
        .chain(graph.in_arcs(node))
        .map(|&arc_id| graph.arc(arc_id).original_edges)
        .sum();
    let added_original_edges: usize = shortcuts.iter().map(|arc| arc.original_edges).sum();

    let edge_difference = shortcuts.len() as i64 - removed_arcs;
    let original_edges_difference = added_original_edges as i64 - removed_original_edges as i64;

    params.edge_difference_coeff * edge_difference
        + params.original_edges_coeff * original_edges_difference
        + params.contracted_neighbors_coeff * contracted_neighbors as i64
        + params.hierarchy_depth_coeff * depth as i64
}
