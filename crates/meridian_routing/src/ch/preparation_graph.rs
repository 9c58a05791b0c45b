use crate::{
    base_graph::{BaseGraph, BaseGraphEdge},
    constants::MAX_WEIGHT,
    distance::{Distance, Meters},
    edge_direction::EdgeDirection,
    graph::Graph,
    graph_edge::GraphEdge,
    types::{EdgeId, NodeId},
    weighting::{Milliseconds, Weight, Weighting},
};

pub(crate) type ArcId = usize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum ArcKind {
    Base { base_edge: EdgeId },
    Shortcut { first: ArcId, second: ArcId, via: NodeId },
}

/// Directed arc of the graph being contracted
#[derive(Debug, Clone, Copy)]
pub(crate) struct PreparationArc {
    pub from: NodeId,
    pub to: NodeId,
    pub weight: Weight,
    pub time: Milliseconds,
    pub distance: Distance<Meters>,
    /// Number of base edges the arc stands for
    pub original_edges: usize,
    pub kind: ArcKind,
}

/// Directed working copy of the base graph. Contracted nodes are cut off from their
/// neighbors, shortcuts are added between the remaining ones.
pub(crate) struct CHPreparationGraph {
    arcs: Vec<PreparationArc>,
    out_arcs: Vec<Vec<ArcId>>,
    in_arcs: Vec<Vec<ArcId>>,
}

impl CHPreparationGraph {
    pub fn new<W>(base_graph: &BaseGraph, weighting: &W) -> Self
    where
        W: Weighting<BaseGraphEdge> + ?Sized,
    {
        let nodes = base_graph.node_count();
        let mut graph = CHPreparationGraph {
            arcs: Vec::with_capacity(base_graph.edge_count() * 2),
            out_arcs: vec![Vec::new(); nodes],
            in_arcs: vec![Vec::new(); nodes],
        };

        for edge_id in 0..base_graph.edge_count() {
            let edge = base_graph.edge(edge_id);
            if edge.start_node() == edge.end_node() {
                continue;
            }

            for direction in [EdgeDirection::Forward, EdgeDirection::Backward] {
                let weight = weighting.calc_edge_weight(edge, direction);
                if weight == MAX_WEIGHT {
                    continue;
                }

                let (from, to) = match direction {
                    EdgeDirection::Forward => (edge.start_node(), edge.end_node()),
                    EdgeDirection::Backward => (edge.end_node(), edge.start_node()),
                };

                graph.add_arc(PreparationArc {
                    from,
                    to,
                    weight,
                    time: weighting.calc_edge_ms(edge, direction),
                    distance: edge.distance(),
                    original_edges: 1,
                    kind: ArcKind::Base { base_edge: edge_id },
                });
            }
        }

        graph
    }

    pub fn arc(&self, arc_id: ArcId) -> &PreparationArc {
        &self.arcs[arc_id]
    }

    pub fn out_arcs(&self, node: NodeId) -> &[ArcId] {
        &self.out_arcs[node]
    }

    pub fn in_arcs(&self, node: NodeId) -> &[ArcId] {
        &self.in_arcs[node]
    }

    pub fn degree(&self, node: NodeId) -> usize {
        self.out_arcs[node].len() + self.in_arcs[node].len()
    }

    /// Remaining neighbors, sorted
    pub fn neighbors(&self, node: NodeId) -> Vec<NodeId> {
        let mut neighbors: Vec<NodeId> = self.out_arcs[node]
            .iter()
            .map(|&arc_id| self.arcs[arc_id].to)
            .chain(self.in_arcs[node].iter().map(|&arc_id| self.arcs[arc_id].from))
            .collect();
        neighbors.sort_unstable();
        neighbors.dedup();
        neighbors
    }

    /// Adds `arc` unless an arc between the same nodes is at most as heavy.
    /// A heavier parallel arc is replaced in place.
    pub fn add_arc(&mut self, arc: PreparationArc) -> Option<ArcId> {
        let existing = self.out_arcs[arc.from]
            .iter()
            .copied()
            .find(|&arc_id| self.arcs[arc_id].to == arc.to);

        match existing {
            Some(arc_id) if self.arcs[arc_id].weight <= arc.weight => None,
            Some(arc_id) => {
                self.arcs[arc_id] = arc;
                Some(arc_id)
            }
            None => {
                let arc_id = self.arcs.len();
                self.out_arcs[arc.from].push(arc_id);
                self.in_arcs[arc.to].push(arc_id);
                self.arcs.push(arc);
                Some(arc_id)
            }
        }
    }

    /// Cuts `node` off from the rest of the graph
    pub fn disconnect_node(&mut self, node: NodeId) {
        let out_arcs = std::mem::take(&mut self.out_arcs[node]);
        let in_arcs = std::mem::take(&mut self.in_arcs[node]);

        for arc_id in out_arcs {
            let to = self.arcs[arc_id].to;
            self.in_arcs[to].retain(|&id| id != arc_id);
        }

        for arc_id in in_arcs {
            let from = self.arcs[arc_id].from;
            self.out_arcs[from].retain(|&id| id != arc_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        base_graph::BaseGraph,
        geopoint::GeoPoint,
        properties::{property::TravelMode, property_map::EdgePropertyMap},
        test_graph_utils::test_graph::ring_with_chord_graph,
        weighting::shortest::ShortestWeighting,
    };

    use super::*;

    #[test]
    fn builds_arcs_per_direction() {
        let graph = ring_with_chord_graph();
        let preparation_graph = CHPreparationGraph::new(&graph, &ShortestWeighting::new(TravelMode::Foot));

        assert_eq!(preparation_graph.out_arcs(0).len(), 3);
        assert_eq!(preparation_graph.in_arcs(0).len(), 3);
        assert_eq!(preparation_graph.neighbors(0), vec![1, 3, 5]);
    }

    #[test]
    fn keeps_lightest_parallel_arc_and_skips_loops() {
        let mut graph = BaseGraph::new();
        graph.add_node(GeoPoint::new(0.0, 0.0));
        graph.add_node(GeoPoint::new(0.0, 0.001));
        let properties = EdgePropertyMap::new().with_access(TravelMode::Car, 50.0, true);
        graph.add_edge_with_distance(0, 1, crate::meters!(300), properties.clone());
        graph.add_edge_with_distance(0, 1, crate::meters!(100), properties.clone());
        graph.add_edge_with_distance(0, 1, crate::meters!(200), properties.clone());
        graph.add_edge(1, 1, properties);

        let preparation_graph = CHPreparationGraph::new(&graph, &ShortestWeighting::new(TravelMode::Car));
        assert_eq!(preparation_graph.out_arcs(0).len(), 1);
        assert!(preparation_graph.in_arcs(0).is_empty());
        assert!(preparation_graph.out_arcs(1).is_empty());

        let arc = preparation_graph.arc(preparation_graph.out_arcs(0)[0]);
        assert_eq!(arc.weight, 100);
        assert_eq!(arc.kind, ArcKind::Base { base_edge: 1 });
    }

    #[test]
    fn disconnect_removes_incident_arcs() {
        let graph = ring_with_chord_graph();
        let mut preparation_graph = CHPreparationGraph::new(&graph, &ShortestWeighting::new(TravelMode::Foot));

        preparation_graph.disconnect_node(0);
        assert_eq!(preparation_graph.degree(0), 0);
        assert_eq!(preparation_graph.neighbors(1), vec![2]);
        assert_eq!(preparation_graph.neighbors(3), vec![2, 4]);
    }
}
