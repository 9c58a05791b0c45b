use std::time::Instant;

use fxhash::FxHashMap;
use rayon::prelude::*;
use tracing::debug;

use crate::{
    ch::{
        ch_graph::CHGraph,
        ch_query::upward_tree,
        ch_storage::CHStorage,
    },
    distance::{Distance, Meters},
    error::RoutingError,
    graph::Graph,
    query::{
        query_graph::QueryGraph,
        virtual_access::{AccessRoot, VirtualAccess},
    },
    routing::{
        search_budget::SearchBudget, search_direction::SearchDirection,
        shortest_path_algorithm::CalcPathOptions,
    },
    types::NodeId,
    weighting::{Milliseconds, Weight, Weighting},
};

use super::{
    matrix::{Matrix, MatrixEntry},
    matrix_algorithm::{MatrixAlgorithm, MatrixAlgorithmResult},
};

/// Label of a backward upward search, stored on every node that search settled
#[derive(Clone, Copy)]
struct BucketEntry {
    target_index: usize,
    weight: Weight,
    time: Milliseconds,
    distance: Distance<Meters>,
}

type Buckets = FxHashMap<NodeId, Vec<BucketEntry>>;

/// Bucket based many-to-many search on a hierarchy.
///
/// One backward upward search per target fills buckets on the nodes it settles,
/// then one forward upward search per source scans the buckets of its settled nodes.
/// Every shortest path has a highest node reached by both searches, so the best
/// combination over all shared nodes is the exact distance.
pub struct CHMatrixAlgorithm<'a> {
    graph: CHGraph<'a>,
}

impl<'a> CHMatrixAlgorithm<'a> {
    pub fn new(storage: &'a CHStorage) -> Self {
        CHMatrixAlgorithm {
            graph: CHGraph::new(storage),
        }
    }

    fn check_nodes(nodes: &[NodeId], node_count: usize) -> Result<(), RoutingError> {
        match nodes.iter().find(|&&node| node >= node_count) {
            Some(&node) => Err(RoutingError::InvalidNode(node)),
            None => Ok(()),
        }
    }

    fn fill_buckets(
        &self,
        targets: &[Vec<AccessRoot>],
        options: &CalcPathOptions,
    ) -> Result<(Buckets, usize), RoutingError> {
        let trees = targets
            .par_iter()
            .map(|roots| {
                let mut budget = SearchBudget::from_options(options);
                let tree = upward_tree(&self.graph, roots, SearchDirection::Backward, &mut budget)?;
                Ok((tree, budget.visited_nodes()))
            })
            .collect::<Result<Vec<_>, RoutingError>>()?;

        let mut buckets = Buckets::default();
        let mut visited_nodes = 0;
        for (target_index, (tree, visited)) in trees.into_iter().enumerate() {
            visited_nodes += visited;
            for (node, entry) in tree.settled_entries() {
                buckets.entry(node).or_default().push(BucketEntry {
                    target_index,
                    weight: entry.weight,
                    time: entry.time,
                    distance: entry.distance,
                });
            }
        }

        Ok((buckets, visited_nodes))
    }

    fn scan_buckets(
        &self,
        roots: &[AccessRoot],
        target_count: usize,
        buckets: &Buckets,
        options: &CalcPathOptions,
    ) -> Result<(Vec<Option<MatrixEntry>>, usize), RoutingError> {
        let mut budget = SearchBudget::from_options(options);
        let tree = upward_tree(&self.graph, roots, SearchDirection::Forward, &mut budget)?;

        let mut row: Vec<Option<MatrixEntry>> = vec![None; target_count];
        for (node, forward) in tree.settled_entries() {
            let Some(bucket) = buckets.get(&node) else {
                continue;
            };

            for backward in bucket {
                let entry = MatrixEntry::new(
                    forward.weight.saturating_add(backward.weight),
                    forward.time.saturating_add(backward.time),
                    forward.distance + backward.distance,
                );
                keep_better(&mut row[backward.target_index], entry);
            }
        }

        Ok((row, budget.visited_nodes()))
    }

    fn calc_matrix_from_roots(
        &self,
        sources: &[Vec<AccessRoot>],
        targets: &[Vec<AccessRoot>],
        options: &CalcPathOptions,
    ) -> Result<(Vec<Vec<Option<MatrixEntry>>>, usize), RoutingError> {
        let (buckets, backward_visited) = self.fill_buckets(targets, options)?;

        let rows = sources
            .par_iter()
            .map(|roots| self.scan_buckets(roots, targets.len(), &buckets, options))
            .collect::<Result<Vec<_>, RoutingError>>()?;

        let forward_visited: usize = rows.iter().map(|(_, visited)| visited).sum();
        debug!(
            sources = sources.len(),
            targets = targets.len(),
            buckets = buckets.len(),
            "ch matrix computed"
        );

        Ok((
            rows.into_iter().map(|(row, _)| row).collect(),
            backward_visited + forward_visited,
        ))
    }

    /// Matrix between nodes of a query graph laid over the hierarchy's base graph.
    ///
    /// Snapped points enter the hierarchy through the base nodes of their edge, as in
    /// [`CHQuery::calc_query_path`](crate::ch::ch_query::CHQuery::calc_query_path).
    /// `weighting` must be the one the hierarchy was prepared with.
    pub fn calc_query_matrix<W>(
        &self,
        query_graph: &QueryGraph,
        weighting: &W,
        sources: &[NodeId],
        targets: &[NodeId],
        options: &CalcPathOptions,
    ) -> Result<MatrixAlgorithmResult, RoutingError>
    where
        W: Weighting + ?Sized,
    {
        Self::check_nodes(sources, query_graph.node_count())?;
        Self::check_nodes(targets, query_graph.node_count())?;

        let started_at = Instant::now();

        let source_access: Vec<VirtualAccess> = sources
            .iter()
            .map(|&source| VirtualAccess::new(query_graph, weighting, source, SearchDirection::Forward))
            .collect();
        let source_roots: Vec<Vec<AccessRoot>> = source_access
            .iter()
            .map(|access| access.roots(query_graph))
            .collect();
        let target_roots: Vec<Vec<AccessRoot>> = targets
            .iter()
            .map(|&target| {
                VirtualAccess::new(query_graph, weighting, target, SearchDirection::Backward).roots(query_graph)
            })
            .collect();

        let (mut rows, visited_nodes) = self.calc_matrix_from_roots(&source_roots, &target_roots, options)?;

        // Pairs on one edge may be joined without leaving it
        for (row, access) in rows.iter_mut().zip(&source_access) {
            for (slot, &target) in row.iter_mut().zip(targets) {
                if !query_graph.is_virtual_node(target) {
                    continue;
                }
                if let Some(path) = access.path_to(query_graph, target) {
                    keep_better(slot, MatrixEntry::new(path.weight, path.time, path.distance));
                }
            }
        }

        Ok(MatrixAlgorithmResult {
            matrix: Matrix::from_rows(targets.len(), rows),
            visited_nodes,
            duration: started_at.elapsed(),
        })
    }
}

fn keep_better(slot: &mut Option<MatrixEntry>, entry: MatrixEntry) {
    if slot.as_ref().is_none_or(|current| entry.weight() < current.weight()) {
        *slot = Some(entry);
    }
}

impl MatrixAlgorithm for CHMatrixAlgorithm<'_> {
    fn calc_matrix(
        &self,
        sources: &[NodeId],
        targets: &[NodeId],
        options: &CalcPathOptions,
    ) -> Result<MatrixAlgorithmResult, RoutingError> {
        Self::check_nodes(sources, self.graph.node_count())?;
        Self::check_nodes(targets, self.graph.node_count())?;

        let started_at = Instant::now();
        let roots = |nodes: &[NodeId]| -> Vec<Vec<AccessRoot>> {
            nodes.iter().map(|&node| vec![AccessRoot::at(node)]).collect()
        };
        let (rows, visited_nodes) = self.calc_matrix_from_roots(&roots(sources), &roots(targets), options)?;

        Ok(MatrixAlgorithmResult {
            matrix: Matrix::from_rows(targets.len(), rows),
            visited_nodes,
            duration: started_at.elapsed(),
        })
    }
}
