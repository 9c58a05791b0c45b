use std::time::Instant;

use rayon::prelude::*;
use tracing::debug;

use crate::{
    error::RoutingError,
    graph::UndirectedEdgeAccess,
    routing::{
        dijkstra_search::DijkstraSearch, search_budget::SearchBudget,
        shortest_path_algorithm::CalcPathOptions,
    },
    types::NodeId,
    weighting::Weighting,
};

use super::{
    matrix::{Matrix, MatrixEntry},
    matrix_algorithm::{MatrixAlgorithm, MatrixAlgorithmResult},
};

/// One one-to-many Dijkstra per source, for weightings without a prepared hierarchy
pub struct DijkstraMatrixAlgorithm<'a, G, W: ?Sized> {
    graph: &'a G,
    weighting: &'a W,
}

impl<'a, G, W> DijkstraMatrixAlgorithm<'a, G, W>
where
    G: UndirectedEdgeAccess + Sync,
    W: Weighting<G::Edge> + ?Sized,
{
    pub fn new(graph: &'a G, weighting: &'a W) -> Self {
        DijkstraMatrixAlgorithm { graph, weighting }
    }
}

impl<G, W> MatrixAlgorithm for DijkstraMatrixAlgorithm<'_, G, W>
where
    G: UndirectedEdgeAccess + Sync,
    W: Weighting<G::Edge> + ?Sized,
{
    fn calc_matrix(
        &self,
        sources: &[NodeId],
        targets: &[NodeId],
        options: &CalcPathOptions,
    ) -> Result<MatrixAlgorithmResult, RoutingError> {
        if let Some(&target) = targets.iter().find(|&&node| node >= self.graph.node_count()) {
            return Err(RoutingError::InvalidNode(target));
        }

        let started_at = Instant::now();

        let rows = sources
            .par_iter()
            .map(|&source| {
                let mut search = DijkstraSearch::new(self.graph, self.weighting);
                let mut budget = SearchBudget::from_options(options);
                let labels = search.calc_one_to_many(source, targets, &mut budget)?;

                let row: Vec<Option<MatrixEntry>> = labels
                    .into_iter()
                    .map(|label| label.map(|entry| MatrixEntry::new(entry.weight, entry.time, entry.distance)))
                    .collect();
                Ok((row, budget.visited_nodes()))
            })
            .collect::<Result<Vec<_>, RoutingError>>()?;

        let visited_nodes = rows.iter().map(|(_, visited)| visited).sum();
        let matrix = Matrix::from_rows(targets.len(), rows.into_iter().map(|(row, _)| row).collect());

        debug!(
            sources = sources.len(),
            targets = targets.len(),
            visited_nodes,
            "dijkstra matrix computed"
        );

        Ok(MatrixAlgorithmResult {
            matrix,
            visited_nodes,
            duration: started_at.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        constants::NO_ROUTE,
        geopoint::GeoPoint,
        properties::property::TravelMode,
        routing::{astar::Dijkstra, shortest_path_algorithm::ShortestPathAlgorithm},
        test_graph_utils::test_graph::line_graph,
        weighting::fastest::FastestWeighting,
    };

    use super::*;

    #[test]
    fn unreachable_destination_gets_no_route() {
        let mut graph = line_graph(4, TravelMode::Car, 50.0);
        let unreachable = graph.add_node(GeoPoint::new(1.0, 1.0));
        let weighting = FastestWeighting::new(TravelMode::Car);

        let result = DijkstraMatrixAlgorithm::new(&graph, &weighting)
            .calc_matrix(&[0], &[0, 3, unreachable], &CalcPathOptions::default())
            .unwrap();
        let expected = Dijkstra::new(&graph, &weighting)
            .calc_path(0, 3, &CalcPathOptions::default())
            .unwrap();

        assert_eq!(result.matrix.weight(0, 0), 0);
        assert_eq!(result.matrix.weight(0, 1), expected.path.weight);
        assert_eq!(result.matrix.time(0, 1), expected.path.time);
        assert_eq!(result.matrix.weight(0, 2), NO_ROUTE);
        assert_eq!(result.matrix.entry(0, 2), None);
    }

    #[test]
    fn budget_applies_per_source() {
        let graph = line_graph(10, TravelMode::Car, 50.0);
        let weighting = FastestWeighting::new(TravelMode::Car);
        let options = CalcPathOptions::default().with_max_visited_nodes(3);

        let result = DijkstraMatrixAlgorithm::new(&graph, &weighting).calc_matrix(&[0, 1], &[9], &options);
        assert_eq!(
            result.unwrap_err(),
            RoutingError::NodeLimitExceeded { max_visited_nodes: 3 }
        );
    }
}
