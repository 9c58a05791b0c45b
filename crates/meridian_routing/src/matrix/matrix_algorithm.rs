use std::time::Duration;

use crate::{error::RoutingError, routing::shortest_path_algorithm::CalcPathOptions, types::NodeId};

use super::matrix::Matrix;

#[derive(Debug)]
pub struct MatrixAlgorithmResult {
    pub matrix: Matrix,
    pub visited_nodes: usize,
    pub duration: Duration,
}

/// Many-to-many search. Unreachable pairs are left empty in the matrix, only budget
/// exhaustion and invalid nodes fail the whole computation.
pub trait MatrixAlgorithm {
    fn calc_matrix(
        &self,
        sources: &[NodeId],
        targets: &[NodeId],
        options: &CalcPathOptions,
    ) -> Result<MatrixAlgorithmResult, RoutingError>;
}
