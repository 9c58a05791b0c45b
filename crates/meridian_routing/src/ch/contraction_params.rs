use serde::Deserialize;

/// Tunable parameters of the node contraction
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ContractionParams {
    pub priority: PriorityParams,
    /// Settled node limit of the witness searches run while contracting a node
    pub witness_search_limit: usize,
    /// Settled node limit of the witness searches run to estimate priorities
    pub priority_witness_search_limit: usize,
    /// Neighbors whose priority is recomputed after a contraction, `None` for all of them
    pub max_neighbor_updates: Option<usize>,
    /// Preparation fails once shortcuts exceed this multiple of the base edge count
    pub max_shortcut_ratio: f64,
}

impl ContractionParams {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn priority(mut self, params: PriorityParams) -> Self {
        self.priority = params;
        self
    }

    pub fn witness_search_limit(mut self, limit: usize) -> Self {
        self.witness_search_limit = limit;
        self
    }

    pub fn priority_witness_search_limit(mut self, limit: usize) -> Self {
        self.priority_witness_search_limit = limit;
        self
    }

    pub fn max_neighbor_updates(mut self, limit: Option<usize>) -> Self {
        self.max_neighbor_updates = limit;
        self
    }

    pub fn max_shortcut_ratio(mut self, ratio: f64) -> Self {
        self.max_shortcut_ratio = ratio;
        self
    }
}

impl Default for ContractionParams {
    fn default() -> Self {
        ContractionParams {
            priority: Default::default(),
            witness_search_limit: 500,
            priority_witness_search_limit: 50,
            max_neighbor_updates: None,
            max_shortcut_ratio: 20.0,
        }
    }
}

/// Coefficients of the node priority function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PriorityParams {
    pub edge_difference_coeff: i64,
    pub original_edges_coeff: i64,
    pub contracted_neighbors_coeff: i64,
    pub hierarchy_depth_coeff: i64,
}

impl PriorityParams {
    pub fn edge_difference_coeff(mut self, coeff: i64) -> Self {
        self.edge_difference_coeff = coeff;
        self
    }

    pub fn original_edges_coeff(mut self, coeff: i64) -> Self {
        self.original_edges_coeff = coeff;
        self
    }

    pub fn contracted_neighbors_coeff(mut self, coeff: i64) -> Self {
        self.contracted_neighbors_coeff = coeff;
        self
    }

    pub fn hierarchy_depth_coeff(mut self, coeff: i64) -> Self {
        self.hierarchy_depth_coeff = coeff;
        self
    }
}

impl Default for PriorityParams {
    fn default() -> Self {
        PriorityParams {
            edge_difference_coeff: 10,
            original_edges_coeff: 50,
            contracted_neighbors_coeff: 1,
            hierarchy_depth_coeff: 1,
        }
    }
}
