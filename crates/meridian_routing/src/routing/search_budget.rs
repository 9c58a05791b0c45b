use std::time::{Duration, Instant};

use crate::error::RoutingError;

use super::shortest_path_algorithm::CalcPathOptions;

const DEADLINE_CHECK_INTERVAL: usize = 256;

/// Node-visit and time budget of one search
pub struct SearchBudget {
    max_visited_nodes: usize,
    timeout: Option<Duration>,
    deadline: Option<Instant>,
    visited_nodes: usize,
}

impl SearchBudget {
    pub fn new(max_visited_nodes: usize, timeout: Option<Duration>) -> Self {
        SearchBudget {
            max_visited_nodes,
            timeout,
            deadline: timeout.map(|timeout| Instant::now() + timeout),
            visited_nodes: 0,
        }
    }

    pub fn from_options(options: &CalcPathOptions) -> Self {
        Self::new(options.max_visited_nodes, options.timeout)
    }

    pub fn unlimited() -> Self {
        Self::new(usize::MAX, None)
    }

    /// Accounts for one settled node, failing once the budget is spent
    #[inline]
    pub fn visit(&mut self) -> Result<(), RoutingError> {
        if self.visited_nodes >= self.max_visited_nodes {
            return Err(RoutingError::NodeLimitExceeded {
                max_visited_nodes: self.max_visited_nodes,
            });
        }
        self.visited_nodes += 1;

        if let Some(deadline) = self.deadline
            && self.visited_nodes % DEADLINE_CHECK_INTERVAL == 0
            && Instant::now() >= deadline
        {
            return Err(RoutingError::TimeoutExceeded {
                timeout: self.timeout.unwrap_or_default(),
            });
        }

        Ok(())
    }

    pub fn visited_nodes(&self) -> usize {
        self.visited_nodes
    }
}
