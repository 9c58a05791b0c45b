pub mod query_graph;
mod query_graph_edge_iterator;
pub(crate) mod virtual_access;
