pub mod ch_edge;
pub mod ch_graph;
pub mod ch_graph_builder;
pub mod ch_preparation;
pub mod ch_query;
pub mod ch_storage;
pub mod ch_weighting;
pub mod contraction_params;
pub mod shortcut;

mod node_contractor;
mod preparation_graph;
mod priority_queue;
mod witness_search;
