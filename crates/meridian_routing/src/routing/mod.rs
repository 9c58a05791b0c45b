pub mod astar;
pub mod astar_heuristic;
pub mod bidirectional_dijkstra;
pub mod dijkstra_search;
pub mod routing_path;
pub mod routing_path_builder;
pub mod routing_request;
pub mod search_budget;
pub(crate) mod search_direction;
pub mod shortest_path_algorithm;
pub mod shortest_path_tree;
