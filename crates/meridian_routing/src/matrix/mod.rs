pub mod ch_matrix_algorithm;
pub mod dijkstra_matrix_algorithm;
pub mod matrix;
pub mod matrix_algorithm;
pub mod matrix_request;
