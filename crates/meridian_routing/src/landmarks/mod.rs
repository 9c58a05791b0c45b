pub mod landmark_heuristic;
pub mod landmark_storage;
pub mod lm_preparation;
