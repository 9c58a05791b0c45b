pub mod base_graph;
pub mod ch;
pub mod config;
pub mod constants;
pub mod distance;
pub mod edge_direction;
pub mod error;
pub mod generation;
mod geometry;
pub mod geopoint;
pub mod graph;
pub mod graph_edge;
pub mod isochrone;
pub mod landmarks;
pub mod location_index;
pub mod map_matching;
pub mod matrix;
pub mod meridian;
pub mod properties;
pub mod query;
pub mod routing;
pub mod snap;
pub mod stopwatch;
mod storage;
pub mod synthetic;
pub mod types;
pub mod weighting;

#[cfg(test)]
pub(crate) mod test_graph_utils;
