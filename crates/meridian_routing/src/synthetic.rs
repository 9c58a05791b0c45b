use crate::{
    base_graph::BaseGraph, geopoint::GeoPoint, properties::property_map::EdgePropertyMap,
};

/// Square grid of `rows` x `cols` nodes, `spacing` degrees apart, starting at `origin`.
///
/// Node `row * cols + col` sits at `origin + (row, col) * spacing`. For every node the
/// edge to its eastern neighbor is added before the edge to its northern neighbor.
pub fn grid_graph(
    rows: usize,
    cols: usize,
    spacing: f64,
    origin: GeoPoint,
    properties: &EdgePropertyMap,
) -> BaseGraph {
    let mut graph = BaseGraph::with_capacity(rows * cols, 2 * rows * cols);

    for row in 0..rows {
        for col in 0..cols {
            graph.add_node(GeoPoint::new(
                origin.lat + row as f64 * spacing,
                origin.lon + col as f64 * spacing,
            ));
        }
    }

    for row in 0..rows {
        for col in 0..cols {
            let node = row * cols + col;
            if col + 1 < cols {
                graph.add_edge(node, node + 1, properties.clone());
            }
            if row + 1 < rows {
                graph.add_edge(node, node + cols, properties.clone());
            }
        }
    }

    graph
}
