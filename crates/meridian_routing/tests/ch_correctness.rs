use meridian_routing::{
    base_graph::BaseGraph,
    ch::{
        ch_graph_builder::CHGraphBuilder,
        ch_query::CHQuery,
        ch_storage::{CHMetadata, CHStorage},
        contraction_params::ContractionParams,
    },
    error::RoutingError,
    geopoint::GeoPoint,
    graph::Graph,
    matrix::{
        ch_matrix_algorithm::CHMatrixAlgorithm, dijkstra_matrix_algorithm::DijkstraMatrixAlgorithm,
        matrix_algorithm::MatrixAlgorithm,
    },
    properties::{property::TravelMode, property_map::EdgePropertyMap},
    routing::{
        astar::Dijkstra,
        shortest_path_algorithm::{CalcPathOptions, ShortestPathAlgorithm},
    },
    synthetic,
    types::NodeId,
    weighting::{Weighting, fastest::FastestWeighting, shortest::ShortestWeighting},
};
use rand::{Rng, SeedableRng, rngs::StdRng};

fn random_graph(rng: &mut StdRng, nodes: usize, edges: usize) -> BaseGraph {
    let mut graph = BaseGraph::new();
    for _ in 0..nodes {
        graph.add_node(GeoPoint::new(
            rng.random_range(0.0..0.05),
            rng.random_range(0.0..0.05),
        ));
    }

    for _ in 0..edges {
        let start = rng.random_range(0..nodes);
        let end = rng.random_range(0..nodes);
        let speed = rng.random_range(10.0..120.0);
        let oneway = rng.random_bool(0.3);
        graph.add_edge(
            start,
            end,
            EdgePropertyMap::new().with_access(TravelMode::Car, speed, oneway),
        );
    }

    graph
}

fn prepare<W: Weighting + ?Sized>(graph: &BaseGraph, weighting: &W, name: &str) -> CHStorage {
    let storage = CHGraphBuilder::new(graph, ContractionParams::default())
        .build(weighting, CHMetadata::new("car", name, graph))
        .unwrap();
    storage.check().unwrap();
    storage
}

fn assert_same_routes<W: Weighting + ?Sized>(
    graph: &BaseGraph,
    weighting: &W,
    storage: &CHStorage,
    pairs: &[(NodeId, NodeId)],
) {
    let options = CalcPathOptions::default();
    let mut dijkstra = Dijkstra::new(graph, weighting);
    let mut ch = CHQuery::new(storage);

    for &(start, end) in pairs {
        match (
            dijkstra.calc_path(start, end, &options),
            ch.calc_path(start, end, &options),
        ) {
            (Ok(expected), Ok(actual)) => {
                assert_eq!(
                    expected.path.weight, actual.path.weight,
                    "weight from {} to {}",
                    start, end
                );
                assert_eq!(actual.path.nodes.first(), Some(&start));
                assert_eq!(actual.path.nodes.last(), Some(&end));
                assert_eq!(actual.path.nodes.len(), actual.path.edges.len() + 1);
            }
            (Err(RoutingError::NoPathFound), Err(RoutingError::NoPathFound)) => {}
            (expected, actual) => panic!(
                "from {} to {}: dijkstra {:?}, ch {:?}",
                start, end, expected, actual
            ),
        }
    }
}

fn random_pairs(rng: &mut StdRng, nodes: usize, count: usize) -> Vec<(NodeId, NodeId)> {
    (0..count)
        .map(|_| (rng.random_range(0..nodes), rng.random_range(0..nodes)))
        .collect()
}

#[test]
fn ch_routes_match_dijkstra_on_random_graphs() {
    for seed in [1, 7, 42] {
        let mut rng = StdRng::seed_from_u64(seed);
        let graph = random_graph(&mut rng, 120, 320);
        let pairs = random_pairs(&mut rng, graph.node_count(), 50);

        let fastest = FastestWeighting::new(TravelMode::Car);
        let storage = prepare(&graph, &fastest, "fastest");
        assert_same_routes(&graph, &fastest, &storage, &pairs);

        let shortest = ShortestWeighting::new(TravelMode::Car);
        let storage = prepare(&graph, &shortest, "shortest");
        assert_same_routes(&graph, &shortest, &storage, &pairs);
    }
}

#[test]
fn ch_routes_match_dijkstra_on_grid() {
    let properties = EdgePropertyMap::new().with_access(TravelMode::Car, 50.0, false);
    let graph = synthetic::grid_graph(12, 12, 0.001, GeoPoint::new(0.0, 0.0), &properties);
    let weighting = FastestWeighting::new(TravelMode::Car);
    let storage = prepare(&graph, &weighting, "fastest");

    let mut rng = StdRng::seed_from_u64(3);
    let pairs = random_pairs(&mut rng, graph.node_count(), 60);
    assert_same_routes(&graph, &weighting, &storage, &pairs);
}

#[test]
fn any_contraction_order_yields_the_same_routes() {
    let mut rng = StdRng::seed_from_u64(19);
    let graph = random_graph(&mut rng, 60, 160);
    let weighting = FastestWeighting::new(TravelMode::Car);
    let pairs = random_pairs(&mut rng, graph.node_count(), 40);

    let order: Vec<NodeId> = (0..graph.node_count()).rev().collect();
    let storage = CHGraphBuilder::new(&graph, ContractionParams::default())
        .build_with_node_order(&weighting, CHMetadata::new("car", "fastest", &graph), &order)
        .unwrap();
    storage.check().unwrap();

    assert_same_routes(&graph, &weighting, &storage, &pairs);
}

#[test]
fn ch_matrix_matches_dijkstra_matrix() {
    let mut rng = StdRng::seed_from_u64(5);
    let graph = random_graph(&mut rng, 150, 400);
    let weighting = FastestWeighting::new(TravelMode::Car);
    let storage = prepare(&graph, &weighting, "fastest");

    let sources: Vec<NodeId> = (0..10).map(|_| rng.random_range(0..graph.node_count())).collect();
    let targets: Vec<NodeId> = (0..12).map(|_| rng.random_range(0..graph.node_count())).collect();
    let options = CalcPathOptions::default();

    let expected = DijkstraMatrixAlgorithm::new(&graph, &weighting)
        .calc_matrix(&sources, &targets, &options)
        .unwrap();
    let actual = CHMatrixAlgorithm::new(&storage)
        .calc_matrix(&sources, &targets, &options)
        .unwrap();

    assert_eq!(actual.matrix.weights(), expected.matrix.weights());
}

#[test]
fn repeated_queries_are_identical() {
    let mut rng = StdRng::seed_from_u64(23);
    let graph = random_graph(&mut rng, 80, 220);
    let weighting = FastestWeighting::new(TravelMode::Car);
    let storage = prepare(&graph, &weighting, "fastest");
    let options = CalcPathOptions::default();

    let mut ch = CHQuery::new(&storage);
    let mut dijkstra = Dijkstra::new(&graph, &weighting);
    for (start, end) in random_pairs(&mut rng, graph.node_count(), 20) {
        let first = ch.calc_path(start, end, &options).map(|result| result.path);
        let second = ch.calc_path(start, end, &options).map(|result| result.path);
        assert_eq!(first, second);

        let first = dijkstra.calc_path(start, end, &options).map(|result| result.path);
        let second = dijkstra.calc_path(start, end, &options).map(|result| result.path);
        assert_eq!(first, second);
    }
}
