#[cfg(test)]
pub mod test_graph {
    use std::path::PathBuf;

    use rand::{Rng, SeedableRng, rngs::StdRng};

    use crate::{
        base_graph::BaseGraph,
        geopoint::GeoPoint,
        kilometers, meters,
        properties::{property::TravelMode, property_map::EdgePropertyMap},
        synthetic,
        types::NodeId,
    };

    pub fn temp_file_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("meridian_{}_{}", std::process::id(), name))
    }

    pub fn grid_graph(
        rows: usize,
        cols: usize,
        spacing: f64,
        mode: TravelMode,
        speed: f32,
    ) -> BaseGraph {
        let properties = EdgePropertyMap::new().with_access(mode, speed, false);
        synthetic::grid_graph(rows, cols, spacing, GeoPoint::new(0.0, 0.0), &properties)
    }

    /// Straight east-west line of `nodes` nodes, 0.001 degrees apart
    pub fn line_graph(nodes: usize, mode: TravelMode, speed: f32) -> BaseGraph {
        grid_graph(1, nodes, 0.001, mode, speed)
    }

    /// Six nodes on a ring, all edges 1 m long, with a chord between 0 and 3.
    /// Edges 0..=5 form the ring (i -> i + 1), edge 6 is the chord.
    pub fn ring_with_chord_graph() -> BaseGraph {
        let mut graph = BaseGraph::new();
        for i in 0..6 {
            let angle = i as f64 * std::f64::consts::PI / 3.0;
            graph.add_node(GeoPoint::new(angle.sin() * 0.0001, angle.cos() * 0.0001));
        }

        let properties = EdgePropertyMap::new().with_access(TravelMode::Foot, 5.0, false);
        for i in 0..6 {
            graph.add_edge_with_distance(i, (i + 1) % 6, meters!(1), properties.clone());
        }
        graph.add_edge_with_distance(0, 3, meters!(1), properties);
        graph
    }

    /// Random connected-ish graph with mixed oneway edges and parallel edges
    pub fn random_graph(seed: u64, nodes: usize, edges: usize) -> BaseGraph {
        let mut rng = StdRng::seed_from_u64(seed);
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

    #[derive(Clone, Copy, Debug)]
    pub enum RomaniaGraphCity {
        Arad = 0,
        Bucharest = 1,
        Craiova = 2,
        Dobreta = 3,
        Eforie = 4,
        Fagaras = 5,
        Giurgiu = 6,
        Hirsova = 7,
        Iasi = 8,
        Lugoj = 9,
        Mehadia = 10,
        Neamt = 11,
        Oradea = 12,
        Pitesti = 13,
        RimnicuVilcea = 14,
        Sibiu = 15,
        Timisoara = 16,
        Urziceni = 17,
        Vaslui = 18,
        Zerind = 19,
    }

    impl From<RomaniaGraphCity> for NodeId {
        fn from(value: RomaniaGraphCity) -> Self {
            value as NodeId
        }
    }

    const ROMANIA_CITIES: [(f64, f64); 20] = [
        (46.18, 21.31), // Arad
        (44.43, 26.10), // Bucharest
        (44.32, 23.80), // Craiova
        (44.63, 22.66), // Dobreta
        (44.06, 28.63), // Eforie
        (45.84, 24.97), // Fagaras
        (43.90, 25.97), // Giurgiu
        (44.69, 27.95), // Hirsova
        (47.16, 27.59), // Iasi
        (45.69, 21.90), // Lugoj
        (44.90, 22.36), // Mehadia
        (46.93, 26.37), // Neamt
        (47.07, 21.93), // Oradea
        (44.86, 24.87), // Pitesti
        (45.10, 24.37), // Rimnicu Vilcea
        (45.79, 24.15), // Sibiu
        (45.75, 21.23), // Timisoara
        (44.72, 26.64), // Urziceni
        (46.64, 27.73), // Vaslui
        (46.62, 21.52), // Zerind
    ];

    // https://user-images.githubusercontent.com/43790152/97784960-1a142580-1bc4-11eb-9070-39c03eb16df2.png
    const ROMANIA_ROADS: [(RomaniaGraphCity, RomaniaGraphCity, u32); 23] = {
        use RomaniaGraphCity::*;
        [
            (Oradea, Zerind, 71),
            (Oradea, Sibiu, 151),
            (Zerind, Arad, 75),
            (Arad, Sibiu, 140),
            (Arad, Timisoara, 118),
            (Timisoara, Lugoj, 111),
            (Lugoj, Mehadia, 70),
            (Mehadia, Dobreta, 75),
            (Dobreta, Craiova, 120),
            (Sibiu, Fagaras, 99),
            (Sibiu, RimnicuVilcea, 80),
            (RimnicuVilcea, Pitesti, 97),
            (RimnicuVilcea, Craiova, 146),
            (Craiova, Pitesti, 138),
            (Fagaras, Bucharest, 211),
            (Pitesti, Bucharest, 101),
            (Bucharest, Giurgiu, 90),
            (Bucharest, Urziceni, 85),
            (Urziceni, Hirsova, 98),
            (Hirsova, Eforie, 86),
            (Urziceni, Vaslui, 142),
            (Vaslui, Iasi, 92),
            (Iasi, Neamt, 87),
        ]
    };

    /// Textbook Romania road map; every road is a two-way car edge at 90 km/h
    pub fn romania_graph() -> BaseGraph {
        let mut graph = BaseGraph::new();
        for (lat, lon) in ROMANIA_CITIES {
            graph.add_node(GeoPoint::new(lat, lon));
        }

        let properties = EdgePropertyMap::new().with_access(TravelMode::Car, 90.0, false);
        for (from, to, km) in ROMANIA_ROADS {
            graph.add_edge_with_distance(from.into(), to.into(), kilometers!(km).to(), properties.clone());
        }
        graph
    }
}
