use std::path::{Path, PathBuf};

use fxhash::FxHashMap;
use tracing::info;

use crate::{
    base_graph::BaseGraph,
    ch::{ch_preparation::CHPreparation, ch_storage::CHStorage},
    config::RoutingConfig,
    landmarks::{landmark_storage::LandmarkStorage, lm_preparation::LMPreparation},
    error::{PreparationError, StorageError},
    graph::Graph,
    location_index::LocationIndex,
    stopwatch::Stopwatch,
    weighting::registry::{WeightingParams, WeightingRegistry},
};

pub const GRAPH_FILE_NAME: &str = "graph.bin";

pub fn ch_file_name(profile: &str) -> String {
    format!("ch_{}.bin", profile)
}

pub fn lm_file_name(profile: &str) -> String {
    format!("lm_{}.bin", profile)
}

/// Immutable snapshot of everything queries read: the base graph, its location index and
/// the hierarchies and landmarks prepared on it. A new generation is built aside and
/// swapped in whole.
pub struct GraphGeneration {
    id: u64,
    graph: BaseGraph,
    index: LocationIndex,
    hierarchies: FxHashMap<String, CHStorage>,
    landmarks: FxHashMap<String, LandmarkStorage>,
}

impl GraphGeneration {
    pub fn new(id: u64, graph: BaseGraph) -> Self {
        let mut stopwatch = Stopwatch::started("location_index");
        let index = LocationIndex::build_from_graph(&graph);
        stopwatch.stop();
        stopwatch.report();

        GraphGeneration {
            id,
            graph,
            index,
            hierarchies: FxHashMap::default(),
            landmarks: FxHashMap::default(),
        }
    }

    /// Attaches a hierarchy, rejecting one prepared on another graph
    pub fn with_ch(mut self, storage: CHStorage) -> Result<Self, StorageError> {
        storage.ensure_built_for(&self.graph)?;
        self.hierarchies.insert(storage.metadata().profile.clone(), storage);
        Ok(self)
    }

    /// Attaches landmarks, rejecting ones prepared on another graph
    pub fn with_landmarks(mut self, storage: LandmarkStorage) -> Result<Self, StorageError> {
        storage.ensure_built_for(&self.graph)?;
        self.landmarks.insert(storage.metadata().profile.clone(), storage);
        Ok(self)
    }

    /// Prepares the hierarchy and the landmarks of every profile that asks for them
    pub fn prepare(
        id: u64,
        graph: BaseGraph,
        config: &RoutingConfig,
        registry: &WeightingRegistry,
    ) -> Result<Self, PreparationError> {
        let mut generation = GraphGeneration::new(id, graph);
        let preparation = CHPreparation::new(&generation.graph, config.contraction);

        let mut hierarchies = FxHashMap::default();
        let mut landmarks = FxHashMap::default();
        for profile in &config.profiles {
            if !profile.ch && profile.landmarks == 0 {
                continue;
            }
            let weighting = registry
                .create(&profile.weighting, &WeightingParams::from(profile))
                .map_err(|error| PreparationError::InvalidWeighting(error.to_string()))?;

            if profile.ch {
                let storage = preparation.prepare(&profile.name, &profile.weighting, weighting.as_ref())?;
                hierarchies.insert(profile.name.clone(), storage);
            }
            if profile.landmarks > 0 {
                let storage = LMPreparation::new(&generation.graph, profile.landmarks).prepare(
                    &profile.name,
                    &profile.weighting,
                    weighting.as_ref(),
                )?;
                landmarks.insert(profile.name.clone(), storage);
            }
        }

        generation.hierarchies = hierarchies;
        generation.landmarks = landmarks;
        Ok(generation)
    }

    /// Loads `graph.bin` from `directory` with the hierarchies stored next to it,
    /// preparing and saving the ones that are missing or stale
    pub fn load(
        id: u64,
        directory: &Path,
        config: &RoutingConfig,
        registry: &WeightingRegistry,
    ) -> Result<Self, PreparationError> {
        let graph = BaseGraph::from_file(&directory.join(GRAPH_FILE_NAME))?;
        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            directory = %directory.display(),
            "graph loaded"
        );

        let mut generation = GraphGeneration::new(id, graph);
        let preparation = CHPreparation::new(&generation.graph, config.contraction);

        let mut hierarchies = FxHashMap::default();
        let mut landmarks = FxHashMap::default();
        for profile in &config.profiles {
            if !profile.ch && profile.landmarks == 0 {
                continue;
            }
            let weighting = registry
                .create(&profile.weighting, &WeightingParams::from(profile))
                .map_err(|error| PreparationError::InvalidWeighting(error.to_string()))?;

            if profile.ch {
                let path: PathBuf = directory.join(ch_file_name(&profile.name));
                let storage = preparation.load_or_build(&path, &profile.name, &profile.weighting, weighting.as_ref())?;
                hierarchies.insert(profile.name.clone(), storage);
            }
            if profile.landmarks > 0 {
                let path: PathBuf = directory.join(lm_file_name(&profile.name));
                let storage = LMPreparation::new(&generation.graph, profile.landmarks).load_or_build(
                    &path,
                    &profile.name,
                    &profile.weighting,
                    weighting.as_ref(),
                )?;
                landmarks.insert(profile.name.clone(), storage);
            }
        }

        generation.hierarchies = hierarchies;
        generation.landmarks = landmarks;
        Ok(generation)
    }

    /// Writes the graph, every hierarchy and every set of landmarks into `directory`
    pub fn save(&self, directory: &Path) -> Result<(), StorageError> {
        std::fs::create_dir_all(directory).map_err(|source| StorageError::Io {
            path: directory.display().to_string(),
            source,
        })?;

        self.graph.save_to_file(&directory.join(GRAPH_FILE_NAME))?;
        for (profile, storage) in &self.hierarchies {
            storage.save_to_file(&directory.join(ch_file_name(profile)))?;
        }
        for (profile, storage) in &self.landmarks {
            storage.save_to_file(&directory.join(lm_file_name(profile)))?;
        }
        Ok(())
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn graph(&self) -> &BaseGraph {
        &self.graph
    }

    pub fn index(&self) -> &LocationIndex {
        &self.index
    }

    pub fn ch(&self, profile: &str) -> Option<&CHStorage> {
        self.hierarchies.get(profile)
    }

    pub fn ch_profiles(&self) -> Vec<&str> {
        let mut profiles: Vec<&str> = self.hierarchies.keys().map(String::as_str).collect();
        profiles.sort_unstable();
        profiles
    }

    pub fn landmarks(&self, profile: &str) -> Option<&LandmarkStorage> {
        self.landmarks.get(profile)
    }

    pub fn lm_profiles(&self) -> Vec<&str> {
        let mut profiles: Vec<&str> = self.landmarks.keys().map(String::as_str).collect();
        profiles.sort_unstable();
        profiles
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        ch::{
            ch_graph_builder::CHGraphBuilder, ch_query::CHQuery, ch_storage::CHMetadata,
            contraction_params::ContractionParams,
        },
        config::ProfileConfig,
        properties::property::TravelMode,
        routing::{
            astar::Dijkstra,
            shortest_path_algorithm::{CalcPathOptions, ShortestPathAlgorithm},
        },
        test_graph_utils::test_graph::{grid_graph, temp_file_path},
        weighting::fastest::FastestWeighting,
    };

    use super::*;

    fn config() -> RoutingConfig {
        RoutingConfig {
            profiles: vec![
                ProfileConfig::new("car", "fastest", TravelMode::Car).with_landmarks(2),
                ProfileConfig::new("foot", "shortest", TravelMode::Foot).with_ch(false),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn prepares_ch_enabled_profiles() {
        let graph = grid_graph(4, 4, 0.001, TravelMode::Car, 50.0);
        let generation = GraphGeneration::prepare(3, graph, &config(), &WeightingRegistry::default()).unwrap();

        assert_eq!(generation.id(), 3);
        assert_eq!(generation.ch_profiles(), vec!["car"]);
        assert!(generation.ch("foot").is_none());
        assert_eq!(generation.lm_profiles(), vec!["car"]);
        assert_eq!(generation.landmarks("car").unwrap().landmark_count(), 2);
    }

    #[test]
    fn saves_and_loads_directory() {
        let directory = temp_file_path("generation");
        let graph = grid_graph(3, 3, 0.001, TravelMode::Car, 50.0);
        GraphGeneration::prepare(1, graph, &config(), &WeightingRegistry::default())
            .unwrap()
            .save(&directory)
            .unwrap();

        let loaded = GraphGeneration::load(2, &directory, &config(), &WeightingRegistry::default()).unwrap();
        assert_eq!(loaded.graph().node_count(), 9);
        assert_eq!(loaded.ch("car").unwrap().metadata().base_node_count, 9);
        assert!(directory.join(lm_file_name("car")).exists());
        assert_eq!(loaded.landmarks("car").unwrap().metadata().base_node_count, 9);

        std::fs::remove_dir_all(&directory).unwrap();
    }

    #[test]
    fn reloading_with_new_profile_parameters_rebuilds_preparations() {
        let directory = temp_file_path("generation_parameters");
        let registry = WeightingRegistry::default();
        let graph = grid_graph(3, 3, 0.001, TravelMode::Car, 50.0);
        GraphGeneration::prepare(1, graph, &config(), &registry)
            .unwrap()
            .save(&directory)
            .unwrap();

        let mut capped = config();
        capped.profiles[0].max_speed = Some(30.0);
        let loaded = GraphGeneration::load(2, &directory, &capped, &registry).unwrap();

        let weighting = registry
            .create("fastest", &WeightingParams::from(&capped.profiles[0]))
            .unwrap();
        let options = CalcPathOptions::default();
        let ch = CHQuery::new(loaded.ch("car").unwrap())
            .calc_path(0, 8, &options)
            .unwrap();
        let flexible = Dijkstra::new(loaded.graph(), weighting.as_ref())
            .calc_path(0, 8, &options)
            .unwrap();
        assert_eq!(ch.path.weight, flexible.path.weight);
        assert_eq!(ch.path.time, flexible.path.time);
        assert!(
            loaded
                .landmarks("car")
                .unwrap()
                .ensure_weights_of(loaded.graph(), weighting.as_ref())
                .is_ok()
        );

        std::fs::remove_dir_all(&directory).unwrap();
    }

    #[test]
    fn rejects_hierarchy_of_other_graph() {
        let small = grid_graph(2, 2, 0.001, TravelMode::Car, 50.0);
        let storage = CHGraphBuilder::new(&small, ContractionParams::default())
            .build(&FastestWeighting::new(TravelMode::Car), CHMetadata::new("car", "fastest", &small))
            .unwrap();

        let generation = GraphGeneration::new(1, grid_graph(3, 3, 0.001, TravelMode::Car, 50.0));
        assert!(matches!(
            generation.with_ch(storage),
            Err(StorageError::GraphMismatch(_))
        ));
    }
}
