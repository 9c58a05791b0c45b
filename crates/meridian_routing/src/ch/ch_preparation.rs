use std::path::Path;

use tracing::{info, warn};

use crate::{
    base_graph::BaseGraph,
    error::{PreparationError, StorageError},
    stopwatch::Stopwatch,
    weighting::Weighting,
};

use super::{
    ch_graph_builder::CHGraphBuilder,
    ch_storage::{CHMetadata, CHStorage},
    contraction_params::ContractionParams,
};

/// Prepares hierarchies of one base graph and caches them on disk
pub struct CHPreparation<'a> {
    base_graph: &'a BaseGraph,
    params: ContractionParams,
}

impl<'a> CHPreparation<'a> {
    pub fn new(base_graph: &'a BaseGraph, params: ContractionParams) -> Self {
        CHPreparation { base_graph, params }
    }

    pub fn prepare<W>(&self, profile: &str, weighting_name: &str, weighting: &W) -> Result<CHStorage, PreparationError>
    where
        W: Weighting + ?Sized,
    {
        let mut stopwatch = Stopwatch::started("ch_preparation");
        let storage = CHGraphBuilder::new(self.base_graph, self.params)
            .build(weighting, CHMetadata::new(profile, weighting_name, self.base_graph))?;
        stopwatch.stop();

        info!(
            profile,
            weighting = weighting_name,
            shortcuts = storage.shortcut_count(),
            duration_ms = stopwatch.total_duration().as_millis() as u64,
            "ch prepared"
        );
        Ok(storage)
    }

    /// Loads the hierarchy stored at `path`, rebuilding and saving it when missing,
    /// corrupt, or prepared for another profile, graph or set of edge costs.
    pub fn load_or_build<W>(
        &self,
        path: &Path,
        profile: &str,
        weighting_name: &str,
        weighting: &W,
    ) -> Result<CHStorage, PreparationError>
    where
        W: Weighting + ?Sized,
    {
        if path.exists() {
            match self.load(path, profile, weighting_name, weighting) {
                Ok(storage) => {
                    info!(profile, path = %path.display(), "ch loaded");
                    return Ok(storage);
                }
                Err(err) => warn!(profile, path = %path.display(), %err, "discarding ch artifact"),
            }
        }

        let storage = self.prepare(profile, weighting_name, weighting)?;
        storage.save_to_file(path)?;
        Ok(storage)
    }

    fn load<W>(&self, path: &Path, profile: &str, weighting_name: &str, weighting: &W) -> Result<CHStorage, StorageError>
    where
        W: Weighting + ?Sized,
    {
        let storage = CHStorage::from_file(path)?;

        let metadata = storage.metadata();
        if metadata.profile != profile || metadata.weighting != weighting_name {
            return Err(StorageError::CorruptArtifact(format!(
                "prepared for {}/{}, expected {}/{}",
                metadata.profile, metadata.weighting, profile, weighting_name
            )));
        }

        storage.ensure_weights_of(self.base_graph, weighting)?;
        Ok(storage)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        ch::ch_edge::CHEdge,
        edge_direction::EdgeDirection,
        graph::Graph,
        properties::property::TravelMode,
        test_graph_utils::test_graph::{grid_graph, temp_file_path},
        weighting::{fastest::FastestWeighting, shortest::ShortestWeighting},
    };

    use super::*;

    #[test]
    fn builds_then_reuses_artifact() {
        let graph = grid_graph(4, 4, 0.001, TravelMode::Car, 50.0);
        let weighting = FastestWeighting::new(TravelMode::Car);
        let preparation = CHPreparation::new(&graph, ContractionParams::default());
        let path = temp_file_path("ch_reuse.bin");
        let _ = std::fs::remove_file(&path);

        let built = preparation
            .load_or_build(&path, "car", "fastest", &weighting)
            .unwrap();
        assert!(path.exists());

        let loaded = preparation
            .load_or_build(&path, "car", "fastest", &weighting)
            .unwrap();
        assert_eq!(loaded.metadata(), built.metadata());
        assert_eq!(loaded.edge_count(), built.edge_count());

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn rebuilds_artifact_of_other_profile() {
        let graph = grid_graph(3, 3, 0.001, TravelMode::Car, 50.0);
        let preparation = CHPreparation::new(&graph, ContractionParams::default());
        let path = temp_file_path("ch_other_profile.bin");

        preparation
            .prepare("car", "fastest", &FastestWeighting::new(TravelMode::Car))
            .unwrap()
            .save_to_file(&path)
            .unwrap();

        let rebuilt = preparation
            .load_or_build(&path, "car_short", "shortest", &ShortestWeighting::new(TravelMode::Car))
            .unwrap();
        assert_eq!(rebuilt.metadata().weighting, "shortest");
        assert_eq!(
            CHStorage::from_file(&path).unwrap().metadata().profile,
            "car_short"
        );

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn rebuilds_corrupt_artifact() {
        let graph = grid_graph(3, 3, 0.001, TravelMode::Car, 50.0);
        let preparation = CHPreparation::new(&graph, ContractionParams::default());
        let path = temp_file_path("ch_corrupt.bin");
        std::fs::write(&path, b"not an archive").unwrap();

        let storage = preparation
            .load_or_build(&path, "car", "fastest", &FastestWeighting::new(TravelMode::Car))
            .unwrap();
        assert_eq!(storage.node_count(), 9);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn rebuilds_artifact_with_stale_edge_costs() {
        let graph = grid_graph(3, 3, 0.001, TravelMode::Car, 50.0);
        let preparation = CHPreparation::new(&graph, ContractionParams::default());
        let path = temp_file_path("ch_stale_costs.bin");

        preparation
            .prepare("car", "fastest", &FastestWeighting::new(TravelMode::Car))
            .unwrap()
            .save_to_file(&path)
            .unwrap();

        let capped = FastestWeighting::new(TravelMode::Car).with_max_speed(30.0);
        let stored = CHStorage::from_file(&path).unwrap();
        assert!(matches!(
            stored.ensure_weights_of(&graph, &capped),
            Err(StorageError::GraphMismatch(_))
        ));

        let rebuilt = preparation
            .load_or_build(&path, "car", "fastest", &capped)
            .unwrap();
        let expected = capped.calc_edge_weight(graph.edge(0), EdgeDirection::Forward);
        match rebuilt.edge(0) {
            CHEdge::Base(edge) => assert_eq!(edge.forward_weight, expected),
            CHEdge::Shortcut(_) => panic!("edge 0 must be a base edge"),
        }
        assert!(
            CHStorage::from_file(&path)
                .unwrap()
                .ensure_weights_of(&graph, &capped)
                .is_ok()
        );

        std::fs::remove_file(&path).unwrap();
    }
}
