use std::path::Path;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::{
    base_graph::BaseGraph,
    constants::MAX_WEIGHT,
    error::{PreparationError, StorageError},
    graph::Graph,
    routing::{
        dijkstra_search::DijkstraSearch, search_budget::SearchBudget,
        search_direction::SearchDirection,
    },
    stopwatch::Stopwatch,
    types::NodeId,
    weighting::{Weight, Weighting},
};

use super::landmark_storage::{LMMetadata, Landmark, LandmarkStorage};

/// Picks landmarks on one base graph and computes their weight tables
pub struct LMPreparation<'a> {
    base_graph: &'a BaseGraph,
    landmark_count: usize,
}

impl<'a> LMPreparation<'a> {
    pub fn new(base_graph: &'a BaseGraph, landmark_count: usize) -> Self {
        LMPreparation {
            base_graph,
            landmark_count,
        }
    }

    pub fn prepare<W>(&self, profile: &str, weighting_name: &str, weighting: &W) -> Result<LandmarkStorage, PreparationError>
    where
        W: Weighting + ?Sized,
    {
        let mut stopwatch = Stopwatch::started("lm_preparation");
        let landmark_nodes = self.find_landmarks(weighting)?;
        debug!(profile, ?landmark_nodes, "landmarks selected");

        let landmarks = landmark_nodes
            .par_iter()
            .map(|&node_id| self.create_landmark(weighting, node_id))
            .collect::<Result<Vec<Landmark>, PreparationError>>()?;
        stopwatch.stop();

        info!(
            profile,
            weighting = weighting_name,
            landmarks = landmarks.len(),
            duration_ms = stopwatch.total_duration().as_millis() as u64,
            "landmarks prepared"
        );
        Ok(LandmarkStorage::new(
            LMMetadata::new(profile, weighting_name, self.base_graph),
            landmarks,
        ))
    }

    /// Loads the landmarks stored at `path`, rebuilding and saving them when missing,
    /// corrupt, or prepared for another profile, graph or set of edge costs.
    pub fn load_or_build<W>(
        &self,
        path: &Path,
        profile: &str,
        weighting_name: &str,
        weighting: &W,
    ) -> Result<LandmarkStorage, PreparationError>
    where
        W: Weighting + ?Sized,
    {
        if path.exists() {
            match self.load(path, profile, weighting_name, weighting) {
                Ok(storage) => {
                    info!(profile, path = %path.display(), "landmarks loaded");
                    return Ok(storage);
                }
                Err(err) => warn!(profile, path = %path.display(), %err, "discarding landmark artifact"),
            }
        }

        let storage = self.prepare(profile, weighting_name, weighting)?;
        storage.save_to_file(path)?;
        Ok(storage)
    }

    fn load<W>(&self, path: &Path, profile: &str, weighting_name: &str, weighting: &W) -> Result<LandmarkStorage, StorageError>
    where
        W: Weighting + ?Sized,
    {
        let storage = LandmarkStorage::from_file(path)?;

        let metadata = storage.metadata();
        if metadata.profile != profile || metadata.weighting != weighting_name {
            return Err(StorageError::CorruptArtifact(format!(
                "prepared for {}/{}, expected {}/{}",
                metadata.profile, metadata.weighting, profile, weighting_name
            )));
        }
        if storage.landmark_count() != self.landmark_count.min(self.base_graph.node_count()) {
            return Err(StorageError::CorruptArtifact(format!(
                "holds {} landmarks, expected {}",
                storage.landmark_count(),
                self.landmark_count
            )));
        }

        storage.ensure_weights_of(self.base_graph, weighting)?;
        Ok(storage)
    }

    /// Farthest landmark selection: the first landmark is the node farthest from node 0,
    /// every next one the node farthest from all landmarks chosen so far. A node no
    /// landmark reaches starts the next round instead, so each component gets covered.
    fn find_landmarks<W>(&self, weighting: &W) -> Result<Vec<NodeId>, PreparationError>
    where
        W: Weighting + ?Sized,
    {
        let node_count = self.base_graph.node_count();
        let mut landmarks: Vec<NodeId> = Vec::with_capacity(self.landmark_count);
        if node_count == 0 {
            return Ok(landmarks);
        }

        let mut search = DijkstraSearch::new(self.base_graph, weighting);
        let mut budget = SearchBudget::unlimited();
        let mut seeds: Vec<NodeId> = vec![0];

        while landmarks.len() < self.landmark_count.min(node_count) {
            let farthest = search
                .calc_tree(&seeds, SearchDirection::Forward, &mut budget)
                .map_err(|err| PreparationError::Validation(err.to_string()))?;

            let unreached = (0..node_count).find(|&node| search.tree().entry(node).is_none());
            let next = match (unreached, farthest) {
                (Some(node), _) if !landmarks.is_empty() => {
                    // farthest within the component of the unreached node
                    search
                        .calc_tree(&[node], SearchDirection::Forward, &mut budget)
                        .map_err(|err| PreparationError::Validation(err.to_string()))?
                        .unwrap_or(node)
                }
                (_, Some(node)) => node,
                (Some(node), None) => node,
                (None, None) => break,
            };

            if landmarks.contains(&next) {
                match (0..node_count).find(|node| !landmarks.contains(node)) {
                    Some(node) => landmarks.push(node),
                    None => break,
                }
            } else {
                landmarks.push(next);
            }
            seeds.clone_from(&landmarks);
        }

        Ok(landmarks)
    }

    fn create_landmark<W>(&self, weighting: &W, node_id: NodeId) -> Result<Landmark, PreparationError>
    where
        W: Weighting + ?Sized,
    {
        let mut search = DijkstraSearch::new(self.base_graph, weighting);
        let mut budget = SearchBudget::unlimited();
        let mut table = |direction: SearchDirection| -> Result<Vec<Weight>, PreparationError> {
            search
                .calc_tree(&[node_id], direction, &mut budget)
                .map_err(|err| PreparationError::Validation(err.to_string()))?;
            Ok((0..self.base_graph.node_count())
                .map(|node| {
                    search
                        .tree()
                        .entry(node)
                        .map_or(MAX_WEIGHT, |entry| entry.weight)
                })
                .collect())
        };

        let weight_from_landmark = table(SearchDirection::Forward)?;
        let weight_to_landmark = table(SearchDirection::Backward)?;
        Ok(Landmark::new(node_id, weight_from_landmark, weight_to_landmark))
    }
}
