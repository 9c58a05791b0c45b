use std::path::Path;

use anyhow::Context;
use meridian_routing::{config::RoutingConfig, generation::GraphGeneration, weighting::registry::WeightingRegistry};

pub fn load_config(path: Option<&Path>) -> Result<RoutingConfig, anyhow::Error> {
    let Some(path) = path else {
        return Ok(RoutingConfig::default());
    };

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read configuration {}", path.display()))?;
    let config = serde_json::from_str(&content)
        .with_context(|| format!("invalid configuration {}", path.display()))?;
    Ok(config)
}

/// Loads a graph directory as generation 0, building the hierarchies it lacks
pub fn load_generation(directory: &Path, config: &RoutingConfig) -> Result<GraphGeneration, anyhow::Error> {
    let registry = WeightingRegistry::default();
    let generation = GraphGeneration::load(0, directory, config, &registry)
        .with_context(|| format!("cannot load graph directory {}", directory.display()))?;
    Ok(generation)
}
