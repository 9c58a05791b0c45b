use std::sync::Arc;

use fxhash::FxHashMap;

use crate::{
    config::ProfileConfig, error::RoutingError, properties::property::TravelMode,
};

use super::{
    Weighting, addition::AdditionWeighting, fastest::FastestWeighting, priority::PriorityWeighting,
    shortest::ShortestWeighting,
};

/// Settings a weighting is constructed from
#[derive(Debug, Clone, Copy)]
pub struct WeightingParams {
    pub mode: TravelMode,
    pub max_speed: Option<f32>,
    pub distance_influence: Option<f64>,
}

impl WeightingParams {
    pub fn new(mode: TravelMode) -> Self {
        WeightingParams {
            mode,
            max_speed: None,
            distance_influence: None,
        }
    }
}

impl From<&ProfileConfig> for WeightingParams {
    fn from(profile: &ProfileConfig) -> Self {
        WeightingParams {
            mode: profile.mode,
            max_speed: profile.max_speed,
            distance_influence: profile.distance_influence,
        }
    }
}

pub type WeightingConstructor = fn(&WeightingParams) -> Arc<dyn Weighting>;

/// Weightings selectable by name from configuration or requests
pub struct WeightingRegistry {
    constructors: FxHashMap<String, WeightingConstructor>,
}

fn fastest(params: &WeightingParams) -> FastestWeighting {
    let mut weighting = FastestWeighting::new(params.mode);
    if let Some(max_speed) = params.max_speed {
        weighting = weighting.with_max_speed(max_speed);
    }
    if let Some(distance_influence) = params.distance_influence {
        weighting = weighting.with_distance_influence(distance_influence);
    }
    weighting
}

/// Travel time plus one unit per meter
fn short_fastest(params: &WeightingParams) -> AdditionWeighting<Arc<dyn Weighting>> {
    let time: Arc<dyn Weighting> = Arc::new(fastest(params));
    let distance: Arc<dyn Weighting> = Arc::new(ShortestWeighting::new(params.mode));
    AdditionWeighting::new(time, vec![distance])
}

impl WeightingRegistry {
    /// An empty registry
    pub fn new() -> Self {
        WeightingRegistry {
            constructors: FxHashMap::default(),
        }
    }

    pub fn register(&mut self, name: &str, constructor: WeightingConstructor) {
        self.constructors.insert(name.to_string(), constructor);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn create(&self, name: &str, params: &WeightingParams) -> Result<Arc<dyn Weighting>, RoutingError> {
        self.constructors
            .get(name)
            .map(|constructor| constructor(params))
            .ok_or_else(|| RoutingError::UnknownWeighting(name.to_string()))
    }
}

impl Default for WeightingRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register("shortest", |params| Arc::new(ShortestWeighting::new(params.mode)));
        registry.register("fastest", |params| Arc::new(fastest(params)));
        registry.register("priority", |params| {
            Arc::new(PriorityWeighting::with_fastest(params.mode, fastest(params)))
        });
        registry.register("short_fastest", |params| Arc::new(short_fastest(params)));
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_weightings_are_registered() {
        let registry = WeightingRegistry::default();
        assert_eq!(
            registry.names(),
            vec!["fastest", "priority", "short_fastest", "shortest"]
        );
        assert!(registry.create("fastest", &WeightingParams::new(TravelMode::Car)).is_ok());
    }

    #[test]
    fn unknown_names_are_rejected() {
        let registry = WeightingRegistry::default();
        let result = registry.create("curvature", &WeightingParams::new(TravelMode::Car));
        assert!(matches!(result, Err(RoutingError::UnknownWeighting(name)) if name == "curvature"));
    }

    #[test]
    fn custom_weightings_can_be_registered() {
        let mut registry = WeightingRegistry::new();
        registry.register("walk", |_| Arc::new(ShortestWeighting::new(TravelMode::Foot)));
        assert!(registry.contains("walk"));
        assert!(!registry.contains("fastest"));
    }
}
