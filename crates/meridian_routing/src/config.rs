use std::time::Duration;

use serde::Deserialize;

use crate::{ch::contraction_params::ContractionParams, properties::property::TravelMode};

/// Service wide settings, built once at startup and handed to the engine
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub max_visited_nodes: usize,
    pub timeout_ms: Option<u64>,
    pub max_matrix_locations: usize,
    /// Radius in meters used to snap request locations onto the network
    pub snap_radius: Option<f64>,
    pub isochrone: IsochroneConfig,
    pub map_matching: MapMatchingConfig,
    pub contraction: ContractionParams,
    pub profiles: Vec<ProfileConfig>,
}

impl RoutingConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn profile(&self, name: &str) -> Option<&ProfileConfig> {
        self.profiles.iter().find(|profile| profile.name == name)
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        RoutingConfig {
            max_visited_nodes: 1_000_000,
            timeout_ms: None,
            max_matrix_locations: 200,
            snap_radius: None,
            isochrone: IsochroneConfig::default(),
            map_matching: MapMatchingConfig::default(),
            contraction: ContractionParams::default(),
            profiles: vec![
                ProfileConfig::new("car", "fastest", TravelMode::Car),
                ProfileConfig::new("bike", "priority", TravelMode::Bike),
                ProfileConfig::new("foot", "shortest", TravelMode::Foot),
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IsochroneConfig {
    /// Largest accepted time range, in seconds
    pub max_time_range: f64,
    /// Largest accepted distance range, in meters
    pub max_distance_range: f64,
    pub max_bands: usize,
    pub concavity: f64,
}

impl Default for IsochroneConfig {
    fn default() -> Self {
        IsochroneConfig {
            max_time_range: 3_600.0,
            max_distance_range: 100_000.0,
            max_bands: 10,
            concavity: 2.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MapMatchingConfig {
    /// Candidate search radius around each observation, in meters
    pub search_radius: f64,
    pub max_candidates: usize,
    /// Standard deviation of the GPS noise, in meters
    pub sigma_z: f64,
    pub beta: f64,
}

impl Default for MapMatchingConfig {
    fn default() -> Self {
        MapMatchingConfig {
            search_radius: 50.0,
            max_candidates: 8,
            sigma_z: 4.07,
            beta: 0.00959442,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileConfig {
    pub name: String,
    pub weighting: String,
    pub mode: TravelMode,
    #[serde(default = "default_true")]
    pub ch: bool,
    #[serde(default)]
    pub traffic: bool,
    #[serde(default)]
    pub max_speed: Option<f32>,
    #[serde(default)]
    pub distance_influence: Option<f64>,
    /// Landmarks prepared for ALT searches, none when 0
    #[serde(default)]
    pub landmarks: usize,
}

fn default_true() -> bool {
    true
}

impl ProfileConfig {
    pub fn new(name: &str, weighting: &str, mode: TravelMode) -> Self {
        ProfileConfig {
            name: name.to_string(),
            weighting: weighting.to_string(),
            mode,
            ch: true,
            traffic: false,
            max_speed: None,
            distance_influence: None,
            landmarks: 0,
        }
    }

    pub fn with_ch(mut self, ch: bool) -> Self {
        self.ch = ch;
        self
    }

    pub fn with_traffic(mut self, traffic: bool) -> Self {
        self.traffic = traffic;
        self
    }

    pub fn with_landmarks(mut self, landmarks: usize) -> Self {
        self.landmarks = landmarks;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: RoutingConfig = serde_json::from_str(
            r#"{
                "max_visited_nodes": 42,
                "contraction": { "witness_search_limit": 10 },
                "profiles": [
                    { "name": "car", "weighting": "fastest", "mode": "car" },
                    { "name": "foot", "weighting": "shortest", "mode": "foot", "ch": false, "landmarks": 8 }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.max_visited_nodes, 42);
        assert_eq!(config.contraction.witness_search_limit, 10);
        assert_eq!(config.contraction.priority_witness_search_limit, 50);
        assert_eq!(config.map_matching.sigma_z, 4.07);
        assert_eq!(config.profiles.len(), 2);
        assert!(config.profiles[0].ch);
        assert!(!config.profiles[0].traffic);
        assert_eq!(config.profiles[0].landmarks, 0);
        assert_eq!(config.profiles[1].landmarks, 8);
    }
}
