use serde::Deserialize;

use crate::{geopoint::GeoPoint, routing::routing_request::RequestOptions};

#[derive(Debug, Clone, Deserialize)]
pub struct MapMatchRequest {
    pub profile: String,
    /// Observations in recording order
    pub points: Vec<GeoPoint>,
    #[serde(default)]
    pub options: RequestOptions,
}

impl MapMatchRequest {
    pub fn new(profile: &str, points: Vec<GeoPoint>) -> Self {
        MapMatchRequest {
            profile: profile.to_string(),
            points,
            options: RequestOptions::default(),
        }
    }
}
