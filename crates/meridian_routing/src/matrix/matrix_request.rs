use serde::Deserialize;

use crate::{geopoint::GeoPoint, routing::routing_request::RequestOptions};

#[derive(Debug, Clone, Deserialize)]
pub struct MatrixRequest {
    pub profile: String,
    pub sources: Vec<GeoPoint>,
    pub targets: Vec<GeoPoint>,
    #[serde(default)]
    pub options: RequestOptions,
}

impl MatrixRequest {
    pub fn new(profile: &str, sources: Vec<GeoPoint>, targets: Vec<GeoPoint>) -> Self {
        MatrixRequest {
            profile: profile.to_string(),
            sources,
            targets,
            options: RequestOptions::default(),
        }
    }
}
