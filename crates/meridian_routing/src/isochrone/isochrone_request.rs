use serde::Deserialize;

use crate::{geopoint::GeoPoint, routing::routing_request::RequestOptions};

use super::TravelRangeType;

#[derive(Debug, Clone, Deserialize)]
pub struct IsochroneRequest {
    pub profile: String,
    pub location: GeoPoint,
    pub range_type: TravelRangeType,
    /// Seconds or meters, one band per range
    pub ranges: Vec<f64>,
    #[serde(default)]
    pub options: RequestOptions,
}

impl IsochroneRequest {
    pub fn new(profile: &str, location: GeoPoint, range_type: TravelRangeType, ranges: Vec<f64>) -> Self {
        IsochroneRequest {
            profile: profile.to_string(),
            location,
            range_type,
            ranges,
            options: RequestOptions::default(),
        }
    }
}
