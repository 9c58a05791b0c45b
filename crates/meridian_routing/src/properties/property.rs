use serde::{Deserialize, Serialize};

#[derive(
    Eq,
    Hash,
    PartialEq,
    Clone,
    Copy,
    Debug,
    Serialize,
    Deserialize,
    rkyv::Archive,
    rkyv::Serialize,
    rkyv::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    Car,
    Bike,
    Foot,
}

impl TravelMode {
    /// Highest speed any edge is traversed at, in km/h
    pub fn max_speed(&self) -> f32 {
        match self {
            TravelMode::Car => 140.0,
            TravelMode::Bike => 30.0,
            TravelMode::Foot => 6.0,
        }
    }
}

/// Attributes encoded on an edge. Direction dependent properties are stored per direction.
#[derive(Eq, Hash, PartialEq, Clone, Copy, Debug, rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub enum Property {
    Access(TravelMode),
    /// km/h
    AverageSpeed(TravelMode),
    /// 0 (avoid) to 7 (best)
    Priority(TravelMode),
    Surface,
    TrackType,
    Smoothness,
    OsmId,
}

impl Property {
    pub fn as_string(&self) -> String {
        match self {
            Property::Access(mode) => format!("{:?}_access", mode).to_lowercase(),
            Property::AverageSpeed(mode) => format!("{:?}_average_speed", mode).to_lowercase(),
            Property::Priority(mode) => format!("{:?}_priority", mode).to_lowercase(),
            Property::Surface => "surface".to_string(),
            Property::TrackType => "track_type".to_string(),
            Property::Smoothness => "smoothness".to_string(),
            Property::OsmId => "osm_id".to_string(),
        }
    }
}
