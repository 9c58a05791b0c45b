use crate::weighting::{Milliseconds, Weight};

pub const INVALID_NODE: usize = usize::MAX;
pub const INVALID_EDGE: usize = usize::MAX;

/// Weight of an edge that cannot be traversed. Never relaxed, never summed.
pub const MAX_WEIGHT: Weight = u32::MAX;
pub const MAX_DURATION: Milliseconds = u32::MAX;

/// Matrix sentinel for a pair without any route
pub const NO_ROUTE: Weight = MAX_WEIGHT;

pub(crate) const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

pub(crate) const METERS_PER_DEGREE_LAT: f64 = 111_320.0;
