use serde::{Deserialize, Serialize};

use crate::{
    constants::EARTH_RADIUS_METERS,
    distance::{Distance, Meters},
};

#[derive(
    Copy, Clone, Debug, PartialEq, Serialize, Deserialize, rkyv::Archive, rkyv::Serialize, rkyv::Deserialize,
)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ele: Option<f64>,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        GeoPoint {
            lat,
            lon,
            ele: None,
        }
    }

    pub fn with_elevation(lat: f64, lon: f64, ele: f64) -> Self {
        GeoPoint {
            lat,
            lon,
            ele: Some(ele),
        }
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    pub fn elevation(&self) -> Option<f64> {
        self.ele
    }

    pub fn haversine_distance(&self, other: &GeoPoint) -> Distance<Meters> {
        Distance::from(haversine_distance(self.lat, self.lon, other.lat, other.lon))
    }

    /// Point at `fraction` of the straight segment between `self` and `other`
    pub fn interpolate(&self, other: &GeoPoint, fraction: f64) -> GeoPoint {
        let ele = match (self.ele, other.ele) {
            (Some(a), Some(b)) => Some(a + (b - a) * fraction),
            _ => None,
        };

        GeoPoint {
            lat: self.lat + (other.lat - self.lat) * fraction,
            lon: self.lon + (other.lon - self.lon) * fraction,
            ele,
        }
    }
}

pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1 = lat1.to_radians();
    let lat2 = lat2.to_radians();
    let delta_lat = lat2 - lat1;
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

impl From<&GeoPoint> for geo::Point {
    fn from(value: &GeoPoint) -> Self {
        geo::Point::new(value.lon, value.lat)
    }
}

impl From<GeoPoint> for geo::Coord {
    fn from(value: GeoPoint) -> Self {
        geo::Coord {
            x: value.lon,
            y: value.lat,
        }
    }
}

impl From<geo::Point> for GeoPoint {
    fn from(value: geo::Point) -> Self {
        GeoPoint::new(value.y(), value.x())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_distance_of_one_degree_latitude() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(1.0, 0.0);
        let distance = a.haversine_distance(&b).value();
        assert!((distance - 111_195.0).abs() < 1.0, "{}", distance);
    }

    #[test]
    fn interpolates_midpoint() {
        let a = GeoPoint::with_elevation(10.0, 20.0, 100.0);
        let b = GeoPoint::with_elevation(12.0, 22.0, 200.0);
        let mid = a.interpolate(&b, 0.5);
        assert_eq!(mid.lat, 11.0);
        assert_eq!(mid.lon, 21.0);
        assert_eq!(mid.ele, Some(150.0));
    }

    #[test]
    fn converts_to_geo_point_as_lon_lat() {
        let point: geo::Point = (&GeoPoint::new(48.0, 2.0)).into();
        assert_eq!(point.x(), 2.0);
        assert_eq!(point.y(), 48.0);
    }
}
