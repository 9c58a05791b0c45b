use geojson::{Feature, Geometry, JsonObject, Value};

use crate::{
    distance::{Distance, Meters},
    geopoint::GeoPoint,
    types::EdgeId,
    weighting::{Milliseconds, Weight},
};

#[derive(Debug, Clone)]
pub struct RoutingPathLeg {
    distance: Distance<Meters>,
    time: Milliseconds,
    weight: Weight,
    points: Vec<GeoPoint>,
    edges: Vec<EdgeId>,
}

impl RoutingPathLeg {
    pub fn new(
        distance: Distance<Meters>,
        time: Milliseconds,
        weight: Weight,
        points: Vec<GeoPoint>,
        edges: Vec<EdgeId>,
    ) -> RoutingPathLeg {
        RoutingPathLeg {
            distance,
            time,
            weight,
            points,
            edges,
        }
    }

    pub fn distance(&self) -> Distance<Meters> {
        self.distance
    }

    pub fn time(&self) -> Milliseconds {
        self.time
    }

    pub fn weight(&self) -> Weight {
        self.weight
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    /// Base graph edges in travel order
    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }
}

#[derive(Debug, Clone)]
pub struct RoutingPath {
    legs: Vec<RoutingPathLeg>,
}

impl RoutingPath {
    pub fn new(legs: Vec<RoutingPathLeg>) -> RoutingPath {
        RoutingPath { legs }
    }

    pub fn legs(&self) -> &[RoutingPathLeg] {
        &self.legs
    }

    pub fn distance(&self) -> Distance<Meters> {
        self.legs.iter().map(|leg| leg.distance).sum()
    }

    pub fn time(&self) -> Milliseconds {
        self.legs
            .iter()
            .fold(0, |time: Milliseconds, leg| time.saturating_add(leg.time))
    }

    pub fn weight(&self) -> Weight {
        self.legs
            .iter()
            .fold(0, |weight: Weight, leg| weight.saturating_add(leg.weight))
    }

    pub fn edges(&self) -> Vec<EdgeId> {
        let mut edges: Vec<EdgeId> = Vec::new();
        for leg in &self.legs {
            for &edge_id in &leg.edges {
                if edges.last() != Some(&edge_id) {
                    edges.push(edge_id);
                }
            }
        }
        edges
    }

    /// Geometry of the whole path, the shared point between two legs kept once
    pub fn points(&self) -> Vec<GeoPoint> {
        let mut points: Vec<GeoPoint> = Vec::new();
        for leg in &self.legs {
            let skip = usize::from(!points.is_empty() && points.last() == leg.points.first());
            points.extend(leg.points.iter().skip(skip).copied());
        }
        points
    }

    pub fn to_geojson(&self) -> Feature {
        let coordinates: Vec<Vec<f64>> = self
            .points()
            .iter()
            .map(|point| vec![point.lon(), point.lat()])
            .collect();

        let mut properties = JsonObject::new();
        properties.insert("distance".to_string(), self.distance().value().into());
        properties.insert("time".to_string(), self.time().into());
        properties.insert("weight".to_string(), self.weight().into());

        Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::LineString(coordinates))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }
}
