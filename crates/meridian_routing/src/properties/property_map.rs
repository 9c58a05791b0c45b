use crate::{edge_direction::EdgeDirection, properties::property::Property};

use super::property::TravelMode;

#[derive(Clone, Copy, Debug, PartialEq, rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub enum PropertyValue {
    Bool(bool),
    U8(u8),
    F32(f32),
    Usize(usize),
}

#[derive(Clone, Debug, Default, rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
struct PropertyList(Vec<(Property, PropertyValue)>);

impl PropertyList {
    fn get(&self, property: &Property) -> Option<PropertyValue> {
        self.0
            .iter()
            .find(|(p, _)| p == property)
            .map(|(_, value)| *value)
    }

    fn set(&mut self, property: Property, value: PropertyValue) {
        match self.0.iter_mut().find(|(p, _)| *p == property) {
            Some(entry) => entry.1 = value,
            None => self.0.push((property, value)),
        }
    }
}

/// Encoded attribute payload of an edge.
///
/// Values are read with the `get_*` accessors; a value stored with another type
/// than the one requested reads as `None`.
#[derive(Clone, Debug, Default, rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct EdgePropertyMap {
    forward: PropertyList,
    backward: PropertyList,
    shared: PropertyList,
}

impl EdgePropertyMap {
    pub fn new() -> EdgePropertyMap {
        Self::default()
    }

    pub const fn empty() -> EdgePropertyMap {
        EdgePropertyMap {
            forward: PropertyList(Vec::new()),
            backward: PropertyList(Vec::new()),
            shared: PropertyList(Vec::new()),
        }
    }

    /// Access and speed for one travel mode, in both directions unless `oneway`
    pub fn with_access(mut self, mode: TravelMode, speed_kmh: f32, oneway: bool) -> Self {
        self.insert_bool(Property::Access(mode), EdgeDirection::Forward, true);
        self.insert_f32(Property::AverageSpeed(mode), EdgeDirection::Forward, speed_kmh);
        self.insert_bool(Property::Access(mode), EdgeDirection::Backward, !oneway);
        self.insert_f32(Property::AverageSpeed(mode), EdgeDirection::Backward, speed_kmh);
        self
    }

    pub fn with_priority(mut self, mode: TravelMode, priority: u8) -> Self {
        self.insert_u8(Property::Priority(mode), EdgeDirection::Forward, priority);
        self.insert_u8(Property::Priority(mode), EdgeDirection::Backward, priority);
        self
    }

    fn list(&self, direction: EdgeDirection) -> &PropertyList {
        match direction {
            EdgeDirection::Forward => &self.forward,
            EdgeDirection::Backward => &self.backward,
        }
    }

    fn list_mut(&mut self, direction: EdgeDirection) -> &mut PropertyList {
        match direction {
            EdgeDirection::Forward => &mut self.forward,
            EdgeDirection::Backward => &mut self.backward,
        }
    }

    /// The same attributes seen from the other end of the edge
    pub fn reversed(&self) -> EdgePropertyMap {
        EdgePropertyMap {
            forward: self.backward.clone(),
            backward: self.forward.clone(),
            shared: self.shared.clone(),
        }
    }

    pub fn get_bool(&self, property: Property, direction: EdgeDirection) -> Option<bool> {
        match self.list(direction).get(&property)? {
            PropertyValue::Bool(value) => Some(value),
            _ => None,
        }
    }

    pub fn get_u8(&self, property: Property, direction: EdgeDirection) -> Option<u8> {
        match self.list(direction).get(&property)? {
            PropertyValue::U8(value) => Some(value),
            _ => None,
        }
    }

    pub fn get_f32(&self, property: Property, direction: EdgeDirection) -> Option<f32> {
        match self.list(direction).get(&property)? {
            PropertyValue::F32(value) => Some(value),
            _ => None,
        }
    }

    pub fn get_shared_u8(&self, property: Property) -> Option<u8> {
        match self.shared.get(&property)? {
            PropertyValue::U8(value) => Some(value),
            _ => None,
        }
    }

    pub fn get_usize(&self, property: Property) -> Option<usize> {
        match self.shared.get(&property)? {
            PropertyValue::Usize(value) => Some(value),
            _ => None,
        }
    }

    pub fn insert_bool(&mut self, property: Property, direction: EdgeDirection, value: bool) {
        self.list_mut(direction)
            .set(property, PropertyValue::Bool(value));
    }

    pub fn insert_u8(&mut self, property: Property, direction: EdgeDirection, value: u8) {
        self.list_mut(direction).set(property, PropertyValue::U8(value));
    }

    pub fn insert_f32(&mut self, property: Property, direction: EdgeDirection, value: f32) {
        self.list_mut(direction).set(property, PropertyValue::F32(value));
    }

    pub fn insert_shared_u8(&mut self, property: Property, value: u8) {
        self.shared.set(property, PropertyValue::U8(value));
    }

    pub fn insert_usize(&mut self, property: Property, value: usize) {
        self.shared.set(property, PropertyValue::Usize(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oneway_access_is_direction_dependent() {
        let properties = EdgePropertyMap::new().with_access(TravelMode::Car, 50.0, true);

        assert_eq!(
            properties.get_bool(Property::Access(TravelMode::Car), EdgeDirection::Forward),
            Some(true)
        );
        assert_eq!(
            properties.get_bool(Property::Access(TravelMode::Car), EdgeDirection::Backward),
            Some(false)
        );
        assert_eq!(
            properties.get_bool(Property::Access(TravelMode::Foot), EdgeDirection::Forward),
            None
        );
    }

    #[test]
    fn reversed_swaps_directions() {
        let properties = EdgePropertyMap::new()
            .with_access(TravelMode::Bike, 18.0, true)
            .reversed();

        assert_eq!(
            properties.get_bool(Property::Access(TravelMode::Bike), EdgeDirection::Forward),
            Some(false)
        );
    }

    #[test]
    fn values_are_typed() {
        let mut properties = EdgePropertyMap::new();
        properties.insert_usize(Property::OsmId, 1234);
        properties.insert_shared_u8(Property::Surface, 3);
        properties.insert_shared_u8(Property::Surface, 4);

        assert_eq!(properties.get_usize(Property::OsmId), Some(1234));
        assert_eq!(properties.get_shared_u8(Property::Surface), Some(4));
        assert_eq!(properties.get_shared_u8(Property::OsmId), None);
    }
}
