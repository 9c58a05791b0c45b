use crate::{
    distance::{Distance, Meters},
    geopoint::GeoPoint,
};

pub fn compute_geometry_distance(geometry: &[GeoPoint]) -> Distance<Meters> {
    geometry
        .windows(2)
        .map(|pair| pair[0].haversine_distance(&pair[1]))
        .sum()
}

/// Distance travelled along the polyline from its first point to `point` on segment `segment_index`
pub fn distance_along(
    geometry: &[GeoPoint],
    segment_index: usize,
    point: &GeoPoint,
) -> Distance<Meters> {
    let split = (segment_index + 1).min(geometry.len());
    let prefix = compute_geometry_distance(&geometry[..split]);
    match geometry.get(segment_index) {
        Some(segment_start) => prefix + segment_start.haversine_distance(point),
        None => prefix,
    }
}

/// Sub-polyline between two positions on the same edge, given as (segment index, point)
/// with `from` before `to` along the geometry.
pub fn slice_geometry(
    geometry: &[GeoPoint],
    from: (usize, &GeoPoint),
    to: (usize, &GeoPoint),
) -> Vec<GeoPoint> {
    let mut points = vec![*from.1];
    if to.0 > from.0 {
        points.extend_from_slice(&geometry[from.0 + 1..=to.0]);
    }
    points.push(*to.1);
    points
}
