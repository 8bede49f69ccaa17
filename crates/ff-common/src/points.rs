//! Geo point sets: scattered (lat, lon, value) triples for map overlays.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
    pub value: f64,
}

/// An ordered collection of geo points from one data source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPoints {
    points: Vec<GeoPoint>,
}

impl GeoPoints {
    pub fn new(points: Vec<GeoPoint>) -> Self {
        Self { points }
    }

    /// Pair up coordinates, giving every point the same value.
    pub fn from_coords<I>(coords: I, value: f64) -> Self
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        Self {
            points: coords
                .into_iter()
                .map(|(lat, lon)| GeoPoint { lat, lon, value })
                .collect(),
        }
    }

    /// Replace every value with `value`, keeping locations.
    pub fn with_value(mut self, value: f64) -> Self {
        for point in &mut self.points {
            point.value = value;
        }
        self
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GeoPoint> {
        self.points.iter()
    }

    pub fn as_slice(&self) -> &[GeoPoint] {
        &self.points
    }
}

impl<'a> IntoIterator for &'a GeoPoints {
    type Item = &'a GeoPoint;
    type IntoIter = std::slice::Iter<'a, GeoPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl FromIterator<GeoPoint> for GeoPoints {
    fn from_iter<T: IntoIterator<Item = GeoPoint>>(iter: T) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}
