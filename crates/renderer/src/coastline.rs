//! Coastline and boundary geometry read from GeoJSON.
//!
//! Only linework is kept: polygons contribute their rings both as outlines
//! and as land areas; points are ignored.

use std::path::Path;

use serde::Deserialize;

use crate::RenderError;

/// A line in (lon, lat) degrees.
pub type Polyline = Vec<(f64, f64)>;

/// Outlines and filled land areas in geographic coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Coastlines {
    pub lines: Vec<Polyline>,
    /// Polygons as rings, outer ring first.
    pub polygons: Vec<Vec<Polyline>>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum GeoJson {
    FeatureCollection {
        features: Vec<GeoJson>,
    },
    Feature {
        geometry: Option<Box<GeoJson>>,
    },
    GeometryCollection {
        geometries: Vec<GeoJson>,
    },
    Point {},
    MultiPoint {},
    LineString {
        coordinates: Vec<Vec<f64>>,
    },
    MultiLineString {
        coordinates: Vec<Vec<Vec<f64>>>,
    },
    Polygon {
        coordinates: Vec<Vec<Vec<f64>>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Vec<f64>>>>,
    },
}

impl Coastlines {
    pub fn from_geojson_str(json: &str) -> Result<Self, RenderError> {
        let doc: GeoJson = serde_json::from_str(json)
            .map_err(|e| RenderError::Geometry(format!("invalid GeoJSON: {}", e)))?;
        let mut coast = Coastlines::default();
        coast.collect(doc)?;
        Ok(coast)
    }

    pub fn load(path: &Path) -> Result<Self, RenderError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_geojson_str(&json)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.polygons.is_empty()
    }

    /// Every outline, including polygon rings.
    pub fn outlines(&self) -> impl Iterator<Item = &Polyline> {
        self.lines.iter().chain(self.polygons.iter().flatten())
    }

    fn collect(&mut self, doc: GeoJson) -> Result<(), RenderError> {
        match doc {
            GeoJson::FeatureCollection { features } => {
                for feature in features {
                    self.collect(feature)?;
                }
            }
            GeoJson::Feature { geometry } => {
                if let Some(geometry) = geometry {
                    self.collect(*geometry)?;
                }
            }
            GeoJson::GeometryCollection { geometries } => {
                for geometry in geometries {
                    self.collect(geometry)?;
                }
            }
            GeoJson::Point {} | GeoJson::MultiPoint {} => {}
            GeoJson::LineString { coordinates } => {
                self.lines.push(to_line(coordinates)?);
            }
            GeoJson::MultiLineString { coordinates } => {
                for line in coordinates {
                    self.lines.push(to_line(line)?);
                }
            }
            GeoJson::Polygon { coordinates } => {
                self.polygons.push(to_rings(coordinates)?);
            }
            GeoJson::MultiPolygon { coordinates } => {
                for polygon in coordinates {
                    self.polygons.push(to_rings(polygon)?);
                }
            }
        }
        Ok(())
    }
}

fn to_line(positions: Vec<Vec<f64>>) -> Result<Polyline, RenderError> {
    positions
        .into_iter()
        .map(|p| match p.as_slice() {
            [lon, lat, ..] => Ok((*lon, *lat)),
            _ => Err(RenderError::Geometry(format!(
                "position needs at least 2 coordinates, got {}",
                p.len()
            ))),
        })
        .collect()
}

fn to_rings(rings: Vec<Vec<Vec<f64>>>) -> Result<Vec<Polyline>, RenderError> {
    rings.into_iter().map(to_line).collect()
}
