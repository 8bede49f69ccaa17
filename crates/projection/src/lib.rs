//! Map projections used to lay out geographic data on a flat map.
//!
//! Implements the projections from scratch without external dependencies.

pub mod geographic;
pub mod mercator;

use std::fmt;
use std::str::FromStr;

use ff_common::BoundingBox;
use serde::{Deserialize, Serialize};

pub use geographic::PlateCarree;
pub use mercator::WebMercator;

/// Forward and inverse transform between lon/lat degrees and map units.
pub trait Projection {
    /// (lon, lat) in degrees to (x, y) in map units.
    fn forward(&self, lon: f64, lat: f64) -> (f64, f64);

    /// (x, y) in map units back to (lon, lat) in degrees.
    fn inverse(&self, x: f64, y: f64) -> (f64, f64);

    /// Projected extent of a geographic box.
    ///
    /// Both projections here are cylindrical, so the corners bound the box.
    fn project_bbox(&self, bbox: &BoundingBox) -> BoundingBox {
        let (min_x, min_y) = self.forward(bbox.min_x, bbox.min_y);
        let (max_x, max_y) = self.forward(bbox.max_x, bbox.max_y);
        BoundingBox::new(min_x, min_y, max_x, max_y)
    }
}

/// Projections selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Crs {
    /// Web Mercator (meters)
    Epsg3857,
    /// Plate carrée (degrees)
    Epsg4326,
}

impl Crs {
    pub fn projection(&self) -> Box<dyn Projection> {
        match self {
            Crs::Epsg3857 => Box::new(WebMercator),
            Crs::Epsg4326 => Box::new(PlateCarree),
        }
    }
}

impl Default for Crs {
    fn default() -> Self {
        Crs::Epsg3857
    }
}

impl FromStr for Crs {
    type Err = ProjectionError;

    /// Accepts "epsg:3857", "EPSG:4326", "CRS:84" and "plate_carree".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "EPSG:3857" | "EPSG:900913" | "MERCATOR" => Ok(Crs::Epsg3857),
            "EPSG:4326" | "CRS:84" | "PLATE_CARREE" | "CYLINDRICAL" => Ok(Crs::Epsg4326),
            _ => Err(ProjectionError::UnsupportedCrs(s.to_string())),
        }
    }
}

impl TryFrom<String> for Crs {
    type Error = ProjectionError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Crs> for String {
    fn from(crs: Crs) -> Self {
        crs.to_string()
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Crs::Epsg3857 => "epsg:3857",
            Crs::Epsg4326 => "epsg:4326",
        };
        write!(f, "{}", code)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),
}
