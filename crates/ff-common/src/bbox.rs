//! Bounding box types and operations.

use serde::{Deserialize, Serialize};

use crate::error::{CommonError, CommonResult};

/// A geographic or projected bounding box.
///
/// For geographic coordinates, x is longitude and y is latitude in degrees.
/// For projected coordinates (EPSG:3857), both are in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Build a geographic box from a `[south, west, north, east]` area,
    /// the corner order map areas are written in.
    pub fn from_swne(area: &[f64]) -> CommonResult<Self> {
        let [south, west, north, east] = match area {
            [s, w, n, e] => [*s, *w, *n, *e],
            _ => {
                return Err(CommonError::InvalidDomain(format!(
                    "expected [south, west, north, east], got {} values",
                    area.len()
                )))
            }
        };

        if !(south < north) {
            return Err(CommonError::InvalidDomain(format!(
                "south ({}) must be below north ({})",
                south, north
            )));
        }
        if !(west < east) {
            return Err(CommonError::InvalidDomain(format!(
                "west ({}) must be left of east ({})",
                west, east
            )));
        }
        if south < -90.0 || north > 90.0 {
            return Err(CommonError::InvalidDomain(format!(
                "latitudes must lie within [-90, 90], got {}..{}",
                south, north
            )));
        }

        Ok(Self::new(west, south, east, north))
    }

    /// Width of the bounding box in coordinate units.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the bounding box in coordinate units.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Check if a point is contained within this bbox.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}
