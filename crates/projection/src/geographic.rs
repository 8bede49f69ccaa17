//! Plate carrée: longitude and latitude used directly as x and y.

use crate::Projection;

#[derive(Debug, Clone, Copy, Default)]
pub struct PlateCarree;

impl Projection for PlateCarree {
    fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        (lon, lat)
    }

    fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        (x, y)
    }
}
