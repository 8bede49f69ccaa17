//! Gridded fields and the elementwise operations the report plots need.
//!
//! Missing values are NaN throughout. Arithmetic propagates NaN, comparisons
//! keep NaN where either input is missing, and reductions skip it.

use crate::error::{CommonError, CommonResult};
use crate::grid::GridSpec;
use crate::points::{GeoPoint, GeoPoints};

/// Values on a regular grid, stored in the grid's scan order.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoField {
    spec: GridSpec,
    values: Vec<f32>,
}

impl GeoField {
    pub fn new(spec: GridSpec, values: Vec<f32>) -> CommonResult<Self> {
        if values.len() != spec.len() {
            return Err(CommonError::LengthMismatch {
                expected: spec.len(),
                actual: values.len(),
            });
        }
        Ok(Self { spec, values })
    }

    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Mark every cell equal to `missing` as missing.
    pub fn bitmap(&self, missing: f32) -> GeoField {
        self.map(|v| if v == missing { f32::NAN } else { v })
    }

    /// Elementwise product. Both fields must share the same number of points.
    pub fn multiply(&self, other: &GeoField) -> CommonResult<GeoField> {
        if self.len() != other.len() {
            return Err(CommonError::ShapeMismatch {
                expected: self.len(),
                actual: other.len(),
            });
        }

        let values = self
            .values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| a * b)
            .collect();

        Ok(GeoField {
            spec: self.spec.clone(),
            values,
        })
    }

    /// 1 where the value exceeds `threshold`, 0 where it does not, missing
    /// where the value is missing.
    pub fn greater_than(&self, threshold: f32) -> GeoField {
        self.map(|v| {
            if v.is_nan() {
                f32::NAN
            } else if v > threshold {
                1.0
            } else {
                0.0
            }
        })
    }

    /// Sum of all non-missing values.
    pub fn nansum(&self) -> f64 {
        self.values
            .iter()
            .filter(|v| !v.is_nan())
            .map(|&v| v as f64)
            .sum()
    }

    /// Number of non-missing values.
    pub fn count_present(&self) -> usize {
        self.values.iter().filter(|v| !v.is_nan()).count()
    }

    pub fn latitudes(&self) -> Vec<f64> {
        self.spec.points().map(|p| p.lat).collect()
    }

    pub fn longitudes(&self) -> Vec<f64> {
        self.spec.points().map(|p| p.lon).collect()
    }

    /// Points whose value satisfies `keep`, carrying their own value.
    pub fn select<F>(&self, keep: F) -> GeoPoints
    where
        F: Fn(f32) -> bool,
    {
        self.spec
            .points()
            .zip(&self.values)
            .filter(|(_, v)| keep(**v))
            .map(|(p, &v)| GeoPoint {
                lat: p.lat,
                lon: p.lon,
                value: v as f64,
            })
            .collect()
    }

    fn map<F>(&self, f: F) -> GeoField
    where
        F: Fn(f32) -> f32,
    {
        GeoField {
            spec: self.spec.clone(),
            values: self.values.iter().map(|&v| f(v)).collect(),
        }
    }
}
