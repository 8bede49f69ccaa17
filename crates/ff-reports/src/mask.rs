//! Domain mask: which grid cells belong to the study region.

use std::path::Path;

use ff_common::{GeoField, GeoPoints};
use tracing::info;

use crate::error::ReportsResult;
use crate::reader::GridReader;

/// Value given to in-domain points when they are drawn as a background layer.
pub const DOMAIN_POINT_VALUE: f64 = -1.0;

/// The study-region mask, read once per run and shared read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainMask {
    raw: GeoField,
    membership: GeoField,
}

impl DomainMask {
    /// Cells equal to 0 become missing; all other cells keep their value.
    pub fn from_field(raw: GeoField) -> Self {
        let membership = raw.bitmap(0.0);
        Self { raw, membership }
    }

    /// Membership grid: indicator value inside the domain, NaN outside.
    pub fn membership(&self) -> &GeoField {
        &self.membership
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Number of cells inside the domain.
    pub fn in_domain_count(&self) -> usize {
        self.membership.count_present()
    }

    /// Grid points whose raw mask value is exactly 1, valued -1.
    pub fn domain_points(&self) -> GeoPoints {
        self.raw
            .select(|v| v == 1.0)
            .with_value(DOMAIN_POINT_VALUE)
    }

    /// Restrict `field` to the domain by elementwise multiplication. The
    /// mask's size is the expected one.
    pub fn apply(&self, field: &GeoField) -> ReportsResult<GeoField> {
        Ok(self.membership.multiply(field)?)
    }
}

/// Read the mask file. A missing or unreadable mask is fatal.
pub fn load_domain_mask(path: &Path, reader: &dyn GridReader) -> ReportsResult<DomainMask> {
    let mask = DomainMask::from_field(reader.read_field(path)?);
    info!(
        path = %path.display(),
        cells = mask.len(),
        in_domain = mask.in_domain_count(),
        "Loaded domain mask"
    );
    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportsError;
    use ff_common::{GridSpec, ScanMode};

    fn field(values: Vec<f32>) -> GeoField {
        let spec = GridSpec::from_increments(values.len(), 1, 1.0, 1.0, -100.0, 40.0, ScanMode::standard());
        GeoField::new(spec, values).unwrap()
    }

    #[test]
    fn test_zero_cells_become_missing() {
        let mask = DomainMask::from_field(field(vec![1.0, 0.0, 1.0, f32::NAN]));
        let m = mask.membership().values();
        assert_eq!(m[0], 1.0);
        assert!(m[1].is_nan());
        assert!(m[3].is_nan());
        assert_eq!(mask.in_domain_count(), 2);
    }

    #[test]
    fn test_domain_points_only_exact_ones() {
        let mask = DomainMask::from_field(field(vec![1.0, 0.0, 0.5, 1.0]));
        let points = mask.domain_points();

        assert_eq!(points.len(), 2);
        assert!(points.iter().all(|p| p.value == -1.0));
        let lons: Vec<f64> = points.iter().map(|p| p.lon).collect();
        assert_eq!(lons, vec![-100.0, -97.0]);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let mask = DomainMask::from_field(field(vec![1.0, 0.0, 1.0, 1.0]));
        let reports = field(vec![5.0, 7.0, 0.0, 3.0]);

        let once = mask.apply(&reports).unwrap();
        let twice = mask.apply(&once).unwrap();
        assert_eq!(once.nansum(), 8.0);
        assert_eq!(twice.nansum(), once.nansum());
        assert_eq!(twice.count_present(), 3);
    }

    #[test]
    fn test_apply_rejects_other_shapes() {
        let mask = DomainMask::from_field(field(vec![1.0, 1.0]));
        let err = mask.apply(&field(vec![1.0, 1.0, 1.0])).unwrap_err();
        assert!(matches!(err, ReportsError::ShapeMismatch { expected: 2, actual: 3 }));
        assert!(err.to_string().contains("mask has 2 points, reports have 3"));
    }
}
