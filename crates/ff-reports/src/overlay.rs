//! Point sets for the map overlay of one accumulation period.

use std::path::Path;

use ff_common::{AccumulationPeriod, GeoField, GeoPoints};
use tracing::info;

use crate::error::{ReportsError, ReportsResult};
use crate::mask::DomainMask;
use crate::reader::GridReader;
use crate::table::{read_point_reports, report_points};

/// Value given to gridded reports in the map overlay.
pub const GRID_REPORT_VALUE: f64 = 0.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub period: AccumulationPeriod,
    /// In-domain grid points, value -1
    pub domain_points: GeoPoints,
    /// One point per report table row, value 0
    pub point_reports: GeoPoints,
    /// Grid cells with at least one report, value 0
    pub grid_reports: GeoPoints,
}

/// Grid cells with a report count above zero.
pub fn grid_report_points(grid: &GeoField) -> GeoPoints {
    grid.select(|v| v > 0.0).with_value(GRID_REPORT_VALUE)
}

/// Build the three overlay layers. Both report files must exist.
pub fn build_overlay(
    period: AccumulationPeriod,
    mask: &DomainMask,
    table_path: &Path,
    grid_path: &Path,
    reader: &dyn GridReader,
) -> ReportsResult<Overlay> {
    for path in [table_path, grid_path] {
        if !path.exists() {
            return Err(ReportsError::MissingInput(path.to_path_buf()));
        }
    }

    let point_reports = report_points(&read_point_reports(table_path)?);
    let grid_reports = grid_report_points(&reader.read_field(grid_path)?);
    let domain_points = mask.domain_points();

    info!(
        period_end = %period.end(),
        domain_points = domain_points.len(),
        point_reports = point_reports.len(),
        grid_reports = grid_reports.len(),
        "Built map overlay"
    );

    Ok(Overlay {
        period,
        domain_points,
        point_reports,
        grid_reports,
    })
}
