//! Point-report tables (CSV, one row per report).

use std::path::Path;

use ff_common::GeoPoints;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{ReportsError, ReportsResult};

const LAT_COLUMN: &str = "AREA_AFFECTED_CENTRE_LAT";
const LON_COLUMN: &str = "AREA_AFFECTED_CENTRE_LON";

/// Value given to point reports in the map overlay.
pub const POINT_REPORT_VALUE: f64 = 0.0;

/// Location of one report. Other columns of the table are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PointReport {
    #[serde(rename = "AREA_AFFECTED_CENTRE_LAT")]
    pub lat: Option<f64>,
    #[serde(rename = "AREA_AFFECTED_CENTRE_LON")]
    pub lon: Option<f64>,
}

/// Read every row of a point-report table.
pub fn read_point_reports(path: &Path) -> ReportsResult<Vec<PointReport>> {
    if !path.exists() {
        return Err(ReportsError::MissingInput(path.to_path_buf()));
    }
    let table_error = |reason: String| ReportsError::Table {
        path: path.to_path_buf(),
        reason,
    };

    let mut reader = csv::Reader::from_path(path).map_err(|e| table_error(e.to_string()))?;
    let headers = reader.headers().map_err(|e| table_error(e.to_string()))?;
    for column in [LAT_COLUMN, LON_COLUMN] {
        if !headers.iter().any(|h| h == column) {
            return Err(table_error(format!("missing column {}", column)));
        }
    }

    let reports = reader
        .deserialize()
        .collect::<Result<Vec<PointReport>, _>>()
        .map_err(|e| table_error(e.to_string()))?;

    debug!(path = %path.display(), rows = reports.len(), "Read point reports");
    Ok(reports)
}

/// Report locations at value 0. Rows without coordinates are skipped.
pub fn report_points(reports: &[PointReport]) -> GeoPoints {
    let located: Vec<(f64, f64)> = reports
        .iter()
        .filter_map(|r| Some((r.lat?, r.lon?)))
        .collect();

    let skipped = reports.len() - located.len();
    if skipped > 0 {
        warn!(skipped, "Point reports without coordinates were skipped");
    }
    GeoPoints::from_coords(located, POINT_REPORT_VALUE)
}
