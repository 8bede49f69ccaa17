//! Filesystem fixtures laid out like the report data repository.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ff_common::layout::{report_path, DataCategory};
use ff_common::AccumulationPeriod;

use crate::generators::Grib2Builder;

/// Relative directories used by the default configuration.
pub mod dirs {
    pub const MASK: &str = "data/raw/mask/usa_era5.grib";
    pub const GRID_REPORTS: &str = "data/processed/03_grid_acc_reports_ff";
    pub const POINT_REPORTS: &str = "data/processed/02_point_acc_reports_ff";
    pub const TIMESERIES_PLOTS: &str = "data/plot/12_timeseries_point_grid_ff";
    pub const MAP_PLOTS: &str = "data/plot/13_map_point_grid_ff";
}

/// The US study domain as `[south, west, north, east]`.
pub const USA_DOMAIN: [f64; 4] = [22.0, -130.0, 52.0, -60.0];

/// Column headers of a point-report table. Only the two centre columns are
/// read, the rest are there to make sure they are ignored.
pub const POINT_TABLE_HEADER: [&str; 5] = [
    "EVENT_ID",
    "BEGIN_DATE_TIME",
    "AREA_AFFECTED_CENTRE_LAT",
    "AREA_AFFECTED_CENTRE_LON",
    "NARRATIVE",
];

/// A throwaway repository root, removed when dropped.
pub struct ReportTree {
    dir: tempfile::TempDir,
}

impl ReportTree {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            dir: tempfile::Builder::new().prefix("ff_reports_").tempdir()?,
        })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write raw bytes at `relative`, creating parent directories.
    pub fn write_bytes(&self, relative: impl AsRef<Path>, bytes: &[u8]) -> io::Result<PathBuf> {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Write the domain mask at the default location.
    pub fn write_mask(&self, mask: &Grib2Builder) -> io::Result<PathBuf> {
        self.write_bytes(dirs::MASK, &mask.build())
    }

    /// Write the gridded reports of one period under the default grid dir.
    pub fn write_grid_reports(
        &self,
        period: &AccumulationPeriod,
        grid: &Grib2Builder,
    ) -> io::Result<PathBuf> {
        let path = report_path(Path::new(dirs::GRID_REPORTS), DataCategory::GridReports, period);
        self.write_bytes(path, &grid.build())
    }

    /// Write a point-report table with one row per `(lat, lon)`.
    pub fn write_point_reports(
        &self,
        period: &AccumulationPeriod,
        reports: &[(f64, f64)],
    ) -> io::Result<PathBuf> {
        let relative =
            report_path(Path::new(dirs::POINT_REPORTS), DataCategory::PointReports, period);
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(POINT_TABLE_HEADER)?;
        for (idx, (lat, lon)) in reports.iter().enumerate() {
            writer.write_record([
                format!("{}", 1000 + idx),
                period.start().format("%Y-%m-%d %H:%M").to_string(),
                lat.to_string(),
                lon.to_string(),
                "Flash flooding, roads closed".to_string(),
            ])?;
        }
        writer.flush()?;

        Ok(path)
    }
}
