//! Date-keyed file layout of the report data and plot outputs.
//!
//! All paths are pure functions of (directory, period or year), so the
//! same inputs always land on the same file.

use std::path::{Path, PathBuf};

use crate::period::AccumulationPeriod;

/// Kinds of per-period report files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataCategory {
    /// Point reports accumulated onto the analysis grid (GRIB2).
    GridReports,
    /// Point reports as a table of locations (CSV).
    PointReports,
}

impl DataCategory {
    /// File name for the period ending at `period.end()`.
    pub fn file_name(&self, period: &AccumulationPeriod) -> String {
        let end = period.end();
        match self {
            DataCategory::GridReports => format!(
                "grid_acc_reports_ff_{}_{}.grib",
                end.format("%Y%m%d"),
                end.format("%H")
            ),
            DataCategory::PointReports => {
                format!("point_acc_reports_ff_{}.csv", end.format("%Y%m%d%H"))
            }
        }
    }
}

/// Path of a report file: `{dir}/{YYYY}/{file_name}`, keyed by the end year.
pub fn report_path(dir: &Path, category: DataCategory, period: &AccumulationPeriod) -> PathBuf {
    dir.join(period.end().format("%Y").to_string())
        .join(category.file_name(period))
}

/// Path of the yearly count chart.
pub fn timeseries_plot_path(dir: &Path, year: i32) -> PathBuf {
    dir.join(format!("timeseries_point_grid_ff_{}.png", year))
}

/// Path of the map overlay for one period.
pub fn map_plot_path(dir: &Path, period: &AccumulationPeriod) -> PathBuf {
    let end = period.end();
    dir.join(format!(
        "map_point_grid_ff_{}_{}.png",
        end.format("%Y%m%d"),
        end.format("%H")
    ))
}

/// Resolve a path relative to the repository root. Absolute paths are kept.
pub fn resolve(repo_root: &Path, relative: &Path) -> PathBuf {
    repo_root.join(relative)
}
