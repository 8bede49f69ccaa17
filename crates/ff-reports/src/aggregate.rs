//! Daily counts of point and gridded reports over a calendar year.

use std::ops::RangeInclusive;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use ff_common::layout::{report_path, DataCategory};
use ff_common::{periods_in_year, GeoField};
use tracing::{debug, info};

use crate::error::ReportsResult;
use crate::mask::DomainMask;
use crate::reader::GridReader;

/// Counts for one accumulation period, labelled by its end time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyCount {
    pub period_end: DateTime<Utc>,
    /// Sum of the in-domain report counts.
    pub point_count: f64,
    /// Number of in-domain cells with at least one report.
    pub grid_count: f64,
}

impl DailyCount {
    pub fn empty(period_end: DateTime<Utc>) -> Self {
        Self {
            period_end,
            point_count: 0.0,
            grid_count: 0.0,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.period_end.date_naive()
    }
}

/// One entry per calendar day of `year`, in chronological order.
#[derive(Debug, Clone, PartialEq)]
pub struct YearSeries {
    pub year: i32,
    pub days: Vec<DailyCount>,
    /// Days whose report grid was absent.
    pub missing_days: usize,
}

impl YearSeries {
    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn point_series(&self) -> Vec<(NaiveDate, f64)> {
        self.days.iter().map(|d| (d.date(), d.point_count)).collect()
    }

    pub fn grid_series(&self) -> Vec<(NaiveDate, f64)> {
        self.days.iter().map(|d| (d.date(), d.grid_count)).collect()
    }

    pub fn total_point_count(&self) -> f64 {
        self.days.iter().map(|d| d.point_count).sum()
    }

    pub fn total_grid_count(&self) -> f64 {
        self.days.iter().map(|d| d.grid_count).sum()
    }
}

/// Point and grid counts of one day's reports inside the domain.
///
/// Returns `(point_count, grid_count)`.
pub fn count_day(field: &GeoField, mask: &DomainMask) -> ReportsResult<(f64, f64)> {
    let masked = mask.apply(field)?;
    let point_count = masked.nansum();
    let grid_count = masked.greater_than(0.0).nansum();
    Ok((point_count, grid_count))
}

/// Walk every accumulation period of `year` and count its reports.
///
/// A period without a report file counts as zero; any other read failure
/// aborts the year.
pub fn aggregate_year(
    year: i32,
    mask: &DomainMask,
    grid_dir: &Path,
    reader: &dyn GridReader,
) -> ReportsResult<YearSeries> {
    let mut days = Vec::with_capacity(366);
    let mut missing_days = 0;

    for period in periods_in_year(year)? {
        let path = report_path(grid_dir, DataCategory::GridReports, &period);

        if !path.exists() {
            debug!(path = %path.display(), "No report grid for period, counting zero");
            missing_days += 1;
            days.push(DailyCount::empty(period.end()));
            continue;
        }

        let field = reader.read_field(&path)?;
        let (point_count, grid_count) = count_day(&field, mask)?;
        days.push(DailyCount {
            period_end: period.end(),
            point_count,
            grid_count,
        });
    }

    let series = YearSeries {
        year,
        days,
        missing_days,
    };
    info!(
        year,
        days = series.len(),
        missing_days,
        point_total = series.total_point_count(),
        grid_total = series.total_grid_count(),
        "Aggregated daily report counts"
    );
    Ok(series)
}

/// One series per year in `years`.
pub fn aggregate_range(
    years: RangeInclusive<i32>,
    mask: &DomainMask,
    grid_dir: &Path,
    reader: &dyn GridReader,
) -> ReportsResult<Vec<YearSeries>> {
    years
        .map(|year| aggregate_year(year, mask, grid_dir, reader))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ff_common::{GridSpec, ScanMode};

    fn field(values: Vec<f32>) -> GeoField {
        let spec = GridSpec::from_increments(values.len(), 1, 1.0, 1.0, 0.0, 0.0, ScanMode::standard());
        GeoField::new(spec, values).unwrap()
    }

    #[test]
    fn test_count_day() {
        let mask = DomainMask::from_field(field(vec![1.0, 1.0, 0.0, 1.0, 1.0]));
        let reports = field(vec![5.0, 0.0, 9.0, 3.0, f32::NAN]);

        let (point, grid) = count_day(&reports, &mask).unwrap();
        assert_eq!(point, 8.0);
        assert_eq!(grid, 2.0);
    }

    #[test]
    fn test_empty_day_label() {
        let end = "2021-01-02T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let day = DailyCount::empty(end);
        assert_eq!(day.date(), NaiveDate::from_ymd_opt(2021, 1, 2).unwrap());
        assert_eq!((day.point_count, day.grid_count), (0.0, 0.0));
    }
}
