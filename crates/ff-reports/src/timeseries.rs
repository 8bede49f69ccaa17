//! Yearly bar charts of daily report counts.

use std::path::PathBuf;

use ff_common::layout::timeseries_plot_path;
use renderer::{BarChart, BarSeries, ChartStyle, Color, Renderer};
use tracing::info;

use crate::aggregate::{aggregate_year, YearSeries};
use crate::config::Config;
use crate::error::ReportsResult;
use crate::mask::load_domain_mask;
use crate::output::write_plot;
use crate::reader::GridReader;

pub const X_LABEL: &str = "End of 24-h accumulation periods";
pub const Y_LABEL: &str = "Counts";

pub fn chart_title(year: i32) -> String {
    format!(
        "Count of point and gridded accumulated flash flood reports in {}",
        year
    )
}

/// Red point-count bars, plus black grid-count bars when `show_grid` is set.
pub fn build_chart(series: &YearSeries, show_grid: bool, dpi: f64) -> BarChart {
    let mut chart = BarChart::new(chart_title(series.year))
        .with_axis_labels(X_LABEL, Y_LABEL)
        .with_style(ChartStyle {
            dpi,
            ..ChartStyle::default()
        })
        .with_series(BarSeries::new("Point", Color::RED, series.point_series()));

    if show_grid {
        chart = chart.with_series(BarSeries::new("Grid", Color::BLACK, series.grid_series()));
    }
    chart
}

/// Aggregate and plot every configured year. Returns the written paths.
pub fn run_timeseries(
    config: &Config,
    reader: &dyn GridReader,
    renderer: &dyn Renderer,
) -> ReportsResult<Vec<PathBuf>> {
    let ts = &config.timeseries;
    let mask = load_domain_mask(&config.resolve(&config.mask_path), reader)?;
    let grid_dir = config.resolve(&ts.input_dir);
    let output_dir = config.resolve(&ts.output_dir);

    info!(
        year_start = ts.year_start,
        year_end = ts.year_end,
        grid_dir = %grid_dir.display(),
        "Plotting daily timeseries of point and gridded report counts"
    );

    let mut written = Vec::new();
    for year in ts.year_start..=ts.year_end {
        let series = aggregate_year(year, &mask, &grid_dir, reader)?;
        let png = renderer.render_bar_chart(&build_chart(&series, ts.show_grid_series, ts.dpi))?;
        written.push(write_plot(&timeseries_plot_path(&output_dir, year), &png)?);
    }
    Ok(written)
}
