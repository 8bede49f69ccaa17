//! End-to-end runs of the timeseries and map pipelines on a temporary tree.

use std::cell::RefCell;
use std::fs;

use ff_common::layout::{map_plot_path, timeseries_plot_path};
use ff_common::AccumulationPeriod;
use ff_reports::{
    build_overlay, load_domain_mask, run_map, run_timeseries, Config, Grib2GridReader, MapOutput,
    OutputMode, ReportsError,
};
use renderer::png::PNG_SIGNATURE;
use renderer::{BarChart, MapView, RasterRenderer, RenderError, Renderer};
use test_utils::{create_box_mask, create_report_grid, dirs, Grib2Builder, ReportTree};

/// Records what it was asked to draw and returns a fixed payload.
#[derive(Default)]
struct RecordingRenderer {
    charts: RefCell<Vec<BarChart>>,
    maps: RefCell<Vec<MapView>>,
}

impl Renderer for RecordingRenderer {
    fn render_bar_chart(&self, chart: &BarChart) -> Result<Vec<u8>, RenderError> {
        self.charts.borrow_mut().push(chart.clone());
        Ok(format!("chart {}", self.charts.borrow().len()).into_bytes())
    }

    fn render_map(&self, view: &MapView) -> Result<Vec<u8>, RenderError> {
        self.maps.borrow_mut().push(view.clone());
        Ok(b"map".to_vec())
    }
}

const PERIOD_START: &str = "2021090100";

fn period() -> AccumulationPeriod {
    AccumulationPeriod::parse_start(PERIOD_START).unwrap()
}

fn config_for(tree: &ReportTree) -> Config {
    let mut config = Config {
        repo_root: tree.root().to_path_buf(),
        ..Config::default()
    };
    config.rendering.font_path = None;
    config.timeseries.dpi = 10.0;
    config.map.period_start = PERIOD_START.to_string();
    config.map.width = 400;
    config
}

/// A 10x10 tree with a 5x5 domain and one day of reports.
fn populated_tree() -> ReportTree {
    let tree = ReportTree::new().unwrap();
    tree.write_mask(&Grib2Builder::new(10, 10).with_data(create_box_mask(10, 10, 0..5, 0..5)))
        .unwrap();
    tree.write_grid_reports(
        &period(),
        &Grib2Builder::new(10, 10)
            .with_data(create_report_grid(10, 10, &[(0, 2.0), (12, 1.0), (99, 4.0)])),
    )
    .unwrap();
    tree.write_point_reports(&period(), &[(49.5, -129.5), (48.2, -127.9), (47.0, -126.0)])
        .unwrap();
    tree
}

#[test]
fn test_overlay_layers() {
    let tree = populated_tree();
    let mask = load_domain_mask(&tree.root().join(dirs::MASK), &Grib2GridReader).unwrap();

    let overlay = build_overlay(
        period(),
        &mask,
        &tree.root().join(dirs::POINT_REPORTS).join("2021/point_acc_reports_ff_2021090200.csv"),
        &tree.root().join(dirs::GRID_REPORTS).join("2021/grid_acc_reports_ff_20210902_00.grib"),
        &Grib2GridReader,
    )
    .unwrap();

    assert_eq!(overlay.domain_points.len(), 25);
    assert!(overlay.domain_points.iter().all(|p| p.value == -1.0));
    assert_eq!(overlay.point_reports.len(), 3);
    assert!(overlay.point_reports.iter().all(|p| p.value == 0.0));
    // Grid reports are not masked: the cell outside the domain is kept
    assert_eq!(overlay.grid_reports.len(), 3);
}

#[test]
fn test_overlay_with_empty_table() {
    let tree = populated_tree();
    let table = tree.write_point_reports(&period(), &[]).unwrap();
    let grid = tree.root().join(dirs::GRID_REPORTS).join("2021/grid_acc_reports_ff_20210902_00.grib");
    let mask = load_domain_mask(&tree.root().join(dirs::MASK), &Grib2GridReader).unwrap();

    let overlay = build_overlay(period(), &mask, &table, &grid, &Grib2GridReader).unwrap();
    assert!(overlay.point_reports.is_empty());
    assert_eq!(overlay.grid_reports.len(), 3);
}

#[test]
fn test_timeseries_writes_one_chart_per_year() {
    let tree = populated_tree();
    let mut config = config_for(&tree);
    config.timeseries.year_start = 2020;
    config.timeseries.year_end = 2021;
    let renderer = RecordingRenderer::default();

    let written = run_timeseries(&config, &Grib2GridReader, &renderer).unwrap();

    let out_dir = tree.root().join(dirs::TIMESERIES_PLOTS);
    assert_eq!(
        written,
        vec![
            timeseries_plot_path(&out_dir, 2020),
            timeseries_plot_path(&out_dir, 2021)
        ]
    );
    assert_eq!(fs::read(&written[1]).unwrap(), b"chart 2");

    let charts = renderer.charts.borrow();
    assert_eq!(charts[0].series[0].values.len(), 366);
    assert_eq!(charts[1].series[0].values.len(), 365);
    assert_eq!(charts[1].series.len(), 1);
    assert_eq!(charts[1].series[0].label, "Point");
    assert_eq!(charts[1].series[0].max_value(), 3.0);
    assert!(charts[1].title.ends_with("reports in 2021"));
}

#[test]
fn test_timeseries_grid_series_and_rerun_overwrites() {
    let tree = populated_tree();
    let mut config = config_for(&tree);
    config.timeseries.show_grid_series = true;
    let renderer = RecordingRenderer::default();

    run_timeseries(&config, &Grib2GridReader, &renderer).unwrap();
    let written = run_timeseries(&config, &Grib2GridReader, &renderer).unwrap();

    assert_eq!(written.len(), 1);
    assert_eq!(fs::read(&written[0]).unwrap(), b"chart 2");

    let charts = renderer.charts.borrow();
    let labels: Vec<&str> = charts[0].series.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, vec!["Point", "Grid"]);
    assert_eq!(charts[0].series[1].max_value(), 2.0);
}

#[test]
fn test_timeseries_requires_mask() {
    let tree = ReportTree::new().unwrap();
    let config = config_for(&tree);
    let renderer = RecordingRenderer::default();

    let result = run_timeseries(&config, &Grib2GridReader, &renderer);
    assert!(matches!(result, Err(ReportsError::MissingInput(_))));
    assert!(renderer.charts.borrow().is_empty());
}

#[test]
fn test_map_writes_file() {
    let tree = populated_tree();
    let config = config_for(&tree);
    let renderer = RecordingRenderer::default();

    let output = run_map(&config, &Grib2GridReader, &renderer).unwrap();

    let expected = map_plot_path(&tree.root().join(dirs::MAP_PLOTS), &period());
    assert_eq!(output, MapOutput::File(expected.clone()));
    assert_eq!(fs::read(expected).unwrap(), b"map");

    let maps = renderer.maps.borrow();
    let view = &maps[0];
    // Domain points and point reports; the grid layer is off by default
    assert_eq!(view.layers.len(), 2);
    assert_eq!(view.layers[0].points.len(), 25);
    assert_eq!(view.layers[1].points.len(), 3);
    assert!(view.title[0].ends_with("ending on 2021-09-02 at 00 UTC"));
    assert_eq!(view.width_px, 400);
}

#[test]
fn test_map_with_grid_layer_enabled() {
    let tree = populated_tree();
    let mut config = config_for(&tree);
    config.map.layers.grid_reports.enabled = true;
    let renderer = RecordingRenderer::default();

    run_map(&config, &Grib2GridReader, &renderer).unwrap();

    let maps = renderer.maps.borrow();
    let counts: Vec<usize> = maps[0].layers.iter().map(|l| l.points.len()).collect();
    assert_eq!(counts, vec![25, 3, 3]);
}

#[test]
fn test_map_missing_table_writes_nothing() {
    let tree = ReportTree::new().unwrap();
    tree.write_mask(&Grib2Builder::new(10, 10).with_data(vec![1.0; 100]))
        .unwrap();
    tree.write_grid_reports(&period(), &Grib2Builder::new(10, 10))
        .unwrap();
    let config = config_for(&tree);
    let renderer = RecordingRenderer::default();

    let result = run_map(&config, &Grib2GridReader, &renderer);
    assert!(matches!(result, Err(ReportsError::MissingInput(_))));
    assert!(renderer.maps.borrow().is_empty());
    assert!(!tree.root().join(dirs::MAP_PLOTS).exists());
}

#[test]
fn test_map_missing_grid_is_fatal() {
    let tree = ReportTree::new().unwrap();
    tree.write_mask(&Grib2Builder::new(10, 10).with_data(vec![1.0; 100]))
        .unwrap();
    tree.write_point_reports(&period(), &[(45.0, -125.0)]).unwrap();
    let config = config_for(&tree);

    let result = run_map(&config, &Grib2GridReader, &RecordingRenderer::default());
    assert!(matches!(result, Err(ReportsError::MissingInput(_))));
}

#[cfg(unix)]
#[test]
fn test_map_interactive_mode_writes_no_file() {
    let tree = populated_tree();
    let mut config = config_for(&tree);
    config.map.output_mode = OutputMode::Interactive;
    config.map.viewer = "true".to_string();

    let output = run_map(&config, &Grib2GridReader, &RecordingRenderer::default()).unwrap();
    assert_eq!(output, MapOutput::Viewed);
    assert!(!tree.root().join(dirs::MAP_PLOTS).exists());
}

#[test]
fn test_raster_renderer_produces_png_files() {
    let tree = populated_tree();
    let config = config_for(&tree);
    let renderer = RasterRenderer::new(None);

    let charts = run_timeseries(&config, &Grib2GridReader, &renderer).unwrap();
    let chart = fs::read(&charts[0]).unwrap();
    assert!(chart.starts_with(&PNG_SIGNATURE));

    let MapOutput::File(path) = run_map(&config, &Grib2GridReader, &renderer).unwrap() else {
        panic!("expected a file output");
    };
    let map = image::load_from_memory(&fs::read(path).unwrap()).unwrap();
    assert_eq!(map.width(), 400);
}
