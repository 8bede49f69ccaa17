//! Map overlay of point and gridded reports for one accumulation period.

use std::path::{Path, PathBuf};

use ff_common::layout::{map_plot_path, report_path, DataCategory};
use ff_common::{AccumulationPeriod, BoundingBox};
use renderer::{Coastlines, MapLayer, MapView, Renderer};
use tracing::{info, warn};

use crate::config::{Config, OutputMode};
use crate::error::ReportsResult;
use crate::mask::load_domain_mask;
use crate::output::{show_in_viewer, write_plot};
use crate::overlay::{build_overlay, Overlay};
use crate::reader::GridReader;

/// What happened to the rendered map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapOutput {
    File(PathBuf),
    Viewed,
}

pub fn map_title(period: &AccumulationPeriod) -> Vec<String> {
    let end = period.end();
    vec![
        format!(
            "Point and gridded flash flood reports accumulated over the 24-hourly period ending on {} at {} UTC",
            end.format("%Y-%m-%d"),
            end.format("%H")
        ),
        " ".to_string(),
    ]
}

/// Read optional GeoJSON linework. Problems are logged and yield nothing.
pub fn load_linework(path: Option<&Path>, what: &str) -> Coastlines {
    let Some(path) = path else {
        return Coastlines::default();
    };
    match Coastlines::load(path) {
        Ok(lines) => lines,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not load {}, drawing without it", what);
            Coastlines::default()
        }
    }
}

/// Assemble the map view from the overlay and the enabled layers.
pub fn build_map_view(
    config: &Config,
    domain: BoundingBox,
    overlay: &Overlay,
    coastlines: Coastlines,
    boundaries: Coastlines,
) -> MapView {
    let map = &config.map;
    let layers = [
        (&map.layers.domain_points, &overlay.domain_points),
        (&map.layers.grid_reports, &overlay.grid_reports),
        (&map.layers.point_reports, &overlay.point_reports),
    ];

    let mut view = MapView::new(domain, map.width).with_title(map_title(&overlay.period));
    view.crs = map.crs;
    view.coast = map.coast.clone();
    view.title_style = map.title_style.clone();
    view.coastlines = coastlines;
    view.boundaries = boundaries;
    for (layer, points) in layers {
        if layer.enabled {
            view = view.with_layer(MapLayer::new(points.clone(), layer.symbols.clone()));
        }
    }
    view
}

/// Build, render and deliver the map for the configured period.
pub fn run_map(
    config: &Config,
    reader: &dyn GridReader,
    renderer: &dyn Renderer,
) -> ReportsResult<MapOutput> {
    let map = &config.map;
    let period = AccumulationPeriod::parse_start(&map.period_start)?;
    let domain = BoundingBox::from_swne(&map.domain)?;
    let end = period.end();

    info!(
        period_end = %end.format("%Y-%m-%d %H UTC"),
        "Plotting point and gridded flash flood reports for the 24-hourly period"
    );

    let mask = load_domain_mask(&config.resolve(&config.mask_path), reader)?;
    let table_path = report_path(
        &config.resolve(&map.point_dir),
        DataCategory::PointReports,
        &period,
    );
    let grid_path = report_path(
        &config.resolve(&map.grid_dir),
        DataCategory::GridReports,
        &period,
    );
    let overlay = build_overlay(period, &mask, &table_path, &grid_path, reader)?;

    let rendering = &config.rendering;
    let coastlines = load_linework(
        rendering.coastline_path.as_ref().map(|p| config.resolve(p)).as_deref(),
        "coastlines",
    );
    let boundaries = load_linework(
        rendering.boundaries_path.as_ref().map(|p| config.resolve(p)).as_deref(),
        "boundaries",
    );

    let view = build_map_view(config, domain, &overlay, coastlines, boundaries);
    let png = renderer.render_map(&view)?;

    match map.output_mode {
        OutputMode::File => {
            let path = map_plot_path(&config.resolve(&map.output_dir), &period);
            Ok(MapOutput::File(write_plot(&path, &png)?))
        }
        OutputMode::Interactive => {
            show_in_viewer(&map.viewer, &png)?;
            Ok(MapOutput::Viewed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_names_period_end() {
        let period = AccumulationPeriod::parse_start("2021090100").unwrap();
        let title = map_title(&period);
        assert_eq!(title.len(), 2);
        assert!(title[0].ends_with("ending on 2021-09-02 at 00 UTC"));
    }

    #[test]
    fn test_missing_linework_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_linework(Some(dir.path().join("coast.geojson").as_path()), "coastlines").is_empty());
        assert!(load_linework(None, "boundaries").is_empty());
    }
}
