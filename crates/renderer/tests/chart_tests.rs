//! Bar chart rendering through the `Renderer` trait.

use chrono::{Duration, NaiveDate};
use image::GenericImageView;
use renderer::{BarChart, BarSeries, ChartStyle, Color, RasterRenderer, RenderError, Renderer};

fn daily(year: i32, values: impl Fn(usize) -> f64) -> Vec<(NaiveDate, f64)> {
    let start = NaiveDate::from_ymd_opt(year, 1, 2).unwrap();
    (0..365)
        .map(|i| (start + Duration::days(i as i64), values(i)))
        .collect()
}

fn small_style() -> ChartStyle {
    ChartStyle {
        dpi: 20.0,
        ..ChartStyle::default()
    }
}

fn year_chart(values: Vec<(NaiveDate, f64)>) -> BarChart {
    BarChart::new("Count of point and gridded accumulated flash flood reports in 2021")
        .with_axis_labels("End of 24-h accumulation periods", "Counts")
        .with_series(BarSeries::new("Point", Color::RED, values))
        .with_style(small_style())
}

fn decode(png: &[u8]) -> image::RgbaImage {
    image::load_from_memory(png).unwrap().to_rgba8()
}

#[test]
fn test_figure_size_follows_style() {
    let renderer = RasterRenderer::new(None);
    let png = renderer
        .render_bar_chart(&year_chart(daily(2021, |i| (i % 7) as f64)))
        .unwrap();

    let image = image::load_from_memory(&png).unwrap();
    assert_eq!(image.dimensions(), (500, 160));
}

#[test]
fn test_bars_are_drawn_in_series_colour() {
    let renderer = RasterRenderer::new(None);
    let png = renderer
        .render_bar_chart(&year_chart(daily(2021, |_| 10.0)))
        .unwrap();
    let image = decode(&png);

    let red = image.pixels().filter(|p| p.0 == [255, 0, 0, 255]).count();
    assert!(red > 0, "expected red bars");
}

#[test]
fn test_zero_series_draws_no_bars() {
    let renderer = RasterRenderer::new(None);
    let png = renderer
        .render_bar_chart(&year_chart(daily(2021, |_| 0.0)))
        .unwrap();
    let image = decode(&png);

    // The only red pixels could come from the legend patch
    let legendless = BarChart {
        series: vec![BarSeries::new("", Color::RED, daily(2021, |_| 0.0))],
        ..year_chart(Vec::new())
    };
    let bare = decode(&renderer.render_bar_chart(&legendless).unwrap());
    assert!(bare.pixels().all(|p| p.0 != [255, 0, 0, 255]));
    assert!(image.pixels().any(|p| p.0 == [255, 0, 0, 255]));
}

#[test]
fn test_second_series_is_drawn() {
    let renderer = RasterRenderer::new(None);
    let chart = year_chart(daily(2021, |i| if i == 100 { 5.0 } else { 0.0 })).with_series(
        BarSeries::new("Grid", Color::BLACK, daily(2021, |i| if i == 200 { 4.0 } else { 0.0 })),
    );
    let image = decode(&renderer.render_bar_chart(&chart).unwrap());

    // Compare the column of the grid bar against a chart without it
    let single = decode(
        &renderer
            .render_bar_chart(&year_chart(daily(2021, |i| if i == 100 { 5.0 } else { 0.0 })))
            .unwrap(),
    );
    assert_ne!(image, single);
}

#[test]
fn test_chart_without_values_is_an_error() {
    let renderer = RasterRenderer::new(None);
    let chart = BarChart::new("empty").with_style(small_style());
    assert!(matches!(
        renderer.render_bar_chart(&chart),
        Err(RenderError::Geometry(_))
    ));
}

#[test]
fn test_invalid_dpi_rejected() {
    let renderer = RasterRenderer::new(None);
    let chart = year_chart(daily(2021, |_| 1.0)).with_style(ChartStyle {
        dpi: 0.0,
        ..ChartStyle::default()
    });
    assert!(matches!(
        renderer.render_bar_chart(&chart),
        Err(RenderError::InvalidDimensions(_))
    ));
}
