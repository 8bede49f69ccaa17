//! Daily bar charts with a month-labelled date axis.
//!
//! The figure uses fixed subplot margins (left 12.5%, right 90%, bottom
//! 11%, top 88% of the figure) and scales fonts with the figure DPI.

use chrono::{Datelike, Duration, NaiveDate};
use image::RgbaImage;

use crate::canvas::{Canvas, LineStyle};
use crate::style::{ChartStyle, Color};
use crate::text::{Align, Label, TextRenderer, VAlign};
use crate::RenderError;

const LEFT: f64 = 0.125;
const RIGHT: f64 = 0.9;
const BOTTOM: f64 = 0.11;
const TOP: f64 = 0.88;

/// Fraction of the data span added on each side of the x axis.
const X_MARGIN: f64 = 0.05;
/// Headroom above the tallest bar.
const Y_MARGIN: f64 = 0.05;

/// One labelled series of daily values.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    pub label: String,
    pub colour: Color,
    pub values: Vec<(NaiveDate, f64)>,
}

impl BarSeries {
    pub fn new(label: impl Into<String>, colour: Color, values: Vec<(NaiveDate, f64)>) -> Self {
        Self {
            label: label.into(),
            colour,
            values,
        }
    }

    pub fn max_value(&self) -> f64 {
        self.values
            .iter()
            .map(|(_, v)| *v)
            .filter(|v| v.is_finite())
            .fold(0.0, f64::max)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<BarSeries>,
    pub style: ChartStyle,
}

impl BarChart {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            x_label: String::new(),
            y_label: String::new(),
            series: Vec::new(),
            style: ChartStyle::default(),
        }
    }

    pub fn with_axis_labels(mut self, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        self.x_label = x_label.into();
        self.y_label = y_label.into();
        self
    }

    pub fn with_series(mut self, series: BarSeries) -> Self {
        self.series.push(series);
        self
    }

    pub fn with_style(mut self, style: ChartStyle) -> Self {
        self.style = style;
        self
    }

    /// First and last date over all series.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut dates = self.series.iter().flat_map(|s| s.values.iter().map(|(d, _)| *d));
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }
}

/// Evenly spaced tick values from 0 covering `max`, using steps of
/// 1, 2, 2.5 or 5 times a power of ten.
pub fn nice_ticks(max: f64, target: usize) -> Vec<f64> {
    if !max.is_finite() || max <= 0.0 {
        return vec![0.0, 1.0];
    }
    let raw = max / target.max(1) as f64;
    let magnitude = 10f64.powf(raw.log10().floor());
    let step = [1.0, 2.0, 2.5, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|s| *s >= raw)
        .unwrap_or(10.0 * magnitude);

    let count = (max / step).floor() as usize;
    (0..=count).map(|i| i as f64 * step).collect()
}

/// First day of every month inside `[start, end]`.
pub fn month_ticks(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut ticks = Vec::new();
    let mut cursor = NaiveDate::from_ymd_opt(start.year(), start.month(), 1);
    while let Some(date) = cursor {
        if date > end {
            break;
        }
        if date >= start {
            ticks.push(date);
        }
        cursor = if date.month() == 12 {
            NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
        };
    }
    ticks
}

/// Visible x range in days relative to `first`: the data span plus half a
/// bar and a margin on each side.
fn x_limits(first: NaiveDate, last: NaiveDate, bar_width_days: f64) -> (f64, f64) {
    let span = (last - first).num_days().max(1) as f64;
    let half_bar = bar_width_days / 2.0;
    (
        -half_bar - X_MARGIN * span,
        span + half_bar + X_MARGIN * span,
    )
}

/// Month ticks for every month start inside the visible x range, which
/// reaches past the first and last bar.
pub fn axis_month_ticks(first: NaiveDate, last: NaiveDate, bar_width_days: f64) -> Vec<NaiveDate> {
    let (x_min, x_max) = x_limits(first, last, bar_width_days);
    let start = first + Duration::days(x_min.ceil() as i64);
    let end = first + Duration::days(x_max.floor() as i64);
    month_ticks(start, end)
}

fn format_tick(value: f64) -> String {
    if value.fract().abs() < 1e-9 {
        format!("{}", value as i64)
    } else {
        format!("{:.1}", value)
    }
}

/// Maps data coordinates (days since an origin, value) to pixels.
struct Axes {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
    origin: NaiveDate,
    x_min: f64,
    x_max: f64,
    y_max: f64,
}

impl Axes {
    fn days(&self, date: NaiveDate) -> f64 {
        (date - self.origin).num_days() as f64
    }

    fn x_px(&self, days: f64) -> f64 {
        self.left + (days - self.x_min) / (self.x_max - self.x_min) * self.width
    }

    fn y_px(&self, value: f64) -> f64 {
        self.top + self.height - value / self.y_max * self.height
    }

    fn px_per_day(&self) -> f64 {
        self.width / (self.x_max - self.x_min)
    }
}

/// Draw the chart into an RGBA image.
pub fn render(chart: &BarChart, text: &TextRenderer) -> Result<RgbaImage, RenderError> {
    let style = &chart.style;
    if !(style.dpi > 0.0 && style.width_in > 0.0 && style.height_in > 0.0) {
        return Err(RenderError::InvalidDimensions(format!(
            "figure {}x{} in at {} dpi",
            style.width_in, style.height_in, style.dpi
        )));
    }
    let (width, height) = style.pixel_size();
    let (first, last) = chart
        .date_range()
        .ok_or_else(|| RenderError::Geometry("bar chart has no values".to_string()))?;

    let (x_min, x_max) = x_limits(first, last, style.bar_width_days);
    let data_max = chart
        .series
        .iter()
        .map(BarSeries::max_value)
        .fold(0.0, f64::max);
    let y_ticks = nice_ticks(data_max, 6);
    let y_max = if data_max > 0.0 {
        data_max * (1.0 + Y_MARGIN)
    } else {
        y_ticks.last().copied().unwrap_or(1.0)
    };

    let (w, h) = (width as f64, height as f64);
    let axes = Axes {
        left: LEFT * w,
        top: (1.0 - TOP) * h,
        width: (RIGHT - LEFT) * w,
        height: (TOP - BOTTOM) * h,
        origin: first,
        x_min,
        x_max,
        y_max,
    };

    let mut canvas = Canvas::new(width, height, style.background)?;
    let clip = canvas.rect_mask(
        axes.left as f32,
        axes.top as f32,
        axes.width as f32,
        axes.height as f32,
    );

    // Bars, series drawn in order over each other
    let bar_px = style.bar_width_days * axes.px_per_day();
    let baseline = axes.y_px(0.0);
    for series in &chart.series {
        for (date, value) in &series.values {
            if !value.is_finite() || *value <= 0.0 {
                continue;
            }
            let centre = axes.x_px(axes.days(*date));
            let top = axes.y_px(*value);
            canvas.fill_rect(
                (centre - bar_px / 2.0) as f32,
                top as f32,
                bar_px.max(1.0) as f32,
                (baseline - top) as f32,
                series.colour,
                clip.as_ref(),
            );
        }
    }

    let axis_width = (0.8 * style.dpi / 72.0).max(1.0) as f32;
    let axis_line = LineStyle::solid(style.axis_colour, axis_width);
    canvas.stroke_rect(
        axes.left as f32,
        axes.top as f32,
        axes.width as f32,
        axes.height as f32,
        axis_line,
    );

    let tick_len = (3.5 * style.dpi / 72.0) as f32;
    let tick_px = style.pt_to_px(style.tick_font_pt);
    let axis_bottom = (axes.top + axes.height) as f32;
    let axis_left = axes.left as f32;

    for date in axis_month_ticks(first, last, style.bar_width_days) {
        let days = axes.days(date);
        if days < axes.x_min || days > axes.x_max {
            continue;
        }
        let x = axes.x_px(days) as f32;
        canvas.line((x, axis_bottom), (x, axis_bottom + tick_len), axis_line, None);
        canvas.label(
            Label::new(
                date.format("%Y-%m").to_string(),
                x,
                axis_bottom + tick_len * 2.0,
                tick_px,
                style.axis_colour,
            )
            .aligned(Align::Middle, VAlign::Top),
        );
    }

    for value in &y_ticks {
        if *value > axes.y_max {
            continue;
        }
        let y = axes.y_px(*value) as f32;
        canvas.line((axis_left - tick_len, y), (axis_left, y), axis_line, None);
        canvas.label(
            Label::new(format_tick(*value), axis_left - tick_len * 2.0, y, tick_px, style.axis_colour)
                .aligned(Align::End, VAlign::Middle),
        );
    }

    let label_px = style.pt_to_px(style.label_font_pt);
    let x_label_y = axis_bottom + tick_len * 2.0 + tick_px * 1.5 + style.pt_to_px(15.0);
    canvas.label(
        Label::new(
            chart.x_label.clone(),
            (axes.left + axes.width / 2.0) as f32,
            x_label_y,
            label_px,
            style.axis_colour,
        )
        .aligned(Align::Middle, VAlign::Top),
    );

    let widest_tick = y_ticks
        .iter()
        .map(|v| text.measure(&format_tick(*v), tick_px).0)
        .max()
        .unwrap_or(0) as f32;
    let y_label_x = axis_left - tick_len * 2.0 - widest_tick - style.pt_to_px(10.0) - label_px / 2.0;
    canvas.label(
        Label::new(
            chart.y_label.clone(),
            y_label_x,
            (axes.top + axes.height / 2.0) as f32,
            label_px,
            style.axis_colour,
        )
        .aligned(Align::Middle, VAlign::Middle)
        .vertical(),
    );

    canvas.label(
        Label::new(
            chart.title.clone(),
            (axes.left + axes.width / 2.0) as f32,
            axes.top as f32 - style.pt_to_px(15.0),
            style.pt_to_px(style.title_font_pt),
            style.axis_colour,
        )
        .aligned(Align::Middle, VAlign::Bottom),
    );

    draw_legend(&mut canvas, chart, &axes, text);

    canvas.finish(text)
}

/// Legend box in the upper right corner of the axes.
fn draw_legend(canvas: &mut Canvas, chart: &BarChart, axes: &Axes, text: &TextRenderer) {
    let labelled: Vec<&BarSeries> = chart.series.iter().filter(|s| !s.label.is_empty()).collect();
    if labelled.is_empty() {
        return;
    }
    let style = &chart.style;
    let font_px = style.pt_to_px(style.legend_font_pt);
    let pad = font_px * 0.5;
    let patch_w = font_px * 2.0;
    let patch_h = font_px * 0.7;
    let row_h = font_px * 1.4;

    let text_w = labelled
        .iter()
        .map(|s| text.measure(&s.label, font_px).0)
        .max()
        .unwrap_or(0) as f32;
    let box_w = pad * 3.0 + patch_w + text_w;
    let box_h = pad * 2.0 + row_h * labelled.len() as f32;
    let right = (axes.left + axes.width) as f32 - pad;
    let left = right - box_w;
    let top = axes.top as f32 + pad;

    canvas.fill_rect(left, top, box_w, box_h, Color::WHITE, None);
    canvas.stroke_rect(left, top, box_w, box_h, LineStyle::solid(Color::rgb(204, 204, 204), 1.0));

    for (i, series) in labelled.iter().enumerate() {
        let row_centre = top + pad + row_h * (i as f32 + 0.5);
        canvas.fill_rect(
            left + pad,
            row_centre - patch_h / 2.0,
            patch_w,
            patch_h,
            series.colour,
            None,
        );
        canvas.label(
            Label::new(
                series.label.clone(),
                left + pad * 2.0 + patch_w,
                row_centre,
                font_px,
                style.axis_colour,
            )
            .aligned(Align::Start, VAlign::Middle),
        );
    }
}
