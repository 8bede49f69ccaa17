//! Symbol maps over a projected lat/lon domain.
//!
//! Sizes given in centimetres refer to a 29.7 cm wide page, so marker and
//! label sizes scale with the output width.

use ff_common::{BoundingBox, GeoPoints};
use image::RgbaImage;
use projection::{Crs, Projection};

use crate::canvas::{Canvas, LineStyle};
use crate::coastline::{Coastlines, Polyline};
use crate::style::{CoastStyle, Color, Marker, SymbolTable, TextStyle};
use crate::text::{Align, Label, TextRenderer, VAlign};
use crate::RenderError;

/// Page width that centimetre sizes refer to.
pub const PAGE_WIDTH_CM: f64 = 29.7;

const MARGIN_CM: f64 = 2.0;

/// Points drawn with a symbol table.
#[derive(Debug, Clone, PartialEq)]
pub struct MapLayer {
    pub points: GeoPoints,
    pub symbols: SymbolTable,
}

impl MapLayer {
    pub fn new(points: GeoPoints, symbols: SymbolTable) -> Self {
        Self { points, symbols }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    /// Domain corners in degrees (x = longitude, y = latitude).
    pub domain: BoundingBox,
    pub crs: Crs,
    pub coast: CoastStyle,
    pub coastlines: Coastlines,
    pub boundaries: Coastlines,
    /// Drawn in order, later layers on top.
    pub layers: Vec<MapLayer>,
    pub title: Vec<String>,
    pub title_style: TextStyle,
    pub width_px: u32,
}

impl MapView {
    pub fn new(domain: BoundingBox, width_px: u32) -> Self {
        Self {
            domain,
            crs: Crs::default(),
            coast: CoastStyle::default(),
            coastlines: Coastlines::default(),
            boundaries: Coastlines::default(),
            layers: Vec::new(),
            title: Vec::new(),
            title_style: TextStyle::default(),
            width_px,
        }
    }

    pub fn with_layer(mut self, layer: MapLayer) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn with_title(mut self, lines: Vec<String>) -> Self {
        self.title = lines;
        self
    }
}

/// Pixel placement of the projected domain on the page.
struct Frame {
    projection: Box<dyn Projection>,
    extent: BoundingBox,
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

impl Frame {
    fn to_px(&self, lon: f64, lat: f64) -> (f32, f32) {
        let (x, y) = self.projection.forward(lon, lat);
        let px = self.left + (x - self.extent.min_x) / self.extent.width() * self.width;
        let py = self.top + (self.extent.max_y - y) / self.extent.height() * self.height;
        (px as f32, py as f32)
    }

    fn line_px(&self, line: &Polyline) -> Vec<(f32, f32)> {
        line.iter().map(|(lon, lat)| self.to_px(*lon, *lat)).collect()
    }
}

/// Graticule values: multiples of `step` inside `[lo, hi]`.
pub fn graticule(lo: f64, hi: f64, step: f64) -> Vec<f64> {
    if step.is_nan() || step <= 0.0 || lo > hi {
        return Vec::new();
    }
    let first = (lo / step).ceil() as i64;
    let last = (hi / step).floor() as i64;
    (first..=last).map(|i| i as f64 * step).collect()
}

pub fn format_latitude(lat: f64) -> String {
    if lat.abs() < 1e-9 {
        "0°".to_string()
    } else if lat > 0.0 {
        format!("{}°N", lat.abs())
    } else {
        format!("{}°S", lat.abs())
    }
}

pub fn format_longitude(lon: f64) -> String {
    let lon = ff_common::normalize_lon(lon);
    if lon.abs() < 1e-9 || (lon.abs() - 180.0).abs() < 1e-9 {
        format!("{}°", lon.abs())
    } else if lon > 0.0 {
        format!("{}°E", lon)
    } else {
        format!("{}°W", lon.abs())
    }
}

/// Line thickness index to pixels.
fn thickness_px(thickness: f32, px_per_cm: f64) -> f32 {
    (thickness as f64 * (px_per_cm * 0.02).max(1.0)) as f32
}

/// Draw the map into an RGBA image.
pub fn render(view: &MapView, text: &TextRenderer) -> Result<RgbaImage, RenderError> {
    if view.width_px == 0 {
        return Err(RenderError::InvalidDimensions("map width is 0".to_string()));
    }
    let domain = &view.domain;
    if !(domain.min_x < domain.max_x && domain.min_y < domain.max_y) {
        return Err(RenderError::Geometry(format!(
            "degenerate map domain {:?}",
            domain
        )));
    }

    let width = view.width_px as f64;
    let px_per_cm = width / PAGE_WIDTH_CM;
    let margin = MARGIN_CM * px_per_cm;

    let projection = view.crs.projection();
    let extent = projection.project_bbox(domain);
    let map_width = width - 2.0 * margin;
    let map_height = map_width * extent.height() / extent.width();

    let title_px = view.title_style.font_size_cm * px_per_cm;
    let title_band = title_px * 1.5 * view.title.len() as f64;
    let top = margin + title_band;
    let height = (top + map_height + margin).ceil();

    let frame = Frame {
        projection,
        extent,
        left: margin,
        top,
        width: map_width,
        height: map_height,
    };

    let mut canvas = Canvas::new(view.width_px, height as u32, Color::WHITE)?;
    let clip = canvas.rect_mask(
        frame.left as f32,
        frame.top as f32,
        frame.width as f32,
        frame.height as f32,
    );
    let clip = clip.as_ref();
    let coast = &view.coast;

    if coast.sea_shade {
        canvas.fill_rect(
            frame.left as f32,
            frame.top as f32,
            frame.width as f32,
            frame.height as f32,
            coast.sea_shade_colour,
            clip,
        );
        for polygon in &view.coastlines.polygons {
            let rings: Vec<Vec<(f32, f32)>> = polygon.iter().map(|r| frame.line_px(r)).collect();
            canvas.fill_rings(&rings, Color::WHITE, clip);
        }
    }

    let grid_line = LineStyle::dashed(
        coast.grid_colour,
        thickness_px(coast.grid_thickness, px_per_cm),
        (0.2 * px_per_cm) as f32,
        (0.1 * px_per_cm) as f32,
    );
    let lats = graticule(domain.min_y, domain.max_y, coast.grid_latitude_increment);
    let lons = graticule(domain.min_x, domain.max_x, coast.grid_longitude_increment);
    for lat in &lats {
        let from = frame.to_px(domain.min_x, *lat);
        let to = frame.to_px(domain.max_x, *lat);
        canvas.line(from, to, grid_line, clip);
    }
    for lon in &lons {
        let from = frame.to_px(*lon, domain.min_y);
        let to = frame.to_px(*lon, domain.max_y);
        canvas.line(from, to, grid_line, clip);
    }

    let coast_line = LineStyle::solid(
        coast.coastline_colour,
        thickness_px(coast.coastline_thickness, px_per_cm),
    );
    for line in view.coastlines.outlines() {
        canvas.polyline(&frame.line_px(line), coast_line, clip);
    }

    if coast.boundaries {
        let boundary_line = LineStyle::solid(
            coast.boundaries_colour,
            thickness_px(coast.boundaries_thickness, px_per_cm),
        );
        for line in view.boundaries.outlines() {
            canvas.polyline(&frame.line_px(line), boundary_line, clip);
        }
    }

    for layer in &view.layers {
        draw_layer(&mut canvas, &frame, layer, px_per_cm, clip);
    }

    canvas.stroke_rect(
        frame.left as f32,
        frame.top as f32,
        frame.width as f32,
        frame.height as f32,
        LineStyle::solid(coast.coastline_colour, thickness_px(1.0, px_per_cm)),
    );

    // Labels on the left and bottom edges only
    let label_px = (coast.label_height_cm * px_per_cm) as f32;
    let gap = (0.2 * px_per_cm) as f32;
    for lat in &lats {
        let (_, y) = frame.to_px(domain.min_x, *lat);
        canvas.label(
            Label::new(format_latitude(*lat), frame.left as f32 - gap, y, label_px, coast.label_colour)
                .aligned(Align::End, VAlign::Middle),
        );
    }
    let bottom = (frame.top + frame.height) as f32;
    for lon in &lons {
        let (x, _) = frame.to_px(*lon, domain.min_y);
        canvas.label(
            Label::new(format_longitude(*lon), x, bottom + gap, label_px, coast.label_colour)
                .aligned(Align::Middle, VAlign::Top),
        );
    }

    for (i, line) in view.title.iter().enumerate() {
        canvas.label(
            Label::new(
                line.clone(),
                (width / 2.0) as f32,
                (margin + title_px * 1.5 * i as f64) as f32,
                title_px as f32,
                view.title_style.colour,
            )
            .aligned(Align::Middle, VAlign::Top),
        );
    }

    canvas.finish(text)
}

fn draw_layer(
    canvas: &mut Canvas,
    frame: &Frame,
    layer: &MapLayer,
    px_per_cm: f64,
    clip: Option<&tiny_skia::Mask>,
) {
    for point in &layer.points {
        let Some(rule) = layer.symbols.select(point.value) else {
            continue;
        };
        let (x, y) = frame.to_px(point.lon, point.lat);
        let radius = (rule.height_cm * px_per_cm / 2.0) as f32;
        let outline_width = (radius * 0.15).max(1.0);
        let (fill, outline) = match rule.marker {
            Marker::FilledCircle => (
                Some(rule.colour),
                rule.outline.then(|| LineStyle::solid(Color::BLACK, outline_width)),
            ),
            Marker::Circle => (None, Some(LineStyle::solid(rule.colour, outline_width))),
        };
        canvas.circle(x, y, radius, fill, outline, clip);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graticule() {
        assert_eq!(graticule(22.0, 52.0, 10.0), vec![30.0, 40.0, 50.0]);
        assert_eq!(graticule(-130.0, -60.0, 20.0), vec![-120.0, -100.0, -80.0, -60.0]);
        assert!(graticule(0.0, 10.0, 0.0).is_empty());
    }

    #[test]
    fn test_coordinate_labels() {
        assert_eq!(format_latitude(30.0), "30°N");
        assert_eq!(format_latitude(-10.0), "10°S");
        assert_eq!(format_latitude(0.0), "0°");
        assert_eq!(format_longitude(-120.0), "120°W");
        assert_eq!(format_longitude(20.0), "20°E");
        assert_eq!(format_longitude(180.0), "180°");
    }

    #[test]
    fn test_frame_corners() {
        let domain = BoundingBox::new(-130.0, 22.0, -60.0, 52.0);
        let projection = Crs::Epsg3857.projection();
        let extent = projection.project_bbox(&domain);
        let frame = Frame {
            projection,
            extent,
            left: 10.0,
            top: 20.0,
            width: 100.0,
            height: 50.0,
        };

        let (x, y) = frame.to_px(-130.0, 52.0);
        assert!((x - 10.0).abs() < 1e-3 && (y - 20.0).abs() < 1e-3);
        let (x, y) = frame.to_px(-60.0, 22.0);
        assert!((x - 110.0).abs() < 1e-3 && (y - 70.0).abs() < 1e-3);
    }
}
