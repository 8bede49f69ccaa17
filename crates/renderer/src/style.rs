//! Colours, marker symbols and layout styles for charts and maps.
//!
//! Colour strings follow the conventions of the plotting configs this crate
//! replaces: named colours (`red`, `charcoal`), unit-range `rgb(r,g,b)` and
//! hex `#RRGGBB`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::RenderError;

/// An 8-bit RGBA colour, not premultiplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREY: Color = Color::rgb(128, 128, 128);
    pub const CHARCOAL: Color = Color::rgb(66, 66, 66);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Colour from unit-range components, as written in `rgb(0.8,0.8,0.8)`.
    pub fn from_unit_rgb(r: f64, g: f64, b: f64) -> Self {
        let channel = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::rgb(channel(r), channel(g), channel(b))
    }

    pub fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }

    pub fn to_rgba(self) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, self.a])
    }

    pub fn paint(self) -> tiny_skia::Paint<'static> {
        let mut paint = tiny_skia::Paint::default();
        paint.set_color_rgba8(self.r, self.g, self.b, self.a);
        paint.anti_alias = true;
        paint
    }

    fn named(name: &str) -> Option<Self> {
        let color = match name {
            "black" => Color::BLACK,
            "white" => Color::WHITE,
            "red" => Color::RED,
            "grey" | "gray" => Color::GREY,
            "charcoal" => Color::CHARCOAL,
            "blue" => Color::rgb(0, 0, 255),
            "green" => Color::rgb(0, 128, 0),
            "navy" => Color::rgb(0, 0, 128),
            "orange" => Color::rgb(255, 165, 0),
            "sky" => Color::rgb(135, 206, 235),
            _ => return None,
        };
        Some(color)
    }
}

/// Parse hex color string to RGB
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some((r, g, b))
}

/// Components of `rgb(r,g,b)`. Values above 1 are read as 0-255.
fn parse_rgb_function(inner: &str) -> Option<Color> {
    let parts: Vec<f64> = inner
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .ok()?;
    let [r, g, b] = parts.as_slice() else {
        return None;
    };
    if parts.iter().any(|v| *v < 0.0 || *v > 255.0) {
        return None;
    }
    if parts.iter().all(|v| *v <= 1.0) {
        Some(Color::from_unit_rgb(*r, *g, *b))
    } else {
        Some(Color::rgb(*r as u8, *g as u8, *b as u8))
    }
}

impl FromStr for Color {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();

        let parsed = if let Some(inner) = lower
            .strip_prefix("rgb(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            parse_rgb_function(inner)
        } else if lower.starts_with('#') {
            hex_to_rgb(&lower).map(|(r, g, b)| Color::rgb(r, g, b))
        } else {
            Color::named(&lower)
        };

        parsed.ok_or_else(|| RenderError::Style(format!("unrecognised colour '{}'", s)))
    }
}

impl TryFrom<String> for Color {
    type Error = RenderError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Marker shapes, identified by their numeric marker index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Marker {
    /// Outlined circle (index 4)
    Circle,
    /// Filled circle (index 15)
    FilledCircle,
}

impl TryFrom<u16> for Marker {
    type Error = RenderError;

    fn try_from(index: u16) -> Result<Self, Self::Error> {
        match index {
            4 => Ok(Marker::Circle),
            15 => Ok(Marker::FilledCircle),
            other => Err(RenderError::Style(format!("unsupported marker index {}", other))),
        }
    }
}

impl From<Marker> for u16 {
    fn from(marker: Marker) -> Self {
        match marker {
            Marker::Circle => 4,
            Marker::FilledCircle => 15,
        }
    }
}

/// One row of a symbol table: points with `min <= value <= max` are drawn
/// with this marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolRule {
    pub min: f64,
    pub max: f64,
    #[serde(default = "default_marker")]
    pub marker: Marker,
    pub colour: Color,
    /// Marker height in centimetres on the page.
    pub height_cm: f64,
    #[serde(default = "default_outline")]
    pub outline: bool,
}

fn default_marker() -> Marker {
    Marker::FilledCircle
}

fn default_outline() -> bool {
    true
}

impl SymbolRule {
    pub fn new(min: f64, max: f64, colour: Color, height_cm: f64) -> Self {
        Self {
            min,
            max,
            marker: Marker::FilledCircle,
            colour,
            height_cm,
            outline: true,
        }
    }

    pub fn matches(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Ordered value-range table. The first matching rule wins; values matching
/// no rule are not drawn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolTable {
    pub rules: Vec<SymbolRule>,
}

impl SymbolTable {
    pub fn new(rules: Vec<SymbolRule>) -> Self {
        Self { rules }
    }

    pub fn single(rule: SymbolRule) -> Self {
        Self { rules: vec![rule] }
    }

    pub fn select(&self, value: f64) -> Option<&SymbolRule> {
        self.rules.iter().find(|rule| rule.matches(value))
    }

    /// Grey dots on every in-domain grid point (value -1).
    pub fn domain_points() -> Self {
        Self::single(SymbolRule::new(
            -1.1,
            -0.9,
            Color::from_unit_rgb(0.8, 0.8, 0.8),
            0.1,
        ))
    }

    pub fn grid_reports() -> Self {
        Self::single(SymbolRule::new(-0.1, 0.1, Color::BLACK, 0.3))
    }

    pub fn point_reports() -> Self {
        Self::single(SymbolRule::new(-0.1, 0.1, Color::RED, 0.2))
    }
}

/// Coastline, boundary and graticule styling for a map view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoastStyle {
    pub coastline_colour: Color,
    pub coastline_thickness: f32,
    pub sea_shade: bool,
    pub sea_shade_colour: Color,
    pub boundaries: bool,
    pub boundaries_colour: Color,
    pub boundaries_thickness: f32,
    /// Graticule spacing in degrees
    pub grid_latitude_increment: f64,
    pub grid_longitude_increment: f64,
    pub grid_colour: Color,
    pub grid_thickness: f32,
    pub label_colour: Color,
    /// Graticule label height in centimetres.
    pub label_height_cm: f64,
}

impl Default for CoastStyle {
    fn default() -> Self {
        Self {
            coastline_colour: Color::CHARCOAL,
            coastline_thickness: 2.0,
            sea_shade: true,
            sea_shade_colour: Color::from_unit_rgb(0.665, 0.9193, 0.9108),
            boundaries: true,
            boundaries_colour: Color::CHARCOAL,
            boundaries_thickness: 4.0,
            grid_latitude_increment: 10.0,
            grid_longitude_increment: 20.0,
            grid_colour: Color::CHARCOAL,
            grid_thickness: 1.0,
            label_colour: Color::CHARCOAL,
            label_height_cm: 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub colour: Color,
    pub font_size_cm: f64,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            colour: Color::CHARCOAL,
            font_size_cm: 0.6,
        }
    }
}

/// Figure geometry and fonts for bar charts. Sizes are in inches and points
/// and scale with `dpi`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartStyle {
    pub width_in: f64,
    pub height_in: f64,
    pub dpi: f64,
    /// Bar width as a fraction of one day.
    pub bar_width_days: f64,
    pub title_font_pt: f64,
    pub label_font_pt: f64,
    pub tick_font_pt: f64,
    pub legend_font_pt: f64,
    pub background: Color,
    pub axis_colour: Color,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            width_in: 25.0,
            height_in: 8.0,
            // The published charts were saved at 1000 dpi
            dpi: 100.0,
            bar_width_days: 0.5,
            title_font_pt: 18.0,
            label_font_pt: 16.0,
            tick_font_pt: 16.0,
            legend_font_pt: 14.0,
            background: Color::WHITE,
            axis_colour: Color::BLACK,
        }
    }
}

impl ChartStyle {
    pub fn pixel_size(&self) -> (u32, u32) {
        (
            (self.width_in * self.dpi).round() as u32,
            (self.height_in * self.dpi).round() as u32,
        )
    }

    /// Font size in points to pixels.
    pub fn pt_to_px(&self, pt: f64) -> f32 {
        (pt * self.dpi / 72.0) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_named_and_hex() {
        assert_eq!("red".parse::<Color>().unwrap(), Color::RED);
        assert_eq!("Charcoal".parse::<Color>().unwrap(), Color::CHARCOAL);
        assert_eq!("#00ff00".parse::<Color>().unwrap(), Color::rgb(0, 255, 0));
        assert!("chartreuse-ish".parse::<Color>().is_err());
    }

    #[test]
    fn test_parse_unit_rgb() {
        let c: Color = "rgb(0.8,0.8,0.8)".parse().unwrap();
        assert_eq!(c, Color::rgb(204, 204, 204));

        let sea: Color = "rgb(0.665, 0.9193, 0.9108)".parse().unwrap();
        assert_eq!(sea, CoastStyle::default().sea_shade_colour);
    }

    #[test]
    fn test_parse_byte_rgb() {
        assert_eq!("rgb(255,0,10)".parse::<Color>().unwrap(), Color::rgb(255, 0, 10));
        assert!("rgb(1,2)".parse::<Color>().is_err());
    }

    #[test]
    fn test_symbol_table_select_is_inclusive() {
        let table = SymbolTable::domain_points();
        assert!(table.select(-1.0).is_some());
        assert!(table.select(-1.1).is_some());
        assert!(table.select(0.0).is_none());
    }

    #[test]
    fn test_first_rule_wins() {
        let table = SymbolTable::new(vec![
            SymbolRule::new(0.0, 10.0, Color::RED, 0.2),
            SymbolRule::new(5.0, 20.0, Color::BLACK, 0.3),
        ]);
        assert_eq!(table.select(7.0).unwrap().colour, Color::RED);
        assert_eq!(table.select(15.0).unwrap().colour, Color::BLACK);
    }

    #[test]
    fn test_chart_pixel_size() {
        let style = ChartStyle::default();
        assert_eq!(style.pixel_size(), (2500, 800));
        assert!((style.pt_to_px(72.0) - 100.0).abs() < 1e-4);
    }
}
