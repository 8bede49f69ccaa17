//! Raster rendering for flash-flood report plots.
//!
//! Two outputs are supported:
//! - Bar charts of daily report counts ([`chart`])
//! - Symbol maps of report locations over a projected domain ([`map`])
//!
//! Shapes are drawn with tiny-skia, text with rusttype through imageproc,
//! and the result is encoded by the in-crate PNG writer.

pub mod canvas;
pub mod chart;
pub mod coastline;
pub mod map;
pub mod png;
pub mod style;
pub mod text;

use std::path::Path;

pub use chart::{BarChart, BarSeries};
pub use coastline::Coastlines;
pub use map::{MapLayer, MapView};
pub use style::{ChartStyle, CoastStyle, Color, Marker, SymbolRule, SymbolTable, TextStyle};
pub use text::TextRenderer;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),

    #[error("PNG encoding failed: {0}")]
    Encoding(String),

    #[error("Geometry error: {0}")]
    Geometry(String),

    #[error("Font error: {0}")]
    Font(String),

    #[error("Style error: {0}")]
    Style(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Turns chart and map descriptions into encoded PNG bytes.
pub trait Renderer {
    fn render_bar_chart(&self, chart: &BarChart) -> Result<Vec<u8>, RenderError>;

    fn render_map(&self, view: &MapView) -> Result<Vec<u8>, RenderError>;
}

/// tiny-skia backed renderer.
pub struct RasterRenderer {
    text: TextRenderer,
}

impl RasterRenderer {
    /// Loads the label font from `font_path`. Without a usable font the
    /// renderer still draws everything except text.
    pub fn new(font_path: Option<&Path>) -> Self {
        Self {
            text: TextRenderer::load(font_path),
        }
    }

    pub fn with_text(text: TextRenderer) -> Self {
        Self { text }
    }

    pub fn has_font(&self) -> bool {
        self.text.is_available()
    }
}

impl Renderer for RasterRenderer {
    fn render_bar_chart(&self, chart: &BarChart) -> Result<Vec<u8>, RenderError> {
        let image = chart::render(chart, &self.text)?;
        png::encode_image(&image)
    }

    fn render_map(&self, view: &MapView) -> Result<Vec<u8>, RenderError> {
        let image = map::render(view, &self.text)?;
        png::encode_image(&image)
    }
}
