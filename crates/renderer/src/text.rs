//! Text drawing with an optional TrueType font.

use std::path::Path;

use image::{imageops, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use rusttype::{Font, Scale};
use tracing::{debug, warn};

use crate::style::Color;
use crate::RenderError;

/// Horizontal placement of text relative to its anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Start,
    Middle,
    End,
}

/// Vertical placement of text relative to its anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VAlign {
    Top,
    Middle,
    Bottom,
}

/// Draws text when a font is loaded, and silently skips it otherwise.
pub struct TextRenderer {
    font: Option<Font<'static>>,
}

impl TextRenderer {
    /// Load a font from disk. A missing path or unreadable font logs a
    /// warning and yields a renderer without text.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            warn!("No font configured, plots will have no text");
            return Self::disabled();
        };

        match std::fs::read(path) {
            Ok(bytes) => match Self::from_bytes(bytes) {
                Ok(renderer) => {
                    debug!(path = %path.display(), "Loaded font");
                    renderer
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to parse font, plots will have no text");
                    Self::disabled()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read font, plots will have no text");
                Self::disabled()
            }
        }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, RenderError> {
        let font = Font::try_from_vec(bytes)
            .ok_or_else(|| RenderError::Font("not a TrueType font".to_string()))?;
        Ok(Self { font: Some(font) })
    }

    pub fn disabled() -> Self {
        Self { font: None }
    }

    pub fn is_available(&self) -> bool {
        self.font.is_some()
    }

    /// Rendered size of `text` in pixels, or (0, 0) without a font.
    pub fn measure(&self, text: &str, size_px: f32) -> (i32, i32) {
        match &self.font {
            Some(font) => text_size(Scale::uniform(size_px), font, text),
            None => (0, 0),
        }
    }

    /// Draw a label onto `image`.
    pub fn draw(&self, image: &mut RgbaImage, label: &Label) {
        let Some(font) = &self.font else {
            return;
        };
        if label.text.trim().is_empty() {
            return;
        }

        let scale = Scale::uniform(label.size_px);
        let color = label.color.to_rgba();
        let (w, h) = text_size(scale, font, &label.text);

        if label.vertical {
            if w <= 0 || h <= 0 {
                return;
            }
            let mut patch = RgbaImage::from_pixel(w as u32, h as u32, Rgba([0, 0, 0, 0]));
            draw_text_mut(&mut patch, color, 0, 0, scale, font, &label.text);
            // Reads bottom to top
            let rotated = imageops::rotate270(&patch);
            let (left, top) = anchor_offset(
                label.x,
                label.y,
                rotated.width() as i32,
                rotated.height() as i32,
                label.align,
                label.valign,
            );
            imageops::overlay(image, &rotated, left as i64, top as i64);
        } else {
            let (left, top) = anchor_offset(label.x, label.y, w, h, label.align, label.valign);
            draw_text_mut(image, color, left, top, scale, font, &label.text);
        }
    }
}

/// A piece of text positioned by an anchor point.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub size_px: f32,
    pub color: Color,
    pub align: Align,
    pub valign: VAlign,
    pub vertical: bool,
}

impl Label {
    pub fn new(text: impl Into<String>, x: f32, y: f32, size_px: f32, color: Color) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            size_px,
            color,
            align: Align::Start,
            valign: VAlign::Top,
            vertical: false,
        }
    }

    pub fn aligned(mut self, align: Align, valign: VAlign) -> Self {
        self.align = align;
        self.valign = valign;
        self
    }

    pub fn vertical(mut self) -> Self {
        self.vertical = true;
        self
    }
}

fn anchor_offset(x: f32, y: f32, w: i32, h: i32, align: Align, valign: VAlign) -> (i32, i32) {
    let x = x.round() as i32;
    let y = y.round() as i32;
    let left = match align {
        Align::Start => x,
        Align::Middle => x - w / 2,
        Align::End => x - w,
    };
    let top = match valign {
        VAlign::Top => y,
        VAlign::Middle => y - h / 2,
        VAlign::Bottom => y - h,
    };
    (left, top)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_renderer_is_a_no_op() {
        let text = TextRenderer::disabled();
        let mut image = RgbaImage::from_pixel(10, 10, Rgba([255, 255, 255, 255]));
        let before = image.clone();

        text.draw(&mut image, &Label::new("2021-09", 1.0, 1.0, 8.0, Color::BLACK));
        text.draw(&mut image, &Label::new("Counts", 5.0, 5.0, 8.0, Color::BLACK).vertical());

        assert_eq!(image, before);
        assert_eq!(text.measure("Counts", 12.0), (0, 0));
    }

    #[test]
    fn test_missing_font_file_disables_text() {
        let dir = tempfile::tempdir().unwrap();
        let text = TextRenderer::load(Some(dir.path().join("absent.ttf").as_path()));
        assert!(!text.is_available());
        assert!(!TextRenderer::load(None).is_available());
    }

    #[test]
    fn test_garbage_font_bytes_rejected() {
        assert!(matches!(
            TextRenderer::from_bytes(vec![0, 1, 2, 3]),
            Err(RenderError::Font(_))
        ));
    }

    #[test]
    fn test_anchor_offset() {
        assert_eq!(anchor_offset(100.0, 50.0, 20, 10, Align::Middle, VAlign::Middle), (90, 45));
        assert_eq!(anchor_offset(100.0, 50.0, 20, 10, Align::End, VAlign::Bottom), (80, 40));
        assert_eq!(anchor_offset(100.0, 50.0, 20, 10, Align::Start, VAlign::Top), (100, 50));
    }
}
