//! Drawing surface shared by the chart and map renderers.
//!
//! Shapes go straight to a tiny-skia pixmap. Text is queued and drawn
//! after the pixmap is converted, so labels always sit on top.

use image::RgbaImage;
use tiny_skia::{
    FillRule, LineCap, LineJoin, Mask, Path, PathBuilder, Pixmap, Rect, Stroke, StrokeDash,
    Transform,
};

use crate::style::Color;
use crate::text::{Label, TextRenderer};
use crate::RenderError;

/// Line styling for strokes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    pub color: Color,
    pub width: f32,
    /// Dash and gap length in pixels; solid when `None`.
    pub dash: Option<(f32, f32)>,
}

impl LineStyle {
    pub fn solid(color: Color, width: f32) -> Self {
        Self {
            color,
            width,
            dash: None,
        }
    }

    pub fn dashed(color: Color, width: f32, dash: f32, gap: f32) -> Self {
        Self {
            color,
            width,
            dash: Some((dash, gap)),
        }
    }

    fn stroke(&self) -> Stroke {
        let mut stroke = Stroke::default();
        stroke.width = self.width;
        stroke.line_cap = LineCap::Round;
        stroke.line_join = LineJoin::Round;
        stroke.dash = self.dash.and_then(|(on, off)| StrokeDash::new(vec![on, off], 0.0));
        stroke
    }
}

pub struct Canvas {
    pixmap: Pixmap,
    labels: Vec<Label>,
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: Color) -> Result<Self, RenderError> {
        let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
            RenderError::InvalidDimensions(format!("cannot allocate a {}x{} canvas", width, height))
        })?;
        pixmap.fill(background.to_skia());
        Ok(Self {
            pixmap,
            labels: Vec::new(),
        })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Mask admitting only the given rectangle.
    pub fn rect_mask(&self, x: f32, y: f32, w: f32, h: f32) -> Option<Mask> {
        let rect = Rect::from_xywh(x, y, w, h)?;
        let mut mask = Mask::new(self.width(), self.height())?;
        mask.fill_path(
            &PathBuilder::from_rect(rect),
            FillRule::Winding,
            false,
            Transform::identity(),
        );
        Some(mask)
    }

    /// Zero or negative sized rectangles are skipped.
    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color, clip: Option<&Mask>) {
        if let Some(rect) = Rect::from_xywh(x, y, w, h) {
            let mut paint = color.paint();
            paint.anti_alias = false;
            self.pixmap
                .fill_rect(rect, &paint, Transform::identity(), clip);
        }
    }

    pub fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32, line: LineStyle) {
        if let Some(rect) = Rect::from_xywh(x, y, w, h) {
            let path = PathBuilder::from_rect(rect);
            self.stroke_path(&path, line, None);
        }
    }

    pub fn line(&mut self, from: (f32, f32), to: (f32, f32), line: LineStyle, clip: Option<&Mask>) {
        self.polyline(&[from, to], line, clip);
    }

    /// Stroke connected points. Fewer than two points draws nothing.
    pub fn polyline(&mut self, points: &[(f32, f32)], line: LineStyle, clip: Option<&Mask>) {
        if let Some(path) = build_path(points, false) {
            self.stroke_path(&path, line, clip);
        }
    }

    /// Fill one or more rings with the even-odd rule so inner rings cut holes.
    pub fn fill_rings(&mut self, rings: &[Vec<(f32, f32)>], color: Color, clip: Option<&Mask>) {
        let mut pb = PathBuilder::new();
        for ring in rings.iter().filter(|r| r.len() >= 3) {
            pb.move_to(ring[0].0, ring[0].1);
            for &(x, y) in &ring[1..] {
                pb.line_to(x, y);
            }
            pb.close();
        }
        if let Some(path) = pb.finish() {
            self.pixmap.fill_path(
                &path,
                &color.paint(),
                FillRule::EvenOdd,
                Transform::identity(),
                clip,
            );
        }
    }

    /// Filled circle with an optional outline.
    pub fn circle(
        &mut self,
        cx: f32,
        cy: f32,
        radius: f32,
        fill: Option<Color>,
        outline: Option<LineStyle>,
        clip: Option<&Mask>,
    ) {
        let Some(path) = PathBuilder::from_circle(cx, cy, radius) else {
            return;
        };
        if let Some(color) = fill {
            self.pixmap.fill_path(
                &path,
                &color.paint(),
                FillRule::Winding,
                Transform::identity(),
                clip,
            );
        }
        if let Some(line) = outline {
            self.stroke_path(&path, line, clip);
        }
    }

    pub fn label(&mut self, label: Label) {
        self.labels.push(label);
    }

    /// Flatten shapes to an RGBA image and draw the queued labels on it.
    pub fn finish(self, text: &TextRenderer) -> Result<RgbaImage, RenderError> {
        let (width, height) = (self.pixmap.width(), self.pixmap.height());
        let mut data = Vec::with_capacity(self.pixmap.data().len());
        for pixel in self.pixmap.pixels() {
            let c = pixel.demultiply();
            data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }

        let mut image = RgbaImage::from_raw(width, height, data).ok_or_else(|| {
            RenderError::InvalidDimensions(format!("pixel buffer does not fit {}x{}", width, height))
        })?;

        for label in &self.labels {
            text.draw(&mut image, label);
        }
        Ok(image)
    }

    fn stroke_path(&mut self, path: &Path, line: LineStyle, clip: Option<&Mask>) {
        self.pixmap.stroke_path(
            path,
            &line.color.paint(),
            &line.stroke(),
            Transform::identity(),
            clip,
        );
    }
}

fn build_path(points: &[(f32, f32)], close: bool) -> Option<Path> {
    let (first, rest) = points.split_first()?;
    if rest.is_empty() {
        return None;
    }
    let mut pb = PathBuilder::new();
    pb.move_to(first.0, first.1);
    for &(x, y) in rest {
        pb.line_to(x, y);
    }
    if close {
        pb.close();
    }
    pb.finish()
}
