//! Text measurement and glyph drawing.
//!
//! With a font configured, glyphs are rasterized by `fontdue` and blitted as
//! small coverage pixmaps. Without one, every visible character is drawn as
//! a solid block so layout and output stay deterministic.

use std::path::Path;

use fontdue::{Font, FontSettings};
use tiny_skia::{FilterQuality, Pixmap, PixmapPaint, Rect, Transform};

use scenecast_common::{RenderConfig, SceneCastError, SceneCastResult};
use scenecast_scene_model::Rgba;

use crate::paint::solid;

/// Advance of a block glyph, in ems.
const BLOCK_ADVANCE_EM: f32 = 0.6;
const BLOCK_ASCENT_EM: f32 = 0.8;
const BLOCK_DESCENT_EM: f32 = 0.2;

/// Vertical metrics of one line at a given size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineMetrics {
    pub ascent: f32,
    pub descent: f32,
}

impl LineMetrics {
    pub fn height(&self) -> f32 {
        self.ascent + self.descent
    }
}

/// Glyph source for all text drawing.
pub struct GlyphRasterizer {
    font: Option<Font>,
}

impl std::fmt::Debug for GlyphRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlyphRasterizer")
            .field("font", &self.font.as_ref().map(|_| "fontdue"))
            .finish()
    }
}

impl Default for GlyphRasterizer {
    fn default() -> Self {
        Self::block()
    }
}

impl GlyphRasterizer {
    /// Built-in block glyphs.
    pub fn block() -> Self {
        Self { font: None }
    }

    pub fn from_bytes(bytes: &[u8]) -> SceneCastResult<Self> {
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|e| SceneCastError::render(format!("invalid font: {e}")))?;
        Ok(Self { font: Some(font) })
    }

    pub fn from_file(path: impl AsRef<Path>) -> SceneCastResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SceneCastError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Use the configured font, or block glyphs when none is set.
    pub fn from_config(config: &RenderConfig) -> SceneCastResult<Self> {
        match &config.font_path {
            Some(path) => {
                let glyphs = Self::from_file(path)?;
                tracing::debug!(font = %path.display(), "Loaded font");
                Ok(glyphs)
            }
            None => Ok(Self::block()),
        }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    pub fn line_metrics(&self, size: f32) -> LineMetrics {
        if let Some(m) = self.font.as_ref().and_then(|f| f.horizontal_line_metrics(size)) {
            return LineMetrics {
                ascent: m.ascent,
                descent: -m.descent,
            };
        }
        LineMetrics {
            ascent: size * BLOCK_ASCENT_EM,
            descent: size * BLOCK_DESCENT_EM,
        }
    }

    pub fn advance(&self, ch: char, size: f32) -> f32 {
        match &self.font {
            Some(font) => font.metrics(ch, size).advance_width,
            None => size * BLOCK_ADVANCE_EM,
        }
    }

    /// Width of a single line of text.
    pub fn measure_line(&self, line: &str, size: f32) -> f32 {
        line.chars().map(|ch| self.advance(ch, size)).sum()
    }

    /// Draw one line with its baseline at `(x, baseline)` in local space.
    pub fn draw_line(
        &self,
        pixmap: &mut Pixmap,
        line: &str,
        x: f32,
        baseline: f32,
        size: f32,
        color: Rgba,
        transform: Transform,
    ) {
        if color.a == 0 || size <= 0.0 {
            return;
        }
        let mut cursor = x;
        for ch in line.chars() {
            if !ch.is_whitespace() {
                match &self.font {
                    Some(font) => draw_font_glyph(pixmap, font, ch, cursor, baseline, size, color, transform),
                    None => draw_block_glyph(pixmap, cursor, baseline, size, color, transform),
                }
            }
            cursor += self.advance(ch, size);
        }
    }

    /// Rasterize a line into its own pixmap, tightly sized to the line box.
    pub fn line_mask(&self, line: &str, size: f32) -> Option<Pixmap> {
        let metrics = self.line_metrics(size);
        let width = self.measure_line(line, size).ceil().max(1.0) as u32;
        let height = metrics.height().ceil().max(1.0) as u32;
        let mut mask = Pixmap::new(width, height)?;
        self.draw_line(
            &mut mask,
            line,
            0.0,
            metrics.ascent,
            size,
            Rgba::WHITE,
            Transform::identity(),
        );
        Some(mask)
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_font_glyph(
    pixmap: &mut Pixmap,
    font: &Font,
    ch: char,
    x: f32,
    baseline: f32,
    size: f32,
    color: Rgba,
    transform: Transform,
) {
    let (metrics, coverage) = font.rasterize(ch, size);
    if metrics.width == 0 || metrics.height == 0 {
        return;
    }
    let Some(mut glyph) = Pixmap::new(metrics.width as u32, metrics.height as u32) else {
        return;
    };

    for (dst, cov) in glyph.data_mut().chunks_exact_mut(4).zip(coverage.iter()) {
        let alpha = (*cov as u32 * color.a as u32 + 127) / 255;
        dst[0] = ((color.r as u32 * alpha + 127) / 255) as u8;
        dst[1] = ((color.g as u32 * alpha + 127) / 255) as u8;
        dst[2] = ((color.b as u32 * alpha + 127) / 255) as u8;
        dst[3] = alpha as u8;
    }

    let gx = x + metrics.xmin as f32;
    let gy = baseline - (metrics.height as f32 + metrics.ymin as f32);
    let paint = PixmapPaint {
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };
    pixmap.draw_pixmap(0, 0, glyph.as_ref(), &paint, transform.pre_translate(gx, gy), None);
}

fn draw_block_glyph(
    pixmap: &mut Pixmap,
    x: f32,
    baseline: f32,
    size: f32,
    color: Rgba,
    transform: Transform,
) {
    let w = size * (BLOCK_ADVANCE_EM - 0.1);
    let h = size * (BLOCK_ASCENT_EM - 0.1);
    if let Some(rect) = Rect::from_xywh(x + size * 0.05, baseline - h, w, h) {
        pixmap.fill_rect(rect, &solid(color), transform, None);
    }
}
