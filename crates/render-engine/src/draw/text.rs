use tiny_skia::Rect;

use scenecast_scene_model::{TextAlign, TextProps};

use super::{revealed_lines, DrawContext, Pass};
use crate::glyphs::GlyphRasterizer;
use crate::paint::solid;

pub(super) fn measure(glyphs: &GlyphRasterizer, p: &TextProps) -> (f64, f64) {
    let size = p.font_size as f32;
    let pad = p.padding as f32;
    let line_h = size * p.line_height as f32;
    let lines = p.text.split('\n');
    let count = lines.clone().count() as f32;
    let widest = lines
        .map(|l| glyphs.measure_line(l, size))
        .fold(0.0f32, f32::max);
    ((widest + pad * 2.0) as f64, (line_h * count + pad * 2.0) as f64)
}

pub(super) fn paint(ctx: &mut DrawContext<'_>, p: &TextProps, pass: &Pass) {
    if let Some(bg) = p.background {
        if let Some(rect) = Rect::from_xywh(0.0, 0.0, pass.width, pass.height) {
            ctx.pixmap
                .fill_rect(rect, &solid(pass.color(bg)), pass.transform, None);
        }
    }

    let size = p.font_size as f32;
    let pad = p.padding as f32;
    let line_h = size * p.line_height as f32;
    let metrics = ctx.glyphs.line_metrics(size);
    let inner_w = pass.width - pad * 2.0;
    let color = pass.color(p.color);

    let full_lines = p.text.split('\n');
    let shown = revealed_lines(&p.text, pass.anim.reveal);
    for (i, (full, visible)) in full_lines.zip(shown.iter()).enumerate() {
        if visible.is_empty() {
            continue;
        }
        // Align on the full line so a typewriter reveal does not drift.
        let line_w = ctx.glyphs.measure_line(full, size);
        let x = match p.align {
            TextAlign::Left => pad,
            TextAlign::Center => pad + (inner_w - line_w) / 2.0,
            TextAlign::Right => pass.width - pad - line_w,
        };
        let baseline =
            pad + i as f32 * line_h + (line_h - metrics.height()) / 2.0 + metrics.ascent;
        ctx.glyphs
            .draw_line(ctx.pixmap, visible, x, baseline, size, color, pass.transform);
    }
}
