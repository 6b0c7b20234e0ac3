//! Bar and line charts. The grow animation scales values from zero.

use tiny_skia::{FillRule, PathBuilder, Rect, Stroke};

use scenecast_scene_model::{ChartProps, ChartType};

use super::{DrawContext, Pass};
use crate::paint::solid;

pub(super) fn paint(ctx: &mut DrawContext<'_>, p: &ChartProps, pass: &Pass) {
    let pad = p.padding as f32;
    let size = p.font_size as f32;
    let label_band = if p.show_labels { size * 1.6 } else { 0.0 };
    let plot_x = pad;
    let plot_y = pad;
    let plot_w = pass.width - pad * 2.0;
    let plot_h = pass.height - pad * 2.0 - label_band;
    if plot_w <= 0.0 || plot_h <= 0.0 {
        return;
    }

    let axis_y = plot_y + plot_h;
    let axis_w = (size / 10.0).max(1.0);
    if let Some(rect) = Rect::from_xywh(plot_x, axis_y, plot_w, axis_w) {
        ctx.pixmap
            .fill_rect(rect, &solid(pass.color(p.axis_color)), pass.transform, None);
    }

    if p.series.is_empty() {
        return;
    }
    let max = p
        .series
        .iter()
        .map(|d| d.value)
        .fold(f64::EPSILON, f64::max) as f32;
    let grow = pass.anim.grow as f32;
    let n = p.series.len();
    let value_h = |v: f64| (v.max(0.0) as f32 / max) * plot_h * grow;

    match p.chart_type {
        ChartType::Bar => {
            let gap = p.bar_gap as f32;
            let bar_w = ((plot_w - gap * (n as f32 - 1.0)) / n as f32).max(1.0);
            for (i, point) in p.series.iter().enumerate() {
                let h = value_h(point.value);
                let x = plot_x + i as f32 * (bar_w + gap);
                let color = point.color.unwrap_or(p.color);
                if let Some(rect) = Rect::from_xywh(x, axis_y - h, bar_w, h) {
                    ctx.pixmap
                        .fill_rect(rect, &solid(pass.color(color)), pass.transform, None);
                }
                if p.show_labels {
                    draw_label(ctx, pass, p, &point.label, x + bar_w / 2.0, axis_y);
                }
            }
        }
        ChartType::Line => {
            let step = if n > 1 { plot_w / (n as f32 - 1.0) } else { 0.0 };
            let points: Vec<(f32, f32)> = p
                .series
                .iter()
                .enumerate()
                .map(|(i, d)| (plot_x + i as f32 * step, axis_y - value_h(d.value)))
                .collect();

            let mut pb = PathBuilder::new();
            for (i, (x, y)) in points.iter().enumerate() {
                if i == 0 {
                    pb.move_to(*x, *y);
                } else {
                    pb.line_to(*x, *y);
                }
            }
            let line_color = pass.color(p.color);
            if let Some(path) = pb.finish() {
                let stroke = Stroke {
                    width: (size / 6.0).max(2.0),
                    ..Stroke::default()
                };
                ctx.pixmap
                    .stroke_path(&path, &solid(line_color), &stroke, pass.transform, None);
            }

            let dot_r = (size / 5.0).max(2.5);
            for ((x, y), point) in points.iter().zip(&p.series) {
                let color = pass.color(point.color.unwrap_or(p.color));
                if let Some(dot) = PathBuilder::from_circle(*x, *y, dot_r) {
                    ctx.pixmap
                        .fill_path(&dot, &solid(color), FillRule::Winding, pass.transform, None);
                }
                if p.show_labels {
                    draw_label(ctx, pass, p, &point.label, *x, axis_y);
                }
            }
        }
    }
}

fn draw_label(
    ctx: &mut DrawContext<'_>,
    pass: &Pass,
    p: &ChartProps,
    label: &str,
    center_x: f32,
    axis_y: f32,
) {
    let size = p.font_size as f32;
    let metrics = ctx.glyphs.line_metrics(size);
    let w = ctx.glyphs.measure_line(label, size);
    ctx.glyphs.draw_line(
        ctx.pixmap,
        label,
        center_x - w / 2.0,
        axis_y + size * 0.3 + metrics.ascent,
        size,
        pass.color(p.axis_color),
        pass.transform,
    );
}
