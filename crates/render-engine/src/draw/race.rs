//! Bar-chart race: ranked horizontal bars interpolated between keyframes.

use tiny_skia::Rect;

use scenecast_scene_model::BarRaceProps;

use super::{DrawContext, Pass};
use crate::paint::{label_color, solid};

pub(super) fn paint(ctx: &mut DrawContext<'_>, p: &BarRaceProps, pass: &Pass) {
    let pad = p.padding as f32;
    let size = p.font_size as f32;
    let gap = p.bar_gap as f32;
    let metrics = ctx.glyphs.line_metrics(size);
    let text_color = pass.color(p.label_color);

    let mut top = pad;
    if !p.title.is_empty() {
        ctx.glyphs.draw_line(
            ctx.pixmap,
            &p.title,
            pad,
            top + metrics.ascent,
            size * 1.2,
            text_color,
            pass.transform,
        );
        top += size * 1.6;
    }

    let slots = p.visible_bars.max(1);
    let mut ranking = p.ranking_at(pass.time_ms);
    ranking.truncate(slots);
    let Some(leader) = ranking.first().map(|(_, v)| *v) else {
        return;
    };
    let max = leader.max(f64::EPSILON) as f32;

    let avail_h = pass.height - top - pad;
    let bar_h = ((avail_h - gap * (slots as f32 - 1.0)) / slots as f32).max(1.0);
    let label_w = ranking
        .iter()
        .map(|(label, _)| ctx.glyphs.measure_line(label, size))
        .fold(0.0f32, f32::max)
        + gap;
    let value_w = ctx.glyphs.measure_line(&format!("{max:.0}"), size) + gap;
    let track_w = (pass.width - pad * 2.0 - label_w - value_w).max(0.0);
    let grow = pass.anim.grow as f32;

    for (rank, (label, value)) in ranking.iter().enumerate() {
        let y = top + rank as f32 * (bar_h + gap);
        let baseline = y + (bar_h - metrics.height()) / 2.0 + metrics.ascent;
        ctx.glyphs.draw_line(
            ctx.pixmap,
            label,
            pad + label_w - gap - ctx.glyphs.measure_line(label, size),
            baseline,
            size,
            text_color,
            pass.transform,
        );

        let len = (value.max(0.0) as f32 / max) * track_w * grow;
        let color = p
            .colors
            .get(label)
            .copied()
            .unwrap_or_else(|| label_color(label));
        if let Some(rect) = Rect::from_xywh(pad + label_w, y, len, bar_h) {
            ctx.pixmap
                .fill_rect(rect, &solid(pass.color(color)), pass.transform, None);
        }

        ctx.glyphs.draw_line(
            ctx.pixmap,
            &format!("{value:.0}"),
            pad + label_w + len + gap,
            baseline,
            size,
            text_color,
            pass.transform,
        );
    }
}
