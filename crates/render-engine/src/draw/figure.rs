//! Characters and logos: simple vector figures filling their box.

use std::f64::consts::TAU;

use tiny_skia::{FillRule, PathBuilder, Rect};

use scenecast_scene_model::{CharacterProps, LogoProps, Rgba};

use super::{DrawContext, Pass};
use crate::paint::{rounded_rect, solid};

/// Idle bob offset at `time_ms`.
fn bob(p: &CharacterProps, time_ms: f64) -> f32 {
    if p.bob_period_ms <= 0.0 {
        return 0.0;
    }
    (p.bob_amplitude * (TAU * time_ms / p.bob_period_ms).sin()) as f32
}

pub(super) fn paint_character(ctx: &mut DrawContext<'_>, p: &CharacterProps, pass: &Pass) {
    let w = pass.width;
    let h = pass.height;
    let dy = bob(p, pass.time_ms);
    let skin = solid(pass.color(p.skin_color));
    let body = solid(pass.color(p.body_color));

    // Legs stay planted; everything above them bobs.
    for lx in [0.3, 0.56] {
        if let Some(leg) = Rect::from_xywh(w * lx, h * 0.68, w * 0.14, h * 0.3) {
            ctx.pixmap.fill_rect(leg, &body, pass.transform, None);
        }
    }
    for ax in [0.1, 0.77] {
        if let Some(arm) = rounded_rect(w * ax, h * 0.32 + dy, w * 0.13, h * 0.3, w * 0.06) {
            ctx.pixmap
                .fill_path(&arm, &skin, FillRule::Winding, pass.transform, None);
        }
    }
    if let Some(torso) = rounded_rect(w * 0.25, h * 0.3 + dy, w * 0.5, h * 0.4, w * 0.1) {
        ctx.pixmap
            .fill_path(&torso, &body, FillRule::Winding, pass.transform, None);
    }

    let head_r = (w * 0.3).min(h * 0.13);
    let head_y = h * 0.15 + dy;
    if let Some(head) = PathBuilder::from_circle(w / 2.0, head_y, head_r) {
        ctx.pixmap
            .fill_path(&head, &skin, FillRule::Winding, pass.transform, None);
    }
    let eye = solid(pass.color(Rgba::rgb(31, 41, 55)));
    for ex in [-0.35, 0.35] {
        if let Some(e) = PathBuilder::from_circle(w / 2.0 + head_r * ex, head_y - head_r * 0.1, head_r * 0.12) {
            ctx.pixmap
                .fill_path(&e, &eye, FillRule::Winding, pass.transform, None);
        }
    }
}

pub(super) fn paint_logo(ctx: &mut DrawContext<'_>, p: &LogoProps, pass: &Pass) {
    if let Some(badge) = rounded_rect(0.0, 0.0, pass.width, pass.height, p.corner_radius as f32) {
        ctx.pixmap.fill_path(
            &badge,
            &solid(pass.color(p.background)),
            FillRule::Winding,
            pass.transform,
            None,
        );
    }

    let size = p.font_size as f32;
    let metrics = ctx.glyphs.line_metrics(size);
    let label_w = ctx.glyphs.measure_line(&p.label, size);
    let x = (pass.width - label_w) / 2.0;
    let baseline = (pass.height - metrics.height()) / 2.0 + metrics.ascent;
    ctx.glyphs.draw_line(
        ctx.pixmap,
        &p.label,
        x,
        baseline,
        size,
        pass.color(p.foreground),
        pass.transform,
    );
}
