//! Particle text: particles fly in from seeded scatter positions and settle
//! onto the glyph shapes.

use tiny_skia::Rect;

use scenecast_scene_model::{ease_out_cubic, ParticleTextProps, Point2D};

use super::{DrawContext, Pass};
use crate::glyphs::GlyphRasterizer;
use crate::paint::{fnv1a_64, solid};

/// Upper bound on particles per object.
const MAX_PARTICLES: usize = 6_000;

pub(super) fn measure(glyphs: &GlyphRasterizer, p: &ParticleTextProps) -> (f64, f64) {
    let size = p.font_size as f32;
    let w = glyphs.measure_line(&p.text, size);
    let h = glyphs.line_metrics(size).height();
    (w as f64, h as f64)
}

/// Settled particle positions in local box space.
fn targets(glyphs: &GlyphRasterizer, p: &ParticleTextProps) -> Vec<Point2D> {
    let Some(mask) = glyphs.line_mask(&p.text, p.font_size as f32) else {
        return Vec::new();
    };
    let step = (p.particle_size * 1.5).max(2.0) as u32;
    let mut points = Vec::new();
    for y in (0..mask.height()).step_by(step as usize) {
        for x in (0..mask.width()).step_by(step as usize) {
            if mask.pixel(x, y).is_some_and(|px| px.alpha() >= 128) {
                points.push(Point2D::new(x as f64, y as f64));
                if points.len() == MAX_PARTICLES {
                    return points;
                }
            }
        }
    }
    points
}

/// Seeded scatter position for particle `index` around a `w x h` box.
fn scatter(seed: u64, index: usize, w: f64, h: f64) -> Point2D {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&seed.to_le_bytes());
    key[8..].copy_from_slice(&(index as u64).to_le_bytes());
    let hash = fnv1a_64(&key);
    let fx = (hash & 0xffff) as f64 / 65535.0;
    let fy = ((hash >> 16) & 0xffff) as f64 / 65535.0;
    Point2D::new(-w * 0.5 + fx * w * 2.0, -h * 1.5 + fy * h * 4.0)
}

/// Assembly progress at `time_ms`, measured from the animation delay.
fn assembly(p: &ParticleTextProps, time_ms: f64, delay_ms: f64) -> f64 {
    if p.assemble_ms <= 0.0 {
        return 1.0;
    }
    ease_out_cubic((time_ms - delay_ms) / p.assemble_ms)
}

pub(super) fn paint(ctx: &mut DrawContext<'_>, p: &ParticleTextProps, pass: &Pass, delay_ms: f64) {
    let e = assembly(p, pass.time_ms, delay_ms);
    let w = pass.width as f64;
    let h = pass.height as f64;
    let size = p.particle_size.max(0.5) as f32;
    let paint = solid(pass.color(p.color));

    for (i, target) in targets(ctx.glyphs, p).iter().enumerate() {
        let start = scatter(p.seed, i, w, h);
        let pos = Point2D::lerp(&start, target, e);
        if let Some(rect) = Rect::from_xywh(pos.x as f32, pos.y as f32, size, size) {
            ctx.pixmap.fill_rect(rect, &paint, pass.transform, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenecast_scene_model::Rgba;

    fn props() -> ParticleTextProps {
        ParticleTextProps {
            text: "HI".to_string(),
            font_size: 40.0,
            color: Rgba::WHITE,
            particle_size: 2.0,
            seed: 42,
            assemble_ms: 1000.0,
        }
    }

    #[test]
    fn test_targets_lie_inside_measured_box() {
        let glyphs = GlyphRasterizer::block();
        let p = props();
        let (w, h) = measure(&glyphs, &p);
        let pts = targets(&glyphs, &p);
        assert!(!pts.is_empty());
        assert!(pts.iter().all(|pt| pt.x <= w && pt.y <= h));
    }

    #[test]
    fn test_scatter_is_seeded() {
        assert_eq!(scatter(1, 5, 100.0, 50.0), scatter(1, 5, 100.0, 50.0));
        assert_ne!(scatter(1, 5, 100.0, 50.0), scatter(2, 5, 100.0, 50.0));
    }

    #[test]
    fn test_assembly_clamps() {
        let p = props();
        assert_eq!(assembly(&p, 0.0, 500.0), 0.0);
        assert_eq!(assembly(&p, 1500.0, 500.0), 1.0);
        assert_eq!(assembly(&p, 1e9, 0.0), 1.0);
    }
}
