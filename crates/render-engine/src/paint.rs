//! Small tiny-skia helpers shared by the kind painters.

use tiny_skia::{Color, Paint, Path, PathBuilder, Rect};

use scenecast_scene_model::Rgba;

pub fn to_skia(color: Rgba) -> Color {
    Color::from_rgba8(color.r, color.g, color.b, color.a)
}

/// Anti-aliased solid paint.
pub fn solid(color: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(to_skia(color));
    paint.anti_alias = true;
    paint
}

/// Rounded rectangle path. `radius` is clamped to half the shorter side.
pub fn rounded_rect(x: f32, y: f32, w: f32, h: f32, radius: f32) -> Option<Path> {
    let r = radius.max(0.0).min(w / 2.0).min(h / 2.0);
    if r <= 0.0 {
        return Some(PathBuilder::from_rect(Rect::from_xywh(x, y, w, h)?));
    }
    // Quarter-circle control point factor for cubic approximation.
    let k = 0.552_284_8 * r;
    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(x + w - r, y);
    pb.cubic_to(x + w - r + k, y, x + w, y + r - k, x + w, y + r);
    pb.line_to(x + w, y + h - r);
    pb.cubic_to(x + w, y + h - r + k, x + w - r + k, y + h, x + w - r, y + h);
    pb.line_to(x + r, y + h);
    pb.cubic_to(x + r - k, y + h, x, y + h - r + k, x, y + h - r);
    pb.line_to(x, y + r);
    pb.cubic_to(x, y + r - k, x + r - k, y, x + r, y);
    pb.close();
    pb.finish()
}

/// Deterministic pleasant color for a label.
pub fn label_color(label: &str) -> Rgba {
    const PALETTE: [Rgba; 8] = [
        Rgba::rgb(59, 130, 246),
        Rgba::rgb(16, 185, 129),
        Rgba::rgb(245, 158, 11),
        Rgba::rgb(239, 68, 68),
        Rgba::rgb(139, 92, 246),
        Rgba::rgb(236, 72, 153),
        Rgba::rgb(20, 184, 166),
        Rgba::rgb(132, 204, 22),
    ];
    PALETTE[(fnv1a_64(label.as_bytes()) % PALETTE.len() as u64) as usize]
}

pub fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in bytes {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounded_rect_degenerates_to_rect() {
        let path = rounded_rect(0.0, 0.0, 10.0, 10.0, 0.0).unwrap();
        let b = path.bounds();
        assert_eq!((b.width(), b.height()), (10.0, 10.0));
        assert!(rounded_rect(0.0, 0.0, 10.0, 10.0, 50.0).is_some());
    }

    #[test]
    fn test_label_color_is_stable() {
        assert_eq!(label_color("rust"), label_color("rust"));
    }
}
