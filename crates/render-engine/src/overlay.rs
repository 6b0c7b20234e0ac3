//! Editor overlays drawn on top of a rendered scene. Never exported.

use tiny_skia::{PathBuilder, Rect, Stroke, StrokeDash, Transform};

use scenecast_scene_model::{Bounds, GuideOverlay, Rgba};

use crate::paint::solid;
use crate::surface::Surface;

const SELECTION_COLOR: Rgba = Rgba::rgb(59, 130, 246);
const GUIDE_COLOR: Rgba = Rgba::rgba(255, 255, 255, 72);
const SELECTION_MARGIN: f64 = 4.0;
const HANDLE_SIZE: f32 = 8.0;

/// Dashed outline with corner handles around an object's bounding box.
pub fn draw_selection_outline(surface: &mut Surface, bounds: Bounds) {
    let b = bounds.inflate(SELECTION_MARGIN);
    let Some(rect) = Rect::from_xywh(b.x as f32, b.y as f32, b.width as f32, b.height as f32)
    else {
        return;
    };
    let path = PathBuilder::from_rect(rect);
    let stroke = Stroke {
        width: 2.0,
        dash: StrokeDash::new(vec![6.0, 4.0], 0.0),
        ..Stroke::default()
    };
    let pixmap = surface.pixmap_mut();
    pixmap.stroke_path(
        &path,
        &solid(SELECTION_COLOR),
        &stroke,
        Transform::identity(),
        None,
    );

    let half = HANDLE_SIZE / 2.0;
    for (cx, cy) in [
        (rect.left(), rect.top()),
        (rect.right(), rect.top()),
        (rect.left(), rect.bottom()),
        (rect.right(), rect.bottom()),
    ] {
        if let Some(handle) = Rect::from_xywh(cx - half, cy - half, HANDLE_SIZE, HANDLE_SIZE) {
            pixmap.fill_rect(handle, &solid(Rgba::WHITE), Transform::identity(), None);
            let border = Stroke {
                width: 1.5,
                ..Stroke::default()
            };
            pixmap.stroke_path(
                &PathBuilder::from_rect(handle),
                &solid(SELECTION_COLOR),
                &border,
                Transform::identity(),
                None,
            );
        }
    }
}

/// Advisory layout guides across the whole canvas.
pub fn draw_guides(surface: &mut Surface, guides: GuideOverlay) {
    let w = surface.width() as f32;
    let h = surface.height() as f32;
    let lines: Vec<(f32, f32, f32, f32)> = match guides {
        GuideOverlay::None => return,
        GuideOverlay::Thirds => vec![
            (w / 3.0, 0.0, w / 3.0, h),
            (w * 2.0 / 3.0, 0.0, w * 2.0 / 3.0, h),
            (0.0, h / 3.0, w, h / 3.0),
            (0.0, h * 2.0 / 3.0, w, h * 2.0 / 3.0),
        ],
        GuideOverlay::Center => vec![(w / 2.0, 0.0, w / 2.0, h), (0.0, h / 2.0, w, h / 2.0)],
        GuideOverlay::Safe => {
            let (x0, y0, x1, y1) = (w * 0.05, h * 0.05, w * 0.95, h * 0.95);
            vec![(x0, y0, x1, y0), (x1, y0, x1, y1), (x1, y1, x0, y1), (x0, y1, x0, y0)]
        }
    };

    let mut pb = PathBuilder::new();
    for (x0, y0, x1, y1) in lines {
        pb.move_to(x0, y0);
        pb.line_to(x1, y1);
    }
    if let Some(path) = pb.finish() {
        let stroke = Stroke {
            width: 1.0,
            ..Stroke::default()
        };
        surface.pixmap_mut().stroke_path(
            &path,
            &solid(GUIDE_COLOR),
            &stroke,
            Transform::identity(),
            None,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outline_touches_inflated_edge_only() {
        let mut surface = Surface::new(100, 100).unwrap();
        surface.clear(Rgba::BLACK);
        draw_selection_outline(&mut surface, Bounds::new(20.0, 20.0, 40.0, 40.0));
        let frame = surface.snapshot_full().unwrap();
        assert_eq!(frame.pixel(40, 40), Some([0, 0, 0, 255]));
        // Corner handle at (16, 16).
        assert_ne!(frame.pixel(16, 16), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_no_guides_leaves_surface_untouched() {
        let mut surface = Surface::new(30, 30).unwrap();
        surface.clear(Rgba::BLACK);
        let before = surface.snapshot_full().unwrap();
        draw_guides(&mut surface, GuideOverlay::None);
        assert_eq!(surface.snapshot_full().unwrap(), before);
        draw_guides(&mut surface, GuideOverlay::Thirds);
        assert_ne!(surface.snapshot_full().unwrap(), before);
    }
}
