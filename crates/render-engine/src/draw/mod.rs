//! Per-kind drawing of scene objects and whole scenes.
//!
//! Every painter works in the object's local box space, `(0, 0)` to
//! `(width, height)`. The object transform maps that box onto the canvas,
//! applying the entrance animation's offset and scale plus the object's
//! rotation about its center.

mod chart;
mod code;
mod figure;
mod particles;
mod race;
mod text;

use tiny_skia::{Pixmap, Transform};

use scenecast_scene_model::{
    visible_chars, AnimationFrame, ObjectKind, Rgba, Scene, SceneObject,
};

use crate::glyphs::GlyphRasterizer;
use crate::paint::to_skia;
use crate::surface::Surface;

/// Target and glyph source for one render pass.
pub struct DrawContext<'a> {
    pub pixmap: &'a mut Pixmap,
    pub glyphs: &'a GlyphRasterizer,
}

impl<'a> DrawContext<'a> {
    pub fn new(surface: &'a mut Surface, glyphs: &'a GlyphRasterizer) -> Self {
        Self {
            pixmap: surface.pixmap_mut(),
            glyphs,
        }
    }
}

/// Something that renders itself at a point in scene time.
///
/// Drawing never suspends and reads nothing but the receiver's fields and
/// `time_ms`. The only state it may write is a content-derived size.
pub trait Drawable {
    fn draw(&mut self, ctx: &mut DrawContext<'_>, time_ms: f64);
}

/// Evaluated per-object inputs shared by the kind painters.
pub(crate) struct Pass {
    /// Local box space to canvas.
    pub transform: Transform,
    /// Combined object and animation opacity.
    pub opacity: f64,
    pub anim: AnimationFrame,
    pub time_ms: f64,
    pub width: f32,
    pub height: f32,
}

impl Pass {
    pub fn color(&self, color: Rgba) -> Rgba {
        color.with_opacity(self.opacity)
    }
}

impl Drawable for SceneObject {
    fn draw(&mut self, ctx: &mut DrawContext<'_>, time_ms: f64) {
        if !self.visible {
            return;
        }

        if let Some((w, h)) = measure(ctx.glyphs, self.kind()) {
            self.set_measured_size(w, h);
        }

        let anim = self.animation.evaluate(time_ms);
        let opacity = (self.opacity * anim.opacity).clamp(0.0, 1.0);
        if opacity <= 0.0 || anim.scale <= 0.0 {
            return;
        }

        let pass = Pass {
            transform: object_transform(self, &anim),
            opacity,
            anim,
            time_ms,
            width: self.width as f32,
            height: self.height as f32,
        };

        match self.kind() {
            ObjectKind::Text(p) => text::paint(ctx, p, &pass),
            ObjectKind::CodeBlock(p) => code::paint(ctx, p, &pass),
            ObjectKind::Chart(p) => chart::paint(ctx, p, &pass),
            ObjectKind::BarChartRace(p) => race::paint(ctx, p, &pass),
            ObjectKind::ParticleText(p) => {
                particles::paint(ctx, p, &pass, self.animation.delay_ms)
            }
            ObjectKind::Character(p) => figure::paint_character(ctx, p, &pass),
            ObjectKind::Logo(p) => figure::paint_logo(ctx, p, &pass),
        }
    }
}

impl Drawable for Scene {
    fn draw(&mut self, ctx: &mut DrawContext<'_>, time_ms: f64) {
        ctx.pixmap.fill(to_skia(self.background));
        for obj in self.objects_mut() {
            obj.draw(ctx, time_ms);
        }
    }
}

/// Render `scene` at `time_ms` into `surface`.
pub fn render_scene(
    surface: &mut Surface,
    glyphs: &GlyphRasterizer,
    scene: &mut Scene,
    time_ms: f64,
) {
    let mut ctx = DrawContext::new(surface, glyphs);
    scene.draw(&mut ctx, time_ms);
}

/// Content-derived size for kinds that have one.
pub fn measure(glyphs: &GlyphRasterizer, kind: &ObjectKind) -> Option<(f64, f64)> {
    match kind {
        ObjectKind::Text(p) => Some(text::measure(glyphs, p)),
        ObjectKind::CodeBlock(p) => Some(code::measure(glyphs, p)),
        ObjectKind::ParticleText(p) => Some(particles::measure(glyphs, p)),
        _ => None,
    }
}

fn object_transform(obj: &SceneObject, anim: &AnimationFrame) -> Transform {
    let w = obj.width as f32;
    let h = obj.height as f32;
    let cx = (obj.x + obj.width / 2.0) as f32;
    let cy = (obj.y + anim.offset_y + obj.height / 2.0) as f32;
    let s = anim.scale as f32;
    Transform::from_translate(cx, cy)
        .pre_concat(Transform::from_rotate(obj.rotation as f32))
        .pre_scale(s, s)
        .pre_translate(-w / 2.0, -h / 2.0)
}

/// Split `text` into lines, keeping only the first `reveal` fraction of
/// its characters. Newlines do not count as characters.
pub(crate) fn revealed_lines(text: &str, reveal: f64) -> Vec<String> {
    let total = text.chars().filter(|c| *c != '\n').count();
    let mut remaining = visible_chars(total, reveal);
    text.split('\n')
        .map(|line| {
            let shown: String = line.chars().take(remaining).collect();
            remaining -= shown.chars().count();
            shown
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenecast_scene_model::{
        Animation, AnimationKind, LogoProps, TextAlign, TextProps,
    };

    fn logo() -> SceneObject {
        SceneObject::new(ObjectKind::Logo(LogoProps {
            label: "L".to_string(),
            background: Rgba::rgb(255, 0, 0),
            foreground: Rgba::WHITE,
            corner_radius: 0.0,
            font_size: 20.0,
        }))
        .with_position(10.0, 10.0)
        .with_size(40.0, 40.0)
    }

    fn text(content: &str) -> SceneObject {
        SceneObject::new(ObjectKind::Text(TextProps {
            text: content.to_string(),
            font_size: 20.0,
            color: Rgba::WHITE,
            background: None,
            padding: 5.0,
            line_height: 1.5,
            align: TextAlign::Left,
        }))
    }

    fn scene_with(obj: SceneObject) -> Scene {
        let mut scene = Scene::new(100, 100);
        scene.background = Rgba::BLACK;
        scene.add(obj).unwrap();
        scene
    }

    fn render(scene: &mut Scene, t: f64) -> Surface {
        let mut surface = Surface::new(scene.width, scene.height).unwrap();
        render_scene(&mut surface, &GlyphRasterizer::block(), scene, t);
        surface
    }

    #[test]
    fn test_revealed_lines_skip_newlines() {
        assert_eq!(revealed_lines("ab\ncd", 0.5), vec!["ab", ""]);
        assert_eq!(revealed_lines("ab\ncd", 0.75), vec!["ab", "c"]);
        assert_eq!(revealed_lines("ab\ncd", 1.0), vec!["ab", "cd"]);
    }

    #[test]
    fn test_object_is_drawn_at_its_position() {
        let mut scene = scene_with(logo());
        let frame = render(&mut scene, 0.0).snapshot_full().unwrap();
        assert_eq!(frame.pixel(30, 45), Some([255, 0, 0, 255]));
        assert_eq!(frame.pixel(5, 5), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_hidden_object_has_no_side_effects() {
        let mut obj = text("hello");
        obj.visible = false;
        let id = obj.id;
        let mut scene = scene_with(obj);
        render(&mut scene, 0.0);
        assert!(scene.get(id).unwrap().is_size_stale());
    }

    #[test]
    fn test_text_measures_on_draw() {
        let obj = text("abcd\nxy");
        let id = obj.id;
        let mut scene = scene_with(obj);
        render(&mut scene, 0.0);
        let obj = scene.get(id).unwrap();
        assert!(!obj.is_size_stale());
        // 4 block glyphs * 12px + 2 * 5px padding; 2 lines * 30px + 10px.
        assert!((obj.width - 58.0).abs() < 1e-3);
        assert!((obj.height - 70.0).abs() < 1e-3);
    }

    #[test]
    fn test_fade_in_before_delay_draws_nothing() {
        let obj = logo().with_animation(Animation::new(AnimationKind::FadeIn, 500.0, 1000.0));
        let mut scene = scene_with(obj);
        let frame = render(&mut scene, 200.0).snapshot_full().unwrap();
        assert_eq!(frame.pixel(15, 45), Some([0, 0, 0, 255]));
        let frame = render(&mut scene, 2000.0).snapshot_full().unwrap();
        assert_eq!(frame.pixel(15, 45), Some([255, 0, 0, 255]));
    }

    #[test]
    fn test_same_time_renders_identically() {
        let mut scene = scene_with(logo().with_animation(Animation::new(
            AnimationKind::SlideUp,
            1000.0,
            0.0,
        )));
        let a = render(&mut scene, 420.0).snapshot_full().unwrap();
        let b = render(&mut scene, 420.0).snapshot_full().unwrap();
        assert_eq!(a, b);
    }
}
