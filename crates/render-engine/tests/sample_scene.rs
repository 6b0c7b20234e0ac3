use scenecast_render_engine::{render_scene, GlyphRasterizer, Surface};
use scenecast_scene_model::SceneDocument;

fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in bytes {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

#[test]
fn sample_scene_renders_deterministically() {
    let doc = SceneDocument::sample(320, 180);
    let glyphs = GlyphRasterizer::block();

    for t in [0.0, 450.0, 1_333.3, 6_000.0] {
        let mut a = doc.to_scene().unwrap();
        let mut b = doc.to_scene().unwrap();
        let mut sa = Surface::new(320, 180).unwrap();
        let mut sb = Surface::new(320, 180).unwrap();
        render_scene(&mut sa, &glyphs, &mut a, t);
        render_scene(&mut sb, &glyphs, &mut b, t);
        let fa = sa.snapshot(320, 180).unwrap();
        let fb = sb.snapshot(320, 180).unwrap();
        assert_eq!(fnv1a_64(&fa.data), fnv1a_64(&fb.data), "t = {t}");
    }
}

#[test]
fn every_content_sized_object_is_measured_after_a_frame() {
    let doc = SceneDocument::sample(640, 360);
    let mut scene = doc.to_scene().unwrap();
    let mut surface = Surface::new(640, 360).unwrap();
    render_scene(&mut surface, &GlyphRasterizer::block(), &mut scene, 0.0);
    for obj in scene.objects() {
        assert!(!obj.is_size_stale(), "{} still stale", obj.name);
        assert!(obj.width > 0.0 && obj.height > 0.0);
    }
}

#[test]
fn later_frames_differ_from_the_first() {
    let doc = SceneDocument::sample(320, 180);
    let glyphs = GlyphRasterizer::block();
    let mut scene = doc.to_scene().unwrap();
    let mut surface = Surface::new(320, 180).unwrap();

    render_scene(&mut surface, &glyphs, &mut scene, 0.0);
    let first = surface.snapshot_full().unwrap();
    render_scene(&mut surface, &glyphs, &mut scene, 3_000.0);
    let later = surface.snapshot_full().unwrap();
    assert_ne!(first, later);
}
