use proptest::prelude::*;

use scenecast_scene_model::{Animation, AnimationFrame, AnimationKind, ObjectKind, LogoProps, Rgba, SceneObject};

fn any_kind() -> impl Strategy<Value = AnimationKind> {
    prop_oneof![
        Just(AnimationKind::None),
        Just(AnimationKind::FadeIn),
        Just(AnimationKind::SlideUp),
        Just(AnimationKind::ScaleIn),
        Just(AnimationKind::Typewriter),
        Just(AnimationKind::Grow),
    ]
}

proptest! {
    #[test]
    fn past_window_is_steady(
        kind in any_kind(),
        duration in 0.0f64..10_000.0,
        delay in 0.0f64..5_000.0,
        extra in 0.0f64..1e12,
    ) {
        let anim = Animation::new(kind, duration, delay);
        let frame = anim.evaluate(delay + duration + extra);
        prop_assert_eq!(frame, AnimationFrame::STEADY);
    }

    #[test]
    fn frame_values_stay_in_range(
        kind in any_kind(),
        duration in 1.0f64..10_000.0,
        delay in 0.0f64..5_000.0,
        t in -1_000.0f64..20_000.0,
    ) {
        let f = Animation::new(kind, duration, delay).evaluate(t);
        prop_assert!((0.0..=1.0).contains(&f.opacity));
        prop_assert!((0.0..=1.0).contains(&f.scale));
        prop_assert!((0.0..=1.0).contains(&f.reveal));
        prop_assert!((0.0..=1.0).contains(&f.grow));
        prop_assert!((0.0..=50.0).contains(&f.offset_y));
    }

    #[test]
    fn fade_in_is_monotonic(t1 in 0.0f64..2_000.0, t2 in 0.0f64..2_000.0) {
        let anim = Animation::new(AnimationKind::FadeIn, 1000.0, 0.0);
        let (lo, hi) = if t1 <= t2 { (t1, t2) } else { (t2, t1) };
        prop_assert!(anim.evaluate(lo).opacity <= anim.evaluate(hi).opacity);
    }

    #[test]
    fn halving_then_doubling_restores_geometry(
        x in 0.0f64..1920.0,
        y in 0.0f64..1080.0,
        w in 1.0f64..800.0,
        h in 1.0f64..800.0,
        font in 8.0f64..200.0,
    ) {
        let mut obj = SceneObject::new(ObjectKind::Logo(LogoProps {
            label: "A".to_string(),
            background: Rgba::BLACK,
            foreground: Rgba::WHITE,
            corner_radius: 10.0,
            font_size: font,
        }))
        .with_position(x, y)
        .with_size(w, h);

        obj.rescale(0.5, 0.5, 0.5);
        obj.rescale(2.0, 2.0, 2.0);

        prop_assert!((obj.x - x).abs() < 1e-9);
        prop_assert!((obj.y - y).abs() < 1e-9);
        prop_assert!((obj.width - w).abs() < 1e-9);
        prop_assert!((obj.height - h).abs() < 1e-9);
        prop_assert_eq!(obj.kind().font_size(), Some(font));
    }
}

#[test]
fn fade_in_clamp_points() {
    let anim = Animation::new(AnimationKind::FadeIn, 1000.0, 0.0);
    assert_eq!(anim.evaluate(0.0).opacity, 0.0);
    assert!((anim.evaluate(500.0).opacity - 0.5).abs() < 1e-9);
    assert_eq!(anim.evaluate(1000.0).opacity, 1.0);
    assert_eq!(anim.evaluate(5000.0).opacity, 1.0);
}
