use proptest::prelude::*;

use scenecast_render_engine::{even_dimensions, unpremultiply_rgba_in_place, Surface};
use scenecast_scene_model::Rgba;

proptest! {
    #[test]
    fn even_dimensions_round_down_by_at_most_one(w in 0u32..10_000, h in 0u32..10_000) {
        let (ew, eh) = even_dimensions(w, h);
        prop_assert_eq!(ew % 2, 0);
        prop_assert_eq!(eh % 2, 0);
        prop_assert!(ew <= w && w - ew <= 1);
        prop_assert!(eh <= h && h - eh <= 1);
    }

    #[test]
    fn opaque_and_transparent_pixels_unpremultiply_exactly(
        rgb in any::<[u8; 3]>(),
        opaque in any::<bool>(),
    ) {
        let alpha = if opaque { 255 } else { 0 };
        let mut px = [rgb[0], rgb[1], rgb[2], alpha];
        unpremultiply_rgba_in_place(&mut px);
        if opaque {
            prop_assert_eq!(px, [rgb[0], rgb[1], rgb[2], 255]);
        } else {
            prop_assert_eq!(px, [0, 0, 0, 0]);
        }
    }

    #[test]
    fn snapshot_has_the_requested_shape(
        w in 1u32..48,
        h in 1u32..48,
        crop_w in 0u32..48,
        crop_h in 0u32..48,
    ) {
        let mut surface = Surface::new(w, h).unwrap();
        surface.clear(Rgba::rgb(1, 2, 3));
        match surface.snapshot(crop_w, crop_h) {
            Ok(frame) => {
                prop_assert!(crop_w <= w && crop_h <= h);
                prop_assert_eq!(frame.data.len(), (crop_w * crop_h * 4) as usize);
            }
            Err(_) => prop_assert!(crop_w > w || crop_h > h),
        }
    }
}
