//! Entrance animations evaluated against scene time.
//!
//! Every animation is a pure function of `(descriptor, time_ms)`. Once the
//! animation window has passed the result is the steady state, however
//! large `time_ms` grows.

use serde::{Deserialize, Serialize};

/// Entrance animation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnimationKind {
    /// Static: always drawn in the final state.
    #[default]
    None,
    /// Opacity ramps linearly from 0 to 1.
    FadeIn,
    /// Fades in while rising 50px into place.
    SlideUp,
    /// Scales from 0 to 1 about the object's center.
    ScaleIn,
    /// Reveals text one character at a time.
    Typewriter,
    /// Chart bars and series grow from zero.
    Grow,
}

/// Animation descriptor attached to a scene object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    #[serde(rename = "type")]
    pub kind: AnimationKind,
    /// Length of the animation window in milliseconds.
    pub duration_ms: f64,
    /// Delay before the window opens, in milliseconds.
    pub delay_ms: f64,
}

impl Default for Animation {
    fn default() -> Self {
        Self {
            kind: AnimationKind::None,
            duration_ms: 1000.0,
            delay_ms: 0.0,
        }
    }
}

/// Pixels an object travels during a slide-up entrance.
pub const SLIDE_DISTANCE_PX: f64 = 50.0;

/// Evaluated animation values at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationFrame {
    /// Multiplier applied to the object's own opacity.
    pub opacity: f64,
    /// Vertical offset in pixels (positive = below final position).
    pub offset_y: f64,
    /// Uniform scale about the object's center.
    pub scale: f64,
    /// Fraction of text revealed, in `[0, 1]`.
    pub reveal: f64,
    /// Fraction of chart extents drawn, in `[0, 1]`.
    pub grow: f64,
}

impl AnimationFrame {
    /// Final steady state.
    pub const STEADY: AnimationFrame = AnimationFrame {
        opacity: 1.0,
        offset_y: 0.0,
        scale: 1.0,
        reveal: 1.0,
        grow: 1.0,
    };
}

/// Cubic ease-out: `1 - (1 - p)^3`.
pub fn ease_out_cubic(progress: f64) -> f64 {
    let p = progress.clamp(0.0, 1.0);
    1.0 - (1.0 - p).powi(3)
}

/// Number of characters visible for a text of `len` characters.
pub fn visible_chars(len: usize, reveal: f64) -> usize {
    ((len as f64) * reveal.clamp(0.0, 1.0)).floor() as usize
}

impl Animation {
    pub fn new(kind: AnimationKind, duration_ms: f64, delay_ms: f64) -> Self {
        Self {
            kind,
            duration_ms,
            delay_ms,
        }
    }

    /// Linear progress at `time_ms`, or `None` before the delay has elapsed.
    pub fn progress(&self, time_ms: f64) -> Option<f64> {
        let t = time_ms - self.delay_ms;
        if t < 0.0 {
            return None;
        }
        if self.duration_ms <= 0.0 {
            return Some(1.0);
        }
        Some((t / self.duration_ms).clamp(0.0, 1.0))
    }

    /// Evaluate the animation at `time_ms`.
    pub fn evaluate(&self, time_ms: f64) -> AnimationFrame {
        if self.kind == AnimationKind::None {
            return AnimationFrame::STEADY;
        }

        let Some(progress) = self.progress(time_ms) else {
            return self.before_start();
        };
        let ease = ease_out_cubic(progress);

        match self.kind {
            AnimationKind::None => AnimationFrame::STEADY,
            AnimationKind::FadeIn => AnimationFrame {
                opacity: progress,
                ..AnimationFrame::STEADY
            },
            AnimationKind::SlideUp => AnimationFrame {
                opacity: progress,
                offset_y: SLIDE_DISTANCE_PX * (1.0 - ease),
                ..AnimationFrame::STEADY
            },
            AnimationKind::ScaleIn => AnimationFrame {
                scale: ease,
                ..AnimationFrame::STEADY
            },
            AnimationKind::Typewriter => AnimationFrame {
                reveal: progress,
                ..AnimationFrame::STEADY
            },
            AnimationKind::Grow => AnimationFrame {
                grow: ease,
                ..AnimationFrame::STEADY
            },
        }
    }

    fn before_start(&self) -> AnimationFrame {
        match self.kind {
            AnimationKind::None => AnimationFrame::STEADY,
            AnimationKind::FadeIn => AnimationFrame {
                opacity: 0.0,
                ..AnimationFrame::STEADY
            },
            AnimationKind::ScaleIn => AnimationFrame {
                opacity: 0.0,
                scale: 0.0,
                ..AnimationFrame::STEADY
            },
            AnimationKind::SlideUp => AnimationFrame {
                opacity: 0.0,
                offset_y: SLIDE_DISTANCE_PX,
                ..AnimationFrame::STEADY
            },
            AnimationKind::Typewriter => AnimationFrame {
                reveal: 0.0,
                ..AnimationFrame::STEADY
            },
            AnimationKind::Grow => AnimationFrame {
                grow: 0.0,
                ..AnimationFrame::STEADY
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fade() -> Animation {
        Animation::new(AnimationKind::FadeIn, 1000.0, 0.0)
    }

    #[test]
    fn test_fade_in_clamps() {
        let anim = fade();
        assert_eq!(anim.evaluate(0.0).opacity, 0.0);
        assert!((anim.evaluate(500.0).opacity - 0.5).abs() < 1e-9);
        assert_eq!(anim.evaluate(1000.0).opacity, 1.0);
        assert_eq!(anim.evaluate(5000.0).opacity, 1.0);
    }

    #[test]
    fn test_delay_hides_until_window_opens() {
        let anim = Animation::new(AnimationKind::SlideUp, 400.0, 250.0);
        let before = anim.evaluate(100.0);
        assert_eq!(before.opacity, 0.0);
        assert_eq!(before.offset_y, SLIDE_DISTANCE_PX);
        let at_start = anim.evaluate(250.0);
        assert_eq!(at_start.opacity, 0.0);
        assert!((at_start.offset_y - SLIDE_DISTANCE_PX).abs() < 1e-9);
    }

    #[test]
    fn test_slide_up_offset_decays_to_zero() {
        let anim = Animation::new(AnimationKind::SlideUp, 1000.0, 0.0);
        let mid = anim.evaluate(500.0);
        // ease(0.5) = 0.875
        assert!((mid.offset_y - 50.0 * 0.125).abs() < 1e-9);
        assert_eq!(anim.evaluate(1e12).offset_y, 0.0);
    }

    #[test]
    fn test_scale_in_uses_ease() {
        let anim = Animation::new(AnimationKind::ScaleIn, 1000.0, 0.0);
        assert_eq!(anim.evaluate(0.0).scale, 0.0);
        assert!((anim.evaluate(500.0).scale - 0.875).abs() < 1e-9);
        assert_eq!(anim.evaluate(1000.0).scale, 1.0);
        assert_eq!(anim.evaluate(1000.0).opacity, 1.0);
    }

    #[test]
    fn test_typewriter_reveal_counts() {
        let anim = Animation::new(AnimationKind::Typewriter, 1000.0, 0.0);
        assert_eq!(visible_chars(10, anim.evaluate(-1.0).reveal), 0);
        assert_eq!(visible_chars(10, anim.evaluate(0.0).reveal), 0);
        assert_eq!(visible_chars(10, anim.evaluate(349.0).reveal), 3);
        assert_eq!(visible_chars(10, anim.evaluate(1000.0).reveal), 10);
        assert_eq!(visible_chars(10, anim.evaluate(99_999.0).reveal), 10);
    }

    #[test]
    fn test_zero_duration_is_immediately_complete() {
        let anim = Animation::new(AnimationKind::FadeIn, 0.0, 100.0);
        assert_eq!(anim.evaluate(50.0).opacity, 0.0);
        assert_eq!(anim.evaluate(100.0).opacity, 1.0);
    }

    #[test]
    fn test_none_is_static_even_before_delay() {
        let anim = Animation::new(AnimationKind::None, 1000.0, 500.0);
        assert_eq!(anim.evaluate(0.0), AnimationFrame::STEADY);
    }

    #[test]
    fn test_descriptor_serde_uses_type_tag() {
        let anim = Animation::new(AnimationKind::SlideUp, 800.0, 100.0);
        let json = serde_json::to_value(anim).unwrap();
        assert_eq!(json["type"], "slideUp");
        assert_eq!(json["duration_ms"], 800.0);
    }
}
