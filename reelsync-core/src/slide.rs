//! Carousel strip slide animation.

use crate::config::{AnimationConfig, Easing};
use serde::Serialize;
use std::time::Duration;

/// Horizontal offset of the strip for `index`, in percent of one slide width
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn offset_percent(index: usize) -> f32 {
    // Sequences are a handful of slides long; precision loss is not a concern.
    -100.0 * index as f32
}

/// One slide transition from the previous offset to a target index
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SlideAnimation {
    pub index: usize,
    pub from_percent: f32,
    pub to_percent: f32,
    #[serde(serialize_with = "serialize_millis")]
    pub duration: Duration,
    pub easing: Easing,
}

impl SlideAnimation {
    /// Animation from `from_percent` to the offset of `index`
    #[must_use]
    pub fn to_index(index: usize, from_percent: f32, config: &AnimationConfig) -> Self {
        Self {
            index,
            from_percent,
            to_percent: offset_percent(index),
            duration: Duration::from_millis(u64::from(config.slide_duration_ms)),
            easing: config.easing,
        }
    }

    /// Offset after `elapsed` time into the animation
    #[must_use]
    pub fn offset_at(&self, elapsed: Duration) -> f32 {
        if self.duration.is_zero() || elapsed >= self.duration {
            return self.to_percent;
        }
        #[allow(clippy::cast_possible_truncation)]
        let t = (elapsed.as_secs_f64() / self.duration.as_secs_f64()) as f32;
        self.from_percent + (self.to_percent - self.from_percent) * self.easing.apply(t)
    }

    #[must_use]
    pub fn is_finished(&self, elapsed: Duration) -> bool {
        elapsed >= self.duration
    }
}

fn serialize_millis<S: serde::Serializer>(duration: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u128(duration.as_millis())
}

impl Easing {
    /// Map linear progress `t` in `[0, 1]` onto the curve
    #[must_use]
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::Power2In => t * t * t,
            Self::Power2Out => 1.0 - (1.0 - t).powi(3),
            Self::Power2InOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}
