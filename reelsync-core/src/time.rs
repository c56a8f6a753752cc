//! Time and duration conversion utilities.
//!
//! Durations flow through the engine as [`Duration`]; the page side speaks in
//! milliseconds and fractional seconds, so the conversions live here with
//! explicit saturation instead of `as` casts.

use std::time::Duration;

/// Extension trait for safe Duration conversions.
pub trait DurationExt {
    /// Convert duration to milliseconds as u64, saturating at `u64::MAX`.
    fn as_millis_u64(&self) -> u64;

    /// Fraction of `total` covered by this duration, clamped to `[0, 1]`.
    ///
    /// Returns `None` when `total` is zero, since no meaningful fraction exists.
    fn fraction_of(&self, total: Duration) -> Option<f64>;
}

impl DurationExt for Duration {
    fn as_millis_u64(&self) -> u64 {
        u64::try_from(self.as_millis()).unwrap_or(u64::MAX)
    }

    fn fraction_of(&self, total: Duration) -> Option<f64> {
        if total.is_zero() {
            return None;
        }
        Some((self.as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0))
    }
}

/// Build a duration from fractional seconds, rejecting non-finite or non-positive values.
#[must_use]
pub fn positive_secs(secs: f64) -> Option<Duration> {
    if secs.is_finite() && secs > 0.0 {
        Duration::try_from_secs_f64(secs).ok()
    } else {
        None
    }
}
