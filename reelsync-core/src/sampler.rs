//! Per-frame progress estimation for the active segment.
//!
//! The estimate is cosmetic: it only moves the indicator fill and never
//! decides when a segment is over.

use crate::time::DurationExt;
use std::time::Duration;

/// Result of one sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sample {
    /// Quantized percent changed; the indicator should be updated
    Changed(u8),
    /// Same percent as last time, nothing to do
    Unchanged,
    /// No duration is known for the segment
    NoDuration,
}

/// Converts playback position samples into a quantized, non-decreasing percent.
#[derive(Debug, Clone, Default)]
pub struct ProgressSampler {
    percent: u8,
    reported_missing: bool,
}

impl ProgressSampler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last published percent
    #[must_use]
    pub const fn percent(&self) -> u8 {
        self.percent
    }

    /// Start a fresh pass (new active segment or replay)
    pub fn reset(&mut self) {
        self.percent = 0;
        self.reported_missing = false;
    }

    /// Sample the playback position against the best known duration.
    ///
    /// The percent is `ceil(fraction * 100)` and never moves backwards within
    /// a pass, so transport jitter cannot make the fill shrink.
    pub fn sample(&mut self, current_time: Duration, duration: Option<Duration>) -> Sample {
        let Some(fraction) = duration.and_then(|total| current_time.fraction_of(total)) else {
            return Sample::NoDuration;
        };

        let percent = quantize(fraction).max(self.percent);
        if percent == self.percent {
            return Sample::Unchanged;
        }
        self.percent = percent;
        Sample::Changed(percent)
    }

    /// Returns true the first time a missing duration is seen in this pass
    pub fn note_missing_duration(&mut self) -> bool {
        !std::mem::replace(&mut self.reported_missing, true)
    }
}

/// Quantize a `[0, 1]` fraction to an integer percent, rounding up.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn quantize(fraction: f64) -> u8 {
    // Clamped to [0, 100] before the cast, so truncation and sign loss cannot occur.
    (fraction.clamp(0.0, 1.0) * 100.0).ceil().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOUR_SECS: Option<Duration> = Some(Duration::from_secs(4));

    #[test]
    fn test_quantize_rounds_up() {
        assert_eq!(quantize(0.0), 0);
        assert_eq!(quantize(0.001), 1);
        assert_eq!(quantize(0.5), 50);
        assert_eq!(quantize(0.991), 100);
        assert_eq!(quantize(1.0), 100);
        assert_eq!(quantize(2.0), 100);
        assert_eq!(quantize(-1.0), 0);
    }

    #[test]
    fn test_sample_reports_only_changes() {
        let mut sampler = ProgressSampler::new();
        assert_eq!(sampler.sample(Duration::from_secs(1), FOUR_SECS), Sample::Changed(25));
        assert_eq!(sampler.sample(Duration::from_secs(1), FOUR_SECS), Sample::Unchanged);
        assert_eq!(sampler.sample(Duration::from_secs(2), FOUR_SECS), Sample::Changed(50));
    }

    #[test]
    fn test_sample_is_non_decreasing() {
        let mut sampler = ProgressSampler::new();
        sampler.sample(Duration::from_secs(3), FOUR_SECS);
        assert_eq!(sampler.sample(Duration::from_secs(1), FOUR_SECS), Sample::Unchanged);
        assert_eq!(sampler.percent(), 75);
    }

    #[test]
    fn test_sample_clamps_past_declared_duration() {
        let mut sampler = ProgressSampler::new();
        assert_eq!(sampler.sample(Duration::from_secs(9), FOUR_SECS), Sample::Changed(100));
    }

    #[test]
    fn test_sample_without_duration() {
        let mut sampler = ProgressSampler::new();
        assert_eq!(sampler.sample(Duration::from_secs(1), None), Sample::NoDuration);
        assert_eq!(
            sampler.sample(Duration::from_secs(1), Some(Duration::ZERO)),
            Sample::NoDuration
        );
        assert_eq!(sampler.percent(), 0);
    }

    #[test]
    fn test_missing_duration_noted_once_per_pass() {
        let mut sampler = ProgressSampler::new();
        assert!(sampler.note_missing_duration());
        assert!(!sampler.note_missing_duration());
        sampler.reset();
        assert!(sampler.note_missing_duration());
    }

    #[test]
    fn test_reset_restarts_from_zero() {
        let mut sampler = ProgressSampler::new();
        sampler.sample(Duration::from_secs(4), FOUR_SECS);
        sampler.reset();
        assert_eq!(sampler.percent(), 0);
        assert_eq!(sampler.sample(Duration::from_secs(1), FOUR_SECS), Sample::Changed(25));
    }
}
