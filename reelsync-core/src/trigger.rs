//! Scroll-position activation trigger.
//!
//! Watches an anchor element's top edge against a threshold line placed at a
//! fraction of the viewport height. Crossing the line while scrolling down
//! emits an activation; scrolling back above it re-arms the edge so the next
//! downward crossing fires again.

use crate::config::ScrollConfig;
use crate::error::ActivationError;
use tracing::debug;

const LOG_TARGET: &str = "reelsync::trigger";

/// One observation of the page's scroll geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollSample {
    /// Anchor's top edge relative to the viewport top, in CSS px.
    /// `None` when the anchor element does not exist.
    pub anchor_top: Option<f32>,
    pub viewport_height: f32,
}

impl ScrollSample {
    #[must_use]
    pub const fn new(anchor_top: f32, viewport_height: f32) -> Self {
        Self {
            anchor_top: Some(anchor_top),
            viewport_height,
        }
    }

    #[must_use]
    pub const fn missing_anchor(viewport_height: f32) -> Self {
        Self {
            anchor_top: None,
            viewport_height,
        }
    }
}

/// Edge-triggered scroll activation detector
#[derive(Debug, Clone)]
pub struct ScrollActivationTrigger {
    start_fraction: f32,
    /// Whether the anchor was past the threshold at the last observation
    entered: Option<bool>,
}

impl ScrollActivationTrigger {
    #[must_use]
    pub fn new(config: &ScrollConfig) -> Self {
        Self {
            start_fraction: config.start_fraction.clamp(0.0, 1.0),
            entered: None,
        }
    }

    /// Establish the observation from an initial sample.
    ///
    /// An anchor that is already past the threshold at attach time counts as
    /// an entry, so a page loaded mid-scroll still activates.
    ///
    /// # Errors
    ///
    /// Returns an [`ActivationError`] when the anchor is absent or the
    /// viewport has no height.
    pub fn attach(&mut self, sample: ScrollSample) -> Result<bool, ActivationError> {
        let past = self.is_past_threshold(sample)?;
        self.entered = Some(past);
        debug!(target: LOG_TARGET, "Trigger attached (past threshold: {})", past);
        Ok(past)
    }

    /// Stop observing. Subsequent samples are ignored until re-attached.
    pub fn detach(&mut self) {
        self.entered = None;
    }

    #[must_use]
    pub const fn is_attached(&self) -> bool {
        self.entered.is_some()
    }

    /// Feed one scroll sample; returns true on a downward entry edge.
    ///
    /// # Errors
    ///
    /// Returns an [`ActivationError`] when the sample cannot be evaluated.
    /// A detached trigger ignores samples and returns `Ok(false)`.
    pub fn observe(&mut self, sample: ScrollSample) -> Result<bool, ActivationError> {
        let Some(was_past) = self.entered else {
            return Ok(false);
        };
        let past = self.is_past_threshold(sample)?;
        self.entered = Some(past);

        let fired = past && !was_past;
        if fired {
            debug!(target: LOG_TARGET, "Anchor entered from above");
        }
        Ok(fired)
    }

    fn is_past_threshold(&self, sample: ScrollSample) -> Result<bool, ActivationError> {
        if !(sample.viewport_height.is_finite() && sample.viewport_height > 0.0) {
            return Err(ActivationError::InvalidViewport);
        }
        let top = sample.anchor_top.ok_or(ActivationError::AnchorMissing)?;
        Ok(top <= sample.viewport_height * self.start_fraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trigger() -> ScrollActivationTrigger {
        // Threshold at 85% of an 800px viewport: 680px
        ScrollActivationTrigger::new(&ScrollConfig {
            start_fraction: 0.85,
        })
    }

    #[test]
    fn test_fires_on_downward_entry() {
        let mut trigger = trigger();
        assert_eq!(trigger.attach(ScrollSample::new(1500.0, 800.0)), Ok(false));
        assert_eq!(trigger.observe(ScrollSample::new(900.0, 800.0)), Ok(false));
        assert_eq!(trigger.observe(ScrollSample::new(600.0, 800.0)), Ok(true));
        assert_eq!(trigger.observe(ScrollSample::new(200.0, 800.0)), Ok(false));
    }

    #[test]
    fn test_refires_after_scrolling_back_up() {
        let mut trigger = trigger();
        let _ = trigger.attach(ScrollSample::new(1000.0, 800.0));
        assert_eq!(trigger.observe(ScrollSample::new(500.0, 800.0)), Ok(true));
        assert_eq!(trigger.observe(ScrollSample::new(900.0, 800.0)), Ok(false));
        assert_eq!(trigger.observe(ScrollSample::new(500.0, 800.0)), Ok(true));
    }

    #[test]
    fn test_attach_past_threshold_counts_as_entry() {
        let mut trigger = trigger();
        assert_eq!(trigger.attach(ScrollSample::new(100.0, 800.0)), Ok(true));
        assert_eq!(trigger.observe(ScrollSample::new(50.0, 800.0)), Ok(false));
    }

    #[test]
    fn test_missing_anchor_fails_attach() {
        let mut trigger = trigger();
        assert_eq!(
            trigger.attach(ScrollSample::missing_anchor(800.0)),
            Err(ActivationError::AnchorMissing)
        );
        assert!(!trigger.is_attached());
    }

    #[test]
    fn test_invalid_viewport() {
        let mut trigger = trigger();
        assert_eq!(
            trigger.attach(ScrollSample::new(10.0, 0.0)),
            Err(ActivationError::InvalidViewport)
        );
    }

    #[test]
    fn test_detached_trigger_ignores_samples() {
        let mut trigger = trigger();
        assert_eq!(trigger.observe(ScrollSample::new(0.0, 800.0)), Ok(false));
        let _ = trigger.attach(ScrollSample::new(1000.0, 800.0));
        trigger.detach();
        assert_eq!(trigger.observe(ScrollSample::new(0.0, 800.0)), Ok(false));
    }
}
