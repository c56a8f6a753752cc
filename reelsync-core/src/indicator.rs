//! Per-segment progress indicators.
//!
//! Each segment owns one [`IndicatorState`]. Whether a compact indicator is
//! drawn as "completed" or "neutral" is decided purely by comparing its index
//! with the current index; no completed flag is stored.

use crate::config::IndicatorConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Viewport width category. Only affects the expanded indicator width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Breakpoint {
    Narrow,
    Medium,
    #[default]
    Wide,
}

impl Breakpoint {
    /// Classify a viewport width (CSS px) using the configured thresholds
    #[must_use]
    pub fn from_viewport_width(width_px: f32, config: &IndicatorConfig) -> Self {
        if width_px < config.breakpoints.narrow_below_px {
            Self::Narrow
        } else if width_px < config.breakpoints.medium_below_px {
            Self::Medium
        } else {
            Self::Wide
        }
    }
}

/// Unit of a [`CssLength`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthUnit {
    Px,
    Vw,
    Percent,
}

impl LengthUnit {
    const fn suffix(self) -> &'static str {
        match self {
            Self::Px => "px",
            Self::Vw => "vw",
            Self::Percent => "%",
        }
    }
}

/// A non-negative CSS length such as `12px` or `10vw`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CssLength {
    pub value: f32,
    pub unit: LengthUnit,
}

impl CssLength {
    #[must_use]
    pub const fn px(value: f32) -> Self {
        Self {
            value,
            unit: LengthUnit::Px,
        }
    }

    #[must_use]
    pub const fn vw(value: f32) -> Self {
        Self {
            value,
            unit: LengthUnit::Vw,
        }
    }

    #[must_use]
    pub const fn percent(value: f32) -> Self {
        Self {
            value,
            unit: LengthUnit::Percent,
        }
    }
}

impl fmt::Display for CssLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

impl FromStr for CssLength {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (number, unit) = if let Some(n) = s.strip_suffix("px") {
            (n, LengthUnit::Px)
        } else if let Some(n) = s.strip_suffix("vw") {
            (n, LengthUnit::Vw)
        } else if let Some(n) = s.strip_suffix('%') {
            (n, LengthUnit::Percent)
        } else {
            return Err(format!("unsupported length unit in '{s}' (use px, vw or %)"));
        };

        let value: f32 = number
            .trim()
            .parse()
            .map_err(|_| format!("invalid length value in '{s}'"))?;
        if !value.is_finite() || value < 0.0 {
            return Err(format!("length must be a non-negative number: '{s}'"));
        }
        Ok(Self { value, unit })
    }
}

impl TryFrom<String> for CssLength {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CssLength> for String {
    fn from(length: CssLength) -> Self {
        length.to_string()
    }
}

/// Stored per-segment indicator state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct IndicatorState {
    /// Quantized fill, 0..=100
    pub fill_percent: u8,
    pub is_active: bool,
}

/// Tint of a compact indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorTint {
    /// Already played
    Completed,
    /// Not reached yet
    Neutral,
}

/// How one indicator should be drawn. Colors are hex strings taken from
/// [`IndicatorColors`](crate::config::IndicatorColors).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum IndicatorView {
    Compact {
        width: CssLength,
        tint: IndicatorTint,
        color: String,
    },
    Expanded {
        width: CssLength,
        fill_percent: u8,
        /// Color of the filled part
        fill_color: String,
    },
}

/// The row of indicators under the carousel
#[derive(Debug, Clone)]
pub struct IndicatorStrip {
    states: Vec<IndicatorState>,
    current_index: usize,
    breakpoint: Breakpoint,
}

impl IndicatorStrip {
    #[must_use]
    pub fn new(segment_count: usize) -> Self {
        Self {
            states: vec![IndicatorState::default(); segment_count.max(1)],
            current_index: 0,
            breakpoint: Breakpoint::default(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&IndicatorState> {
        self.states.get(index)
    }

    #[must_use]
    pub fn states(&self) -> &[IndicatorState] {
        &self.states
    }

    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub const fn breakpoint(&self) -> Breakpoint {
        self.breakpoint
    }

    /// Change the breakpoint; returns whether it changed
    pub fn set_breakpoint(&mut self, breakpoint: Breakpoint) -> bool {
        std::mem::replace(&mut self.breakpoint, breakpoint) != breakpoint
    }

    /// Make `index` the only active indicator, with an empty fill
    pub fn activate(&mut self, index: usize) {
        if index >= self.states.len() {
            return;
        }
        for state in &mut self.states {
            state.is_active = false;
        }
        self.current_index = index;
        self.states[index] = IndicatorState {
            fill_percent: 0,
            is_active: true,
        };
    }

    /// Snap a finished segment to full and inactive, whatever was last sampled
    pub fn complete(&mut self, index: usize) {
        if let Some(state) = self.states.get_mut(index) {
            *state = IndicatorState {
                fill_percent: 100,
                is_active: false,
            };
        }
    }

    /// Set the fill of the active indicator. Ignored for any other index.
    ///
    /// Returns whether the stored state changed.
    pub fn set_fill(&mut self, index: usize, percent: u8) -> bool {
        match self.states.get_mut(index) {
            Some(state) if state.is_active && state.fill_percent != percent => {
                state.fill_percent = percent.min(100);
                true
            }
            _ => false,
        }
    }

    /// Mark the whole strip as played: every indicator compact and completed
    pub fn finish(&mut self) {
        for state in &mut self.states {
            *state = IndicatorState {
                fill_percent: 100,
                is_active: false,
            };
        }
        self.current_index = self.states.len();
    }

    /// Every indicator back to idle, current index back to 0
    pub fn reset(&mut self) {
        for state in &mut self.states {
            *state = IndicatorState::default();
        }
        self.current_index = 0;
    }

    /// How indicator `index` should be drawn right now
    #[must_use]
    pub fn view(&self, index: usize, config: &IndicatorConfig) -> Option<IndicatorView> {
        let state = self.states.get(index)?;
        let view = if state.is_active && index == self.current_index {
            IndicatorView::Expanded {
                width: config.expanded_width.for_breakpoint(self.breakpoint),
                fill_percent: state.fill_percent,
                fill_color: config.colors.active.clone(),
            }
        } else {
            let tint = if index < self.current_index {
                IndicatorTint::Completed
            } else {
                IndicatorTint::Neutral
            };
            IndicatorView::Compact {
                width: config.compact_width,
                tint,
                color: config.colors.for_tint(tint).to_string(),
            }
        };
        Some(view)
    }

    /// Views of all indicators in order
    #[must_use]
    pub fn views(&self, config: &IndicatorConfig) -> Vec<IndicatorView> {
        (0..self.states.len())
            .filter_map(|index| self.view(index, config))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> IndicatorConfig {
        IndicatorConfig::default()
    }

    #[test]
    fn test_breakpoint_thresholds() {
        let config = config();
        assert_eq!(Breakpoint::from_viewport_width(375.0, &config), Breakpoint::Narrow);
        assert_eq!(Breakpoint::from_viewport_width(759.9, &config), Breakpoint::Narrow);
        assert_eq!(Breakpoint::from_viewport_width(760.0, &config), Breakpoint::Medium);
        assert_eq!(Breakpoint::from_viewport_width(1199.0, &config), Breakpoint::Medium);
        assert_eq!(Breakpoint::from_viewport_width(1200.0, &config), Breakpoint::Wide);
    }

    #[test]
    fn test_css_length_parse() {
        assert_eq!("12px".parse::<CssLength>(), Ok(CssLength::px(12.0)));
        assert_eq!(" 10vw ".parse::<CssLength>(), Ok(CssLength::vw(10.0)));
        assert_eq!("50%".parse::<CssLength>(), Ok(CssLength::percent(50.0)));
        assert!("12em".parse::<CssLength>().is_err());
        assert!("-4px".parse::<CssLength>().is_err());
        assert!("px".parse::<CssLength>().is_err());
    }

    #[test]
    fn test_css_length_display() {
        assert_eq!(CssLength::vw(4.0).to_string(), "4vw");
        assert_eq!(CssLength::percent(50.0).to_string(), "50%");
    }

    #[test]
    fn test_only_current_index_is_expanded() {
        let config = config();
        let mut strip = IndicatorStrip::new(4);
        strip.activate(0);
        strip.complete(0);
        strip.activate(1);
        strip.set_fill(1, 40);

        let views = strip.views(&config);
        assert_eq!(
            views[0],
            IndicatorView::Compact {
                width: CssLength::px(12.0),
                tint: IndicatorTint::Completed,
                color: "#afafaf".to_string(),
            }
        );
        assert_eq!(
            views[1],
            IndicatorView::Expanded {
                width: CssLength::vw(4.0),
                fill_percent: 40,
                fill_color: "#ffffff".to_string(),
            }
        );
        assert_eq!(
            views[2],
            IndicatorView::Compact {
                width: CssLength::px(12.0),
                tint: IndicatorTint::Neutral,
                color: "#e5e7eb".to_string(),
            }
        );
    }

    #[test]
    fn test_expanded_width_follows_breakpoint() {
        let config = config();
        let mut strip = IndicatorStrip::new(2);
        strip.activate(0);
        assert!(strip.set_breakpoint(Breakpoint::Narrow));
        assert!(!strip.set_breakpoint(Breakpoint::Narrow));
        assert_eq!(
            strip.view(0, &config),
            Some(IndicatorView::Expanded {
                width: CssLength::vw(10.0),
                fill_percent: 0,
                fill_color: "#ffffff".to_string(),
            })
        );
    }

    #[test]
    fn test_views_use_configured_colors() {
        let mut config = config();
        config.colors.completed = "#112233".to_string();
        config.colors.active = "#ff0000".to_string();
        config.colors.neutral = "#000000".to_string();

        let mut strip = IndicatorStrip::new(3);
        strip.activate(1);
        let views = strip.views(&config);

        assert!(matches!(&views[0], IndicatorView::Compact { color, .. } if color == "#112233"));
        assert!(matches!(&views[1], IndicatorView::Expanded { fill_color, .. } if fill_color == "#ff0000"));
        assert!(matches!(&views[2], IndicatorView::Compact { color, .. } if color == "#000000"));
    }

    #[test]
    fn test_set_fill_ignores_inactive() {
        let mut strip = IndicatorStrip::new(3);
        strip.activate(1);
        assert!(!strip.set_fill(0, 50));
        assert!(strip.set_fill(1, 50));
        assert!(!strip.set_fill(1, 50));
        assert_eq!(strip.get(1).map(|s| s.fill_percent), Some(50));
    }

    #[test]
    fn test_complete_snaps_to_full() {
        let mut strip = IndicatorStrip::new(2);
        strip.activate(0);
        strip.set_fill(0, 63);
        strip.complete(0);
        let state = strip.get(0).copied().unwrap_or_default();
        assert_eq!(state.fill_percent, 100);
        assert!(!state.is_active);
    }

    #[test]
    fn test_reset_returns_all_to_idle() {
        let config = config();
        let mut strip = IndicatorStrip::new(3);
        strip.activate(2);
        strip.complete(0);
        strip.complete(1);
        strip.reset();
        assert_eq!(strip.current_index(), 0);
        assert!(strip.states().iter().all(|s| *s == IndicatorState::default()));
        assert!(strip
            .views(&config)
            .iter()
            .all(|v| matches!(v, IndicatorView::Compact { tint: IndicatorTint::Neutral, .. })));
    }

    #[test]
    fn test_finish_tints_every_indicator_completed() {
        let config = config();
        let mut strip = IndicatorStrip::new(3);
        strip.activate(2);
        strip.finish();
        assert!(strip
            .views(&config)
            .iter()
            .all(|v| matches!(v, IndicatorView::Compact { tint: IndicatorTint::Completed, .. })));
    }

    #[test]
    fn test_activate_out_of_range_is_ignored() {
        let mut strip = IndicatorStrip::new(2);
        strip.activate(5);
        assert_eq!(strip.current_index(), 0);
        assert!(strip.states().iter().all(|s| !s.is_active));
    }
}
