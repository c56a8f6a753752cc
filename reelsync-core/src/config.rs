use crate::error::{CoreError, Result};
use crate::indicator::{Breakpoint, CssLength, IndicatorTint};
use crate::segment::{Segment, SegmentId};
use crate::time::positive_secs;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarouselConfig {
    pub segments: Vec<SegmentConfig>,
    #[serde(default)]
    pub indicator: IndicatorConfig,
    #[serde(default)]
    pub scroll: ScrollConfig,
    #[serde(default)]
    pub animation: AnimationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentConfig {
    pub id: u32,
    pub media_source: String,
    /// Omit when unknown; progress then falls back to transport metadata
    pub declared_duration_secs: Option<f64>,
    #[serde(default)]
    pub caption_lines: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorConfig {
    #[serde(default = "default_compact_width")]
    pub compact_width: CssLength,
    #[serde(default)]
    pub expanded_width: ExpandedWidths,
    #[serde(default)]
    pub breakpoints: BreakpointConfig,
    #[serde(default)]
    pub colors: IndicatorColors,
}

const fn default_compact_width() -> CssLength {
    CssLength::px(12.0)
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            compact_width: default_compact_width(),
            expanded_width: ExpandedWidths::default(),
            breakpoints: BreakpointConfig::default(),
            colors: IndicatorColors::default(),
        }
    }
}

/// Maximum width of the active indicator per breakpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpandedWidths {
    #[serde(default = "default_narrow_width")]
    pub narrow: CssLength,
    #[serde(default = "default_medium_width")]
    pub medium: CssLength,
    #[serde(default = "default_wide_width")]
    pub wide: CssLength,
}

const fn default_narrow_width() -> CssLength {
    CssLength::vw(10.0)
}

const fn default_medium_width() -> CssLength {
    CssLength::vw(10.0)
}

const fn default_wide_width() -> CssLength {
    CssLength::vw(4.0)
}

impl ExpandedWidths {
    #[must_use]
    pub const fn for_breakpoint(&self, breakpoint: Breakpoint) -> CssLength {
        match breakpoint {
            Breakpoint::Narrow => self.narrow,
            Breakpoint::Medium => self.medium,
            Breakpoint::Wide => self.wide,
        }
    }
}

impl Default for ExpandedWidths {
    fn default() -> Self {
        Self {
            narrow: default_narrow_width(),
            medium: default_medium_width(),
            wide: default_wide_width(),
        }
    }
}

/// Viewport width thresholds in CSS px
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakpointConfig {
    #[serde(default = "default_narrow_below")]
    pub narrow_below_px: f32,
    #[serde(default = "default_medium_below")]
    pub medium_below_px: f32,
}

const fn default_narrow_below() -> f32 {
    760.0
}

const fn default_medium_below() -> f32 {
    1200.0
}

impl Default for BreakpointConfig {
    fn default() -> Self {
        Self {
            narrow_below_px: default_narrow_below(),
            medium_below_px: default_medium_below(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorColors {
    #[serde(default = "default_completed_color")]
    pub completed: String,
    #[serde(default = "default_active_color")]
    pub active: String,
    #[serde(default = "default_neutral_color")]
    pub neutral: String,
}

fn default_completed_color() -> String {
    "#afafaf".to_string()
}

fn default_active_color() -> String {
    "#ffffff".to_string()
}

fn default_neutral_color() -> String {
    "#e5e7eb".to_string()
}

impl Default for IndicatorColors {
    fn default() -> Self {
        Self {
            completed: default_completed_color(),
            active: default_active_color(),
            neutral: default_neutral_color(),
        }
    }
}

impl IndicatorColors {
    /// Color of a compact indicator with `tint`
    #[must_use]
    pub fn for_tint(&self, tint: IndicatorTint) -> &str {
        match tint {
            IndicatorTint::Completed => &self.completed,
            IndicatorTint::Neutral => &self.neutral,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollConfig {
    /// Threshold line as a fraction of viewport height (1.0 = bottom edge)
    #[serde(default = "default_start_fraction")]
    pub start_fraction: f32,
}

const fn default_start_fraction() -> f32 {
    1.0
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            start_fraction: default_start_fraction(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    Power2In,
    Power2Out,
    #[default]
    Power2InOut,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationConfig {
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,
    #[serde(default = "default_slide_duration")]
    pub slide_duration_ms: u32,
    #[serde(default)]
    pub easing: Easing,
}

const fn default_frame_rate() -> u32 {
    60
}

const fn default_slide_duration() -> u32 {
    2000
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            frame_rate: default_frame_rate(),
            slide_duration_ms: default_slide_duration(),
            easing: Easing::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// Also write logs to `reelsync.log` next to the config file
    #[serde(default)]
    pub file_enabled: bool,
}

impl CarouselConfig {
    /// Get the config file path (~/.config/reelsync/config.toml)
    #[must_use]
    pub fn config_path() -> PathBuf {
        crate::paths::config_path()
    }

    /// Load config from `path`, or write the template there on first run
    ///
    /// # Errors
    ///
    /// Returns `ConfigNotFound` after creating the template, or an error if the
    /// file cannot be read, parsed or validated.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, CONFIG_TEMPLATE)?;

            return Err(CoreError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a TOML document
    ///
    /// # Errors
    ///
    /// Returns `ConfigParseError` on TOML errors and `ConfigInvalid` when a
    /// value is out of range.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` describing the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.segments.is_empty() {
            return Err(invalid("at least one [[segments]] entry is required"));
        }

        let mut seen = HashSet::new();
        for segment in &self.segments {
            if !seen.insert(segment.id) {
                return Err(invalid(format!("duplicate segment id {}", segment.id)));
            }
            if segment.media_source.trim().is_empty() {
                return Err(invalid(format!("segment {} has an empty media_source", segment.id)));
            }
            if let Some(secs) = segment.declared_duration_secs {
                if positive_secs(secs).is_none() {
                    return Err(invalid(format!(
                        "segment {} declared_duration_secs must be a positive number, got {secs}",
                        segment.id
                    )));
                }
            }
        }

        let breakpoints = &self.indicator.breakpoints;
        if !(breakpoints.narrow_below_px > 0.0
            && breakpoints.narrow_below_px < breakpoints.medium_below_px)
        {
            return Err(invalid(
                "indicator.breakpoints must satisfy 0 < narrow_below_px < medium_below_px",
            ));
        }

        let colors = &self.indicator.colors;
        for (field, value) in [
            ("completed", &colors.completed),
            ("active", &colors.active),
            ("neutral", &colors.neutral),
        ] {
            if Self::parse_color(value).is_none() {
                return Err(invalid(format!("indicator.colors.{field} is not a hex color: {value}")));
            }
        }

        if !(0.0..=1.0).contains(&self.scroll.start_fraction) {
            return Err(invalid("scroll.start_fraction must be between 0.0 and 1.0"));
        }

        if self.animation.frame_rate == 0 {
            return Err(invalid("animation.frame_rate must be greater than 0"));
        }

        Ok(())
    }

    /// Build the immutable segment list in configured order
    #[must_use]
    pub fn build_segments(&self) -> Vec<Segment> {
        self.segments
            .iter()
            .map(|s| {
                Segment::new(
                    SegmentId(s.id),
                    &s.media_source,
                    s.declared_duration_secs.and_then(positive_secs),
                    s.caption_lines.clone(),
                )
            })
            .collect()
    }

    /// Parse a hex color string to RGBA tuple
    #[must_use]
    pub fn parse_color(hex: &str) -> Option<(u8, u8, u8, u8)> {
        let hex = hex.trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }
        match hex.len() {
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some((r, g, b, 255))
            }
            8 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                let a = u8::from_str_radix(&hex[6..8], 16).ok()?;
                Some((r, g, b, a))
            }
            _ => None,
        }
    }
}

fn invalid(message: impl Into<String>) -> CoreError {
    CoreError::ConfigInvalid {
        message: message.into(),
    }
}

pub const CONFIG_TEMPLATE: &str = r##"# Reelsync Configuration
# ~/.config/reelsync/config.toml

# Segments play in the order listed. declared_duration_secs only drives the
# progress fill; advancing always waits for the media's own end.
[[segments]]
id = 1
media_source = "/assets/videos/highlight-first.mp4"
declared_duration_secs = 4
caption_lines = ["Enter A17 Pro.", "Game-changing chip.", "Groundbreaking performance."]

[[segments]]
id = 2
media_source = "/assets/videos/hightlight-third.mp4"
declared_duration_secs = 5
caption_lines = ["Titanium.", "So strong. So light. So Pro."]

[[segments]]
id = 3
media_source = "/assets/videos/hightlight-sec.mp4"
declared_duration_secs = 2
caption_lines = ["iPhone 15 Pro Max has the", "longest optical zoom in", "iPhone ever. Far far far."]

[[segments]]
id = 4
media_source = "/assets/videos/hightlight-fourth.mp4"
declared_duration_secs = 3.63
caption_lines = ["All-new Action button.", "What will yours do?."]

[indicator]
compact_width = "12px"

[indicator.expanded_width]
narrow = "10vw"
medium = "10vw"
wide = "4vw"

[indicator.breakpoints]
narrow_below_px = 760
medium_below_px = 1200

[indicator.colors]
completed = "#afafaf"
active = "#ffffff"
neutral = "#e5e7eb"

[scroll]
# Activation line as a fraction of viewport height (1.0 = bottom edge)
start_fraction = 1.0

[animation]
frame_rate = 60
slide_duration_ms = 2000
easing = "power2_in_out"  # "linear", "power2_in", "power2_out", "power2_in_out"

[logging]
file_enabled = false
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const MINIMAL: &str = r#"
[[segments]]
id = 1
media_source = "a.mp4"
declared_duration_secs = 4
"#;

    #[test]
    fn test_template_parses() {
        let config = CarouselConfig::from_toml_str(CONFIG_TEMPLATE);
        assert!(config.is_ok(), "{config:?}");
        let config = config.unwrap_or_else(|_| unreachable!());
        assert_eq!(config.segments.len(), 4);
        assert_eq!(config.indicator.compact_width, CssLength::px(12.0));
        assert_eq!(config.indicator.expanded_width.wide, CssLength::vw(4.0));
        assert_eq!(config.animation.easing, Easing::Power2InOut);
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config = CarouselConfig::from_toml_str(MINIMAL);
        assert!(config.is_ok());
        let config = config.unwrap_or_else(|_| unreachable!());
        assert_eq!(config.animation.frame_rate, 60);
        assert_eq!(config.animation.slide_duration_ms, 2000);
        assert!((config.scroll.start_fraction - 1.0).abs() < f32::EPSILON);
        assert!((config.indicator.breakpoints.narrow_below_px - 760.0).abs() < f32::EPSILON);
        assert!(!config.logging.file_enabled);
    }

    #[test]
    fn test_build_segments_preserves_order_and_durations() {
        let config = CarouselConfig::from_toml_str(CONFIG_TEMPLATE);
        let segments = config.map(|c| c.build_segments()).unwrap_or_default();
        let ids: Vec<_> = segments.iter().map(|s| s.id().0).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(segments[3].declared_duration(), Some(Duration::from_secs_f64(3.63)));
        assert_eq!(segments[1].caption_lines()[0], "Titanium.");
    }

    #[test]
    fn test_missing_duration_is_allowed() {
        let config = CarouselConfig::from_toml_str(
            r#"
[[segments]]
id = 1
media_source = "a.mp4"
"#,
        );
        let segments = config.map(|c| c.build_segments()).unwrap_or_default();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].declared_duration(), None);
    }

    #[test]
    fn test_rejects_empty_segments() {
        let result = CarouselConfig::from_toml_str("segments = []");
        assert!(matches!(result, Err(CoreError::ConfigInvalid { .. })));
    }

    #[test]
    fn test_rejects_non_positive_duration() {
        let result = CarouselConfig::from_toml_str(
            r#"
[[segments]]
id = 1
media_source = "a.mp4"
declared_duration_secs = 0
"#,
        );
        assert!(matches!(result, Err(CoreError::ConfigInvalid { .. })));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let result = CarouselConfig::from_toml_str(
            r#"
[[segments]]
id = 1
media_source = "a.mp4"

[[segments]]
id = 1
media_source = "b.mp4"
"#,
        );
        assert!(matches!(result, Err(CoreError::ConfigInvalid { .. })));
    }

    #[test]
    fn test_rejects_inverted_breakpoints() {
        let content = format!(
            "{MINIMAL}\n[indicator.breakpoints]\nnarrow_below_px = 1300\nmedium_below_px = 1200\n"
        );
        let result = CarouselConfig::from_toml_str(&content);
        assert!(matches!(result, Err(CoreError::ConfigInvalid { .. })));
    }

    #[test]
    fn test_rejects_bad_length_unit() {
        let content = format!("{MINIMAL}\n[indicator]\ncompact_width = \"12em\"\n");
        let result = CarouselConfig::from_toml_str(&content);
        assert!(matches!(result, Err(CoreError::ConfigParseError(_))));
    }

    #[test]
    fn test_rejects_bad_color() {
        let content = format!("{MINIMAL}\n[indicator.colors]\nactive = \"white\"\n");
        let result = CarouselConfig::from_toml_str(&content);
        assert!(matches!(result, Err(CoreError::ConfigInvalid { .. })));
    }

    #[test]
    fn test_rejects_zero_frame_rate() {
        let content = format!("{MINIMAL}\n[animation]\nframe_rate = 0\n");
        let result = CarouselConfig::from_toml_str(&content);
        assert!(matches!(result, Err(CoreError::ConfigInvalid { .. })));
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(CarouselConfig::parse_color("#afafaf"), Some((0xaf, 0xaf, 0xaf, 255)));
        assert_eq!(CarouselConfig::parse_color("00000080"), Some((0, 0, 0, 0x80)));
        assert_eq!(CarouselConfig::parse_color("#fff"), None);
        assert_eq!(CarouselConfig::parse_color("#gggggg"), None);
    }

    #[test]
    fn test_expanded_width_for_breakpoint() {
        let widths = ExpandedWidths::default();
        assert_eq!(widths.for_breakpoint(Breakpoint::Narrow), CssLength::vw(10.0));
        assert_eq!(widths.for_breakpoint(Breakpoint::Medium), CssLength::vw(10.0));
        assert_eq!(widths.for_breakpoint(Breakpoint::Wide), CssLength::vw(4.0));
    }

    #[test]
    fn test_load_or_create_writes_template() {
        let dir = std::env::temp_dir().join(format!("reelsync-config-test-{}", std::process::id()));
        let path = dir.join("config.toml");
        let _ = fs::remove_dir_all(&dir);

        let first = CarouselConfig::load_or_create(&path);
        assert!(matches!(first, Err(CoreError::ConfigNotFound { .. })));
        assert!(path.exists());

        let second = CarouselConfig::load_or_create(&path);
        assert!(second.is_ok());

        let _ = fs::remove_dir_all(&dir);
    }
}
