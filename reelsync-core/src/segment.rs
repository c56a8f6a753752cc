//! Immutable segment descriptors.

use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Stable identifier of a segment, as supplied by the page configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SegmentId(pub u32);

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One unit of the sequence: a media item, its caption and its declared duration.
///
/// Segments are built once from configuration and never mutated; the controller
/// only ever borrows them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    id: SegmentId,
    media_source: String,
    declared_duration: Option<Duration>,
    caption_lines: Vec<String>,
}

impl Segment {
    /// Create a new segment
    pub fn new(
        id: SegmentId,
        media_source: impl Into<String>,
        declared_duration: Option<Duration>,
        caption_lines: Vec<String>,
    ) -> Self {
        Self {
            id,
            media_source: media_source.into(),
            // A zero duration cannot drive a fraction; treat it as unknown.
            declared_duration: declared_duration.filter(|d| !d.is_zero()),
            caption_lines,
        }
    }

    #[must_use]
    pub const fn id(&self) -> SegmentId {
        self.id
    }

    #[must_use]
    pub fn media_source(&self) -> &str {
        &self.media_source
    }

    /// Declared duration, used only to estimate the progress fraction.
    #[must_use]
    pub const fn declared_duration(&self) -> Option<Duration> {
        self.declared_duration
    }

    #[must_use]
    pub fn caption_lines(&self) -> &[String] {
        &self.caption_lines
    }

    /// Caption lines joined for single-line display (logs, accessibility labels)
    #[must_use]
    pub fn caption(&self) -> String {
        self.caption_lines.join(" ")
    }
}
