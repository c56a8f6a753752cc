//! Media transport seam.
//!
//! A [`MediaHandle`] wraps one platform media element bound to one segment.
//! The controller owns one handle per segment, indexed by segment position.

use crate::error::PlaybackError;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;

/// Notifications a media element pushes back to its controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaEventKind {
    /// One playback pass completed. Emitted exactly once per pass.
    Ended,
    /// Transport metadata became available
    MetadataLoaded { duration: Duration },
}

/// A [`MediaEventKind`] tagged with the segment index it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaEvent {
    pub index: usize,
    pub kind: MediaEventKind,
}

/// Sending half handed to a media handle on attach.
///
/// Each sink is bound to one segment index so the handle never needs to know
/// where it sits in the sequence.
#[derive(Debug, Clone)]
pub struct MediaEventSink {
    index: usize,
    tx: mpsc::UnboundedSender<MediaEvent>,
}

impl MediaEventSink {
    #[must_use]
    pub const fn new(index: usize, tx: mpsc::UnboundedSender<MediaEvent>) -> Self {
        Self { index, tx }
    }

    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Report that the current playback pass reached its end.
    ///
    /// Returns `false` if the controller is gone.
    pub fn ended(&self) -> bool {
        self.send(MediaEventKind::Ended)
    }

    /// Report resolved transport metadata
    pub fn metadata_loaded(&self, duration: Duration) -> bool {
        self.send(MediaEventKind::MetadataLoaded { duration })
    }

    fn send(&self, kind: MediaEventKind) -> bool {
        self.tx
            .send(MediaEvent {
                index: self.index,
                kind,
            })
            .is_ok()
    }
}

/// Contract of a per-segment media element.
///
/// Implementations must uphold:
///
/// - `play()` is idempotent while already playing, resumes from the current
///   position when paused, and starts a new pass from the beginning once a
///   pass has completed. It may fail; a failed play leaves the transport
///   unchanged.
/// - `pause()` is idempotent and infallible.
/// - Exactly one `ended` notification per completed pass; no auto-looping.
/// - `duration()` reports the transport's own duration once metadata loads.
///   The declared segment duration is independent of it.
#[async_trait]
pub trait MediaHandle: Send + Sync {
    /// Source the handle is bound to
    fn source(&self) -> &str;

    /// Start or resume playback
    ///
    /// # Errors
    ///
    /// Returns a [`PlaybackError`] when the transport refuses or fails to start.
    async fn play(&self) -> Result<(), PlaybackError>;

    /// Pause playback; settled when the future resolves
    async fn pause(&self);

    /// Current playback position
    fn current_time(&self) -> Duration;

    /// Transport duration, if metadata is loaded
    fn duration(&self) -> Option<Duration>;

    /// Whether the transport is currently in its playing state
    fn is_playing(&self) -> bool;

    /// Start delivering `ended`/metadata notifications to `sink`
    fn attach(&self, sink: MediaEventSink);

    /// Stop delivering notifications
    fn detach(&self);
}
