use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // Configuration errors
    #[error("Config file not found at {path}. A template has been created - edit it and restart.")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid config: {message}")]
    ConfigInvalid { message: String },

    #[error("Failed to parse config file: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    // IO errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// The scroll observation behind a [`ScrollActivationTrigger`](crate::ScrollActivationTrigger)
/// could not be established.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActivationError {
    #[error("Activation anchor element is not present")]
    AnchorMissing,

    #[error("Viewport height must be positive")]
    InvalidViewport,
}

/// A media transport refused or failed to start playback.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlaybackError {
    /// The platform refused to start playback (e.g. autoplay policy).
    #[error("Playback not allowed: {reason}")]
    NotAllowed { reason: String },

    /// The media source could not be loaded or decoded.
    #[error("Media source unavailable: {reason}")]
    SourceUnavailable { reason: String },

    /// A pending play request was interrupted before it settled.
    #[error("Play request aborted")]
    Aborted,
}

/// Degraded-mode status surfaced to the page. None of these are fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CarouselError {
    #[error("Scroll activation unavailable, falling back to manual start: {reason}")]
    Activation { reason: ActivationError },

    #[error("Playback of segment {index} failed: {source}")]
    Playback { index: usize, source: PlaybackError },

    #[error("Duration of segment {index} is unknown, progress sampling skipped")]
    MetadataUnavailable { index: usize },
}
