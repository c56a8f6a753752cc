pub mod config;
pub mod controller;
pub mod error;
pub mod indicator;
pub mod machine;
pub mod media;
pub mod paths;
pub mod playback;
pub mod sampler;
pub mod segment;
pub mod slide;
pub mod ticker;
pub mod time;
pub mod trigger;

pub use config::{
    AnimationConfig, CarouselConfig, Easing, IndicatorConfig, LoggingConfig, ScrollConfig,
    SegmentConfig, CONFIG_TEMPLATE,
};
pub use controller::{CarouselEvent, ControllerHandle, ControllerInput, SequenceController};

/// Re-export toml error type for config parsing error handling
pub use toml::de::Error as TomlParseError;
pub use error::{ActivationError, CarouselError, CoreError, PlaybackError};
pub use indicator::{Breakpoint, CssLength, IndicatorStrip, IndicatorTint, IndicatorView};
pub use media::{MediaEvent, MediaEventKind, MediaEventSink, MediaHandle};
pub use paths::{config_dir, log_file_path, CONFIG_DIR_NAME, CONFIG_FILE_NAME, LOG_FILE_NAME};
pub use playback::{ControlAffordance, Phase, PlaybackState};
pub use segment::{Segment, SegmentId};
pub use slide::SlideAnimation;
pub use ticker::{FrameTime, TickToken, Ticker};
pub use time::DurationExt;
pub use trigger::{ScrollActivationTrigger, ScrollSample};
