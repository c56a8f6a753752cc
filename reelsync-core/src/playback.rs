use serde::Serialize;

/// Lifecycle phase of a sequence controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "phase", content = "index", rename_all = "snake_case")]
pub enum Phase {
    /// Not mounted; no listeners registered
    #[default]
    Idle,
    /// Mounted and waiting for the first activation
    Armed,
    /// play() was requested on segment `i` and has not settled yet
    Starting(usize),
    /// Segment `i` is confirmed playing
    Playing(usize),
    /// Segment `i` is paused, by the user or after a failed play()
    Paused(usize),
    /// The last segment finished
    Ended,
}

impl Phase {
    /// Segment index this phase refers to, if any
    #[must_use]
    pub const fn index(&self) -> Option<usize> {
        match self {
            Self::Starting(i) | Self::Playing(i) | Self::Paused(i) => Some(*i),
            Self::Idle | Self::Armed | Self::Ended => None,
        }
    }
}

/// Playback state of the whole sequence.
///
/// There is exactly one per controller and only [`transition`](crate::machine::transition)
/// produces new values of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlaybackState {
    pub(crate) phase: Phase,
    pub(crate) current_index: usize,
    pub(crate) has_started: bool,
    /// Playing as last reported to the page. Stays true across a segment
    /// hand-off so the page does not see a pause flicker.
    pub(crate) is_playing: bool,
    pub(crate) segment_count: usize,
}

impl PlaybackState {
    /// Fresh state for a sequence of `segment_count` segments (at least one).
    #[must_use]
    pub const fn new(segment_count: usize) -> Self {
        Self {
            phase: Phase::Idle,
            current_index: 0,
            has_started: false,
            is_playing: false,
            segment_count: if segment_count == 0 { 1 } else { segment_count },
        }
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub const fn segment_count(&self) -> usize {
        self.segment_count
    }

    #[must_use]
    pub const fn last_index(&self) -> usize {
        self.segment_count - 1
    }

    #[must_use]
    pub const fn has_started(&self) -> bool {
        self.has_started
    }

    #[must_use]
    pub const fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// The current segment finished playing
    #[must_use]
    pub const fn is_ended(&self) -> bool {
        matches!(self.phase, Phase::Ended)
    }

    /// The final segment finished; implies `is_ended` and `current_index == last_index`
    #[must_use]
    pub const fn is_last_segment_ended(&self) -> bool {
        self.is_ended() && self.current_index == self.last_index()
    }

    /// Whether progress sampling should move the active fill
    #[must_use]
    pub const fn is_sampling(&self) -> bool {
        matches!(self.phase, Phase::Playing(_))
    }

    /// Which control the page should offer for this state
    #[must_use]
    pub const fn control(&self) -> ControlAffordance {
        if self.is_last_segment_ended() {
            ControlAffordance::Replay
        } else if self.is_playing {
            ControlAffordance::Pause
        } else {
            ControlAffordance::Play
        }
    }
}

/// The single play/pause/replay control shown under the indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlAffordance {
    Play,
    Pause,
    Replay,
}

impl ControlAffordance {
    /// Accessible label for the control
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Play => "play",
            Self::Pause => "pause",
            Self::Replay => "replay",
        }
    }
}
