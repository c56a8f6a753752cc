//! Pure transition function of the sequence state machine.
//!
//! `transition` takes the current [`PlaybackState`] and one [`Event`] and
//! returns the next state plus the ordered list of [`Effect`]s the driver has
//! to execute. Nothing in here touches media, timers or the page.

use crate::playback::{Phase, PlaybackState};

/// Inputs to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Controller mounted on the page
    Mount,
    /// Scroll trigger fired, or the page requested a manual start
    Activate,
    /// Media of segment `i` finished a playback pass
    MediaEnded(usize),
    /// play() on segment `i` settled successfully
    PlayStarted(usize),
    /// play() on segment `i` was rejected
    PlayFailed(usize),
    TogglePlayPause,
    Replay,
    /// Controller unmounted
    Dispose,
}

/// Page-facing notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    IndexChanged(usize),
    PlayStateChanged(bool),
    SequenceEnded,
}

/// Side effects requested by a transition, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    AttachTrigger,
    DetachTrigger,
    RegisterTicker,
    UnregisterTicker,
    Pause(usize),
    Play(usize),
    /// Animate the carousel strip to `-100% * index`
    SlideTo(usize),
    /// Snap the indicator of a finished segment to its completed look
    CompleteIndicator(usize),
    /// Make the indicator the active one with an empty fill
    ActivateIndicator(usize),
    /// Every indicator to its completed look once the sequence ended
    FinishIndicators,
    /// Return every indicator to idle
    ResetIndicators,
    Notify(Notification),
}

/// Compute the next state and the effects for `event`.
///
/// Events that make no sense in the current phase (stale `ended` events,
/// `replay` before the end, toggles while ended) are no-ops: the state is
/// returned unchanged with no effects.
#[must_use]
pub fn transition(state: &PlaybackState, event: Event) -> (PlaybackState, Vec<Effect>) {
    let mut next = *state;
    let mut effects = Vec::new();

    match (state.phase, event) {
        (Phase::Idle, Event::Mount) => {
            next = PlaybackState::new(state.segment_count);
            next.phase = Phase::Armed;
            effects.push(Effect::AttachTrigger);
        }

        (Phase::Armed, Event::Activate) => {
            next.phase = Phase::Starting(0);
            next.current_index = 0;
            next.has_started = true;
            effects.extend([
                Effect::ActivateIndicator(0),
                Effect::SlideTo(0),
                Effect::Notify(Notification::IndexChanged(0)),
                Effect::RegisterTicker,
                Effect::Play(0),
            ]);
        }

        // Re-activation after start only re-aligns the strip.
        (_, Event::Activate) if state.has_started => {
            effects.push(Effect::SlideTo(state.current_index));
        }

        (Phase::Playing(i), Event::MediaEnded(ended)) if i == ended => {
            if i < state.last_index() {
                let incoming = i + 1;
                next.phase = Phase::Starting(incoming);
                next.current_index = incoming;
                effects.extend([
                    Effect::Pause(i),
                    Effect::CompleteIndicator(i),
                    Effect::ActivateIndicator(incoming),
                    Effect::SlideTo(incoming),
                    Effect::Notify(Notification::IndexChanged(incoming)),
                    Effect::Play(incoming),
                ]);
            } else {
                next.phase = Phase::Ended;
                next.is_playing = false;
                effects.extend([
                    Effect::UnregisterTicker,
                    Effect::FinishIndicators,
                    Effect::Notify(Notification::PlayStateChanged(false)),
                    Effect::Notify(Notification::SequenceEnded),
                ]);
            }
        }

        // An end that was already queued when the user paused still counts;
        // the sequence advances but stays paused.
        (Phase::Paused(i), Event::MediaEnded(ended)) if i == ended => {
            if i < state.last_index() {
                let incoming = i + 1;
                next.phase = Phase::Paused(incoming);
                next.current_index = incoming;
                effects.extend([
                    Effect::CompleteIndicator(i),
                    Effect::ActivateIndicator(incoming),
                    Effect::SlideTo(incoming),
                    Effect::Notify(Notification::IndexChanged(incoming)),
                ]);
            } else {
                next.phase = Phase::Ended;
                effects.extend([
                    Effect::UnregisterTicker,
                    Effect::FinishIndicators,
                    Effect::Notify(Notification::SequenceEnded),
                ]);
            }
        }

        (Phase::Starting(i), Event::PlayStarted(started)) if i == started => {
            next.phase = Phase::Playing(i);
            next.is_playing = true;
            if !state.is_playing {
                effects.push(Effect::Notify(Notification::PlayStateChanged(true)));
            }
        }

        // A play that settles after the user already paused must not keep running.
        (Phase::Paused(i), Event::PlayStarted(started)) if i == started => {
            effects.push(Effect::Pause(i));
        }

        (Phase::Starting(i), Event::PlayFailed(failed)) if i == failed => {
            next.phase = Phase::Paused(i);
            next.is_playing = false;
            effects.push(Effect::Pause(i));
            if state.is_playing {
                effects.push(Effect::Notify(Notification::PlayStateChanged(false)));
            }
        }

        (Phase::Playing(i) | Phase::Starting(i), Event::TogglePlayPause) => {
            next.phase = Phase::Paused(i);
            next.is_playing = false;
            effects.push(Effect::Pause(i));
            if state.is_playing {
                effects.push(Effect::Notify(Notification::PlayStateChanged(false)));
            }
        }

        (Phase::Paused(i), Event::TogglePlayPause) => {
            next.phase = Phase::Starting(i);
            effects.push(Effect::Play(i));
        }

        (Phase::Ended, Event::Replay) => {
            let outgoing = state.current_index;
            next.phase = Phase::Starting(0);
            next.current_index = 0;
            effects.extend([
                Effect::Pause(outgoing),
                Effect::ResetIndicators,
                Effect::ActivateIndicator(0),
                Effect::SlideTo(0),
                Effect::Notify(Notification::IndexChanged(0)),
                Effect::RegisterTicker,
                Effect::Play(0),
            ]);
        }

        (Phase::Idle, Event::Dispose) => {}

        (phase, Event::Dispose) => {
            next = PlaybackState::new(state.segment_count);
            effects.push(Effect::UnregisterTicker);
            effects.push(Effect::DetachTrigger);
            if let Some(i) = phase.index() {
                effects.push(Effect::Pause(i));
            }
            if state.is_playing {
                effects.push(Effect::Notify(Notification::PlayStateChanged(false)));
            }
        }

        _ => {}
    }

    (next, effects)
}
