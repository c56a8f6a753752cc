//! Sequence controller: drives the pure state machine against real collaborators.
//!
//! Every input (commands, scroll samples, ticks, media notifications) is
//! processed to completion, including awaiting `play()`, before the next one
//! is read. State is only ever touched from that single logical thread.

use crate::config::{AnimationConfig, CarouselConfig, IndicatorConfig};
use crate::error::{ActivationError, CarouselError, CoreError, Result};
use crate::indicator::{Breakpoint, IndicatorStrip, IndicatorView};
use crate::machine::{transition, Effect, Event, Notification};
use crate::media::{MediaEvent, MediaEventKind, MediaEventSink, MediaHandle};
use crate::playback::{ControlAffordance, Phase, PlaybackState};
use crate::sampler::{ProgressSampler, Sample};
use crate::segment::Segment;
use crate::slide::SlideAnimation;
use crate::ticker::{FrameTime, TickToken, Ticker};
use crate::trigger::{ScrollActivationTrigger, ScrollSample};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const LOG_TARGET: &str = "reelsync::controller";

/// Events emitted to the page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CarouselEvent {
    /// The active segment changed
    IndexChanged { index: usize },
    /// Playback started or stopped as far as the page is concerned
    PlayStateChanged { is_playing: bool },
    /// The last segment finished; the page may offer replay
    SequenceEnded,
    /// Animate the carousel strip
    Slide { animation: SlideAnimation },
    /// One indicator needs redrawing
    IndicatorChanged { index: usize, view: IndicatorView },
    /// The play/pause/replay control should change
    ControlChanged { control: ControlAffordance },
    /// A degraded mode was entered; never fatal
    Error { error: CarouselError },
}

/// Inputs accepted by a running controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControllerInput {
    Scroll(ScrollSample),
    ActivateIfArmed,
    TogglePlayPause,
    Replay,
    ViewportResized { width_px: f32 },
    Tick(FrameTime),
    Dispose,
}

/// Cloneable command handle for a controller running in [`SequenceController::run`].
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    tx: mpsc::UnboundedSender<ControllerInput>,
}

impl ControllerHandle {
    /// Start playback if the controller is armed; otherwise re-sync the slide
    pub fn activate_if_armed(&self) -> bool {
        self.send(ControllerInput::ActivateIfArmed)
    }

    pub fn toggle_play_pause(&self) -> bool {
        self.send(ControllerInput::TogglePlayPause)
    }

    pub fn replay(&self) -> bool {
        self.send(ControllerInput::Replay)
    }

    pub fn scroll(&self, sample: ScrollSample) -> bool {
        self.send(ControllerInput::Scroll(sample))
    }

    pub fn viewport_resized(&self, width_px: f32) -> bool {
        self.send(ControllerInput::ViewportResized { width_px })
    }

    pub fn dispose(&self) -> bool {
        self.send(ControllerInput::Dispose)
    }

    /// Returns `false` once the controller has stopped.
    pub fn send(&self, input: ControllerInput) -> bool {
        self.tx.send(input).is_ok()
    }
}

/// State machine driver for one carousel
pub struct SequenceController {
    segments: Vec<Segment>,
    media: Vec<Arc<dyn MediaHandle>>,
    ticker: Arc<Ticker>,
    tick_token: Option<TickToken>,
    trigger: ScrollActivationTrigger,
    activation_fallback: bool,
    mount_sample: Option<ScrollSample>,
    state: PlaybackState,
    indicators: IndicatorStrip,
    sampler: ProgressSampler,
    transport_durations: Vec<Option<Duration>>,
    slide_offset: f32,
    indicator_config: IndicatorConfig,
    animation_config: AnimationConfig,
    input_tx: mpsc::UnboundedSender<ControllerInput>,
    input_rx: mpsc::UnboundedReceiver<ControllerInput>,
    media_tx: mpsc::UnboundedSender<MediaEvent>,
    media_rx: mpsc::UnboundedReceiver<MediaEvent>,
    event_tx: broadcast::Sender<CarouselEvent>,
}

impl SequenceController {
    /// Create a controller with one media handle per segment, in segment order.
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` when there are no segments or the number of
    /// media handles does not match the number of segments.
    pub fn new(
        segments: Vec<Segment>,
        media: Vec<Arc<dyn MediaHandle>>,
        ticker: Arc<Ticker>,
        config: &CarouselConfig,
    ) -> Result<Self> {
        if segments.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "a carousel needs at least one segment".to_string(),
            });
        }
        if segments.len() != media.len() {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "{} segments but {} media handles",
                    segments.len(),
                    media.len()
                ),
            });
        }

        let count = segments.len();
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (media_tx, media_rx) = mpsc::unbounded_channel();
        let (event_tx, _) = broadcast::channel(256);

        Ok(Self {
            segments,
            media,
            ticker,
            tick_token: None,
            trigger: ScrollActivationTrigger::new(&config.scroll),
            activation_fallback: false,
            mount_sample: None,
            state: PlaybackState::new(count),
            indicators: IndicatorStrip::new(count),
            sampler: ProgressSampler::new(),
            transport_durations: vec![None; count],
            slide_offset: 0.0,
            indicator_config: config.indicator.clone(),
            animation_config: config.animation.clone(),
            input_tx,
            input_rx,
            media_tx,
            media_rx,
            event_tx,
        })
    }

    /// Create a controller for the segments described by `config`
    ///
    /// # Errors
    ///
    /// See [`SequenceController::new`].
    pub fn from_config(
        config: &CarouselConfig,
        media: Vec<Arc<dyn MediaHandle>>,
        ticker: Arc<Ticker>,
    ) -> Result<Self> {
        Self::new(config.build_segments(), media, ticker, config)
    }

    /// Subscribe to page events
    pub fn subscribe(&self) -> broadcast::Receiver<CarouselEvent> {
        self.event_tx.subscribe()
    }

    /// Command handle usable from other tasks
    #[must_use]
    pub fn handle(&self) -> ControllerHandle {
        ControllerHandle {
            tx: self.input_tx.clone(),
        }
    }

    #[must_use]
    pub const fn state(&self) -> &PlaybackState {
        &self.state
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.state.phase()
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    #[must_use]
    pub const fn indicators(&self) -> &IndicatorStrip {
        &self.indicators
    }

    #[must_use]
    pub fn indicator_views(&self) -> Vec<IndicatorView> {
        self.indicators.views(&self.indicator_config)
    }

    /// Target offset of the carousel strip, in percent
    #[must_use]
    pub const fn slide_offset(&self) -> f32 {
        self.slide_offset
    }

    #[must_use]
    pub fn is_tick_registered(&self) -> bool {
        self.tick_token
            .is_some_and(|token| self.ticker.is_registered(token))
    }

    /// Whether scroll activation failed and only manual activation works
    #[must_use]
    pub const fn is_activation_fallback(&self) -> bool {
        self.activation_fallback
    }

    /// Mount on the page: hook up media notifications and arm the trigger.
    ///
    /// `initial` is the scroll geometry at mount time; `None` or an anchor-less
    /// sample puts the controller in manual-activation fallback.
    pub async fn mount(&mut self, initial: Option<ScrollSample>) {
        if self.state.phase() != Phase::Idle {
            debug!(target: LOG_TARGET, "Mount ignored, already mounted");
            return;
        }
        for (index, handle) in self.media.iter().enumerate() {
            handle.attach(MediaEventSink::new(index, self.media_tx.clone()));
        }
        self.mount_sample = initial;
        self.apply(Event::Mount).await;
        info!(
            target: LOG_TARGET,
            "Carousel mounted with {} segments", self.segments.len()
        );
    }

    /// Manual activation. Starts playback when armed.
    pub async fn activate_if_armed(&mut self) {
        self.apply(Event::Activate).await;
    }

    pub async fn toggle_play_pause(&mut self) {
        self.apply(Event::TogglePlayPause).await;
    }

    /// Restart from the first segment. Only valid once the sequence ended.
    pub async fn replay(&mut self) {
        self.apply(Event::Replay).await;
    }

    /// Tear down: unregister the tick callback, detach the trigger and media
    /// notifications, and pause the active media. Safe to call repeatedly.
    pub async fn dispose(&mut self) {
        self.apply(Event::Dispose).await;
        // Idle already; clean up anything a partial mount may have left.
        self.unregister_tick();
        self.trigger.detach();
        for handle in &self.media {
            handle.detach();
        }
        self.indicators.reset();
        self.sampler.reset();
        self.slide_offset = 0.0;
        self.activation_fallback = false;
        debug!(target: LOG_TARGET, "Carousel disposed");
    }

    /// Process one input to completion
    pub async fn dispatch(&mut self, input: ControllerInput) {
        match input {
            ControllerInput::Scroll(sample) => self.on_scroll(sample).await,
            ControllerInput::ActivateIfArmed => self.activate_if_armed().await,
            ControllerInput::TogglePlayPause => self.toggle_play_pause().await,
            ControllerInput::Replay => self.replay().await,
            ControllerInput::ViewportResized { width_px } => self.on_viewport_resized(width_px),
            ControllerInput::Tick(frame) => self.on_tick(frame),
            ControllerInput::Dispose => self.dispose().await,
        }
    }

    /// Handle one media notification
    pub async fn on_media_event(&mut self, event: MediaEvent) {
        if event.index >= self.segments.len() {
            warn!(target: LOG_TARGET, "Media event for unknown segment {}", event.index);
            return;
        }
        match event.kind {
            MediaEventKind::Ended => {
                debug!(target: LOG_TARGET, "Media {} ended", event.index);
                self.apply(Event::MediaEnded(event.index)).await;
            }
            MediaEventKind::MetadataLoaded { duration } => {
                debug!(
                    target: LOG_TARGET,
                    "Media {} metadata loaded ({:?})", event.index, duration
                );
                self.transport_durations[event.index] = Some(duration).filter(|d| !d.is_zero());
            }
        }
    }

    /// Process everything already queued without waiting for more
    pub async fn drain_pending(&mut self) {
        loop {
            if let Ok(event) = self.media_rx.try_recv() {
                self.on_media_event(event).await;
            } else if let Ok(input) = self.input_rx.try_recv() {
                self.dispatch(input).await;
            } else {
                break;
            }
        }
    }

    /// Process inputs until disposed or cancelled, then tear down.
    pub async fn run(mut self, cancel_token: CancellationToken) {
        info!(target: LOG_TARGET, "Carousel controller running");

        loop {
            tokio::select! {
                () = cancel_token.cancelled() => {
                    info!(target: LOG_TARGET, "Carousel controller shutting down");
                    break;
                }
                Some(event) = self.media_rx.recv() => {
                    self.on_media_event(event).await;
                }
                Some(input) = self.input_rx.recv() => {
                    if input == ControllerInput::Dispose {
                        break;
                    }
                    self.dispatch(input).await;
                }
            }
        }

        self.dispose().await;
    }

    async fn on_scroll(&mut self, sample: ScrollSample) {
        if self.activation_fallback || !self.trigger.is_attached() {
            return;
        }
        match self.trigger.observe(sample) {
            Ok(true) => self.apply(Event::Activate).await,
            Ok(false) => {}
            // Once started the trigger only re-syncs the slide; a transient
            // bad sample (anchor gone mid re-layout) is not worth losing it for.
            Err(e) if self.state.has_started() => {
                debug!(target: LOG_TARGET, "Ignoring scroll sample: {}", e);
            }
            Err(e) => {
                self.trigger.detach();
                self.enter_activation_fallback(e);
            }
        }
    }

    fn on_viewport_resized(&mut self, width_px: f32) {
        let breakpoint = Breakpoint::from_viewport_width(width_px, &self.indicator_config);
        if self.indicators.set_breakpoint(breakpoint) {
            debug!(target: LOG_TARGET, "Breakpoint changed to {:?}", breakpoint);
            self.emit_indicator(self.indicators.current_index());
        }
    }

    fn on_tick(&mut self, _frame: FrameTime) {
        // Paused or mid hand-off: the fill stays frozen.
        if !self.state.is_sampling() {
            return;
        }
        let index = self.state.current_index();
        let handle = &self.media[index];
        let duration = self.segments[index]
            .declared_duration()
            .or(self.transport_durations[index])
            .or_else(|| handle.duration());

        match self.sampler.sample(handle.current_time(), duration) {
            Sample::Changed(percent) => {
                if self.indicators.set_fill(index, percent) {
                    self.emit_indicator(index);
                }
            }
            Sample::Unchanged => {}
            Sample::NoDuration => {
                if self.sampler.note_missing_duration() {
                    warn!(
                        target: LOG_TARGET,
                        "No duration known for segment {}, skipping progress", index
                    );
                    self.emit(CarouselEvent::Error {
                        error: CarouselError::MetadataUnavailable { index },
                    });
                }
            }
        }
    }

    /// Feed one event through the machine, executing effects in order.
    /// Effects may produce follow-up events (play settling), which are
    /// processed before returning.
    async fn apply(&mut self, event: Event) {
        let mut queue = VecDeque::from([event]);

        while let Some(event) = queue.pop_front() {
            let before = self.state;
            let (next, effects) = transition(&before, event);
            self.state = next;

            if before.phase() != next.phase() {
                debug!(
                    target: LOG_TARGET,
                    "{:?} --{:?}--> {:?}", before.phase(), event, next.phase()
                );
            }

            for effect in effects {
                if let Some(follow_up) = self.execute(effect).await {
                    queue.push_back(follow_up);
                }
            }

            if before.control() != self.state.control() {
                self.emit(CarouselEvent::ControlChanged {
                    control: self.state.control(),
                });
            }
        }
    }

    async fn execute(&mut self, effect: Effect) -> Option<Event> {
        match effect {
            Effect::AttachTrigger => return self.attach_trigger(),
            Effect::DetachTrigger => self.trigger.detach(),
            Effect::RegisterTicker => self.register_tick(),
            Effect::UnregisterTicker => self.unregister_tick(),
            Effect::Pause(index) => {
                if let Some(handle) = self.media.get(index) {
                    handle.pause().await;
                }
            }
            Effect::Play(index) => return Some(self.play(index).await),
            Effect::SlideTo(index) => {
                let animation =
                    SlideAnimation::to_index(index, self.slide_offset, &self.animation_config);
                self.slide_offset = animation.to_percent;
                self.emit(CarouselEvent::Slide { animation });
            }
            Effect::CompleteIndicator(index) => {
                self.indicators.complete(index);
                self.emit_indicator(index);
            }
            Effect::ActivateIndicator(index) => {
                self.indicators.activate(index);
                self.sampler.reset();
                self.emit_all_indicators();
            }
            Effect::FinishIndicators => {
                self.indicators.finish();
                self.emit_all_indicators();
            }
            Effect::ResetIndicators => {
                self.indicators.reset();
                self.sampler.reset();
                self.emit_all_indicators();
            }
            Effect::Notify(notification) => self.notify(notification),
        }
        None
    }

    async fn play(&mut self, index: usize) -> Event {
        // Never let two transports run at once, whatever the media did on its own.
        for (other, handle) in self.media.iter().enumerate() {
            if other != index && handle.is_playing() {
                warn!(target: LOG_TARGET, "Media {} still playing, pausing it", other);
                handle.pause().await;
            }
        }

        let Some(handle) = self.media.get(index) else {
            return Event::PlayFailed(index);
        };

        match handle.play().await {
            Ok(()) => Event::PlayStarted(index),
            Err(e) => {
                error!(target: LOG_TARGET, "Playback of segment {} failed: {}", index, e);
                self.emit(CarouselEvent::Error {
                    error: CarouselError::Playback { index, source: e },
                });
                Event::PlayFailed(index)
            }
        }
    }

    fn attach_trigger(&mut self) -> Option<Event> {
        self.activation_fallback = false;
        let result = self
            .mount_sample
            .ok_or(ActivationError::AnchorMissing)
            .and_then(|sample| self.trigger.attach(sample));

        match result {
            // Mounted with the anchor already in view.
            Ok(true) => Some(Event::Activate),
            Ok(false) => None,
            Err(e) => {
                self.enter_activation_fallback(e);
                None
            }
        }
    }

    fn enter_activation_fallback(&mut self, reason: ActivationError) {
        warn!(
            target: LOG_TARGET,
            "Scroll activation unavailable ({}), waiting for manual start", reason
        );
        self.activation_fallback = true;
        self.emit(CarouselEvent::Error {
            error: CarouselError::Activation { reason },
        });
    }

    fn register_tick(&mut self) {
        if self.tick_token.is_some() {
            return;
        }
        let tx = self.input_tx.clone();
        let token = self.ticker.register(move |frame| {
            let _ = tx.send(ControllerInput::Tick(frame));
        });
        self.tick_token = Some(token);
    }

    fn unregister_tick(&mut self) {
        if let Some(token) = self.tick_token.take() {
            self.ticker.unregister(token);
        }
    }

    fn notify(&self, notification: Notification) {
        let event = match notification {
            Notification::IndexChanged(index) => {
                info!(
                    target: LOG_TARGET,
                    "Segment {} of {}: {}",
                    index + 1,
                    self.segments.len(),
                    self.segments[index].caption()
                );
                CarouselEvent::IndexChanged { index }
            }
            Notification::PlayStateChanged(is_playing) => {
                info!(target: LOG_TARGET, "Playing: {}", is_playing);
                CarouselEvent::PlayStateChanged { is_playing }
            }
            Notification::SequenceEnded => {
                info!(target: LOG_TARGET, "Sequence ended");
                CarouselEvent::SequenceEnded
            }
        };
        self.emit(event);
    }

    fn emit_indicator(&self, index: usize) {
        if let Some(view) = self.indicators.view(index, &self.indicator_config) {
            self.emit(CarouselEvent::IndicatorChanged { index, view });
        }
    }

    fn emit_all_indicators(&self) {
        for index in 0..self.indicators.len() {
            self.emit_indicator(index);
        }
    }

    fn emit(&self, event: CarouselEvent) {
        let _ = self.event_tx.send(event);
    }
}

impl Drop for SequenceController {
    fn drop(&mut self) {
        // Pausing needs an await; the tick callback and media sinks must not outlive us.
        self.unregister_tick();
        for handle in &self.media {
            handle.detach();
        }
    }
}

impl std::fmt::Debug for SequenceController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequenceController")
            .field("state", &self.state)
            .field("segments", &self.segments.len())
            .field("tick_token", &self.tick_token)
            .field("activation_fallback", &self.activation_fallback)
            .finish_non_exhaustive()
    }
}
