//! Clock-driven stand-in for a page video element.

use async_trait::async_trait;
use reelsync_core::{MediaEventSink, MediaHandle, PlaybackError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

const LOG_TARGET: &str = "reelsync::sim::media";

/// Time a play request takes to settle
const START_LATENCY: Duration = Duration::from_millis(15);

/// Time until the transport reports its own duration after attach
const METADATA_DELAY: Duration = Duration::from_millis(120);

#[derive(Default)]
struct Transport {
    playing: bool,
    /// Position accumulated up to the last pause
    offset: Duration,
    resumed_at: Option<Instant>,
    completed: bool,
    metadata_loaded: bool,
    sink: Option<MediaEventSink>,
    end_timer: Option<JoinHandle<()>>,
    /// Bumped on every play and pause; an end timer only finishes its own run
    run_id: u64,
}

impl Transport {
    fn position(&self, length: Duration) -> Duration {
        let running = self.resumed_at.map_or(Duration::ZERO, |t| t.elapsed());
        (self.offset + running).min(length)
    }
}

/// A media element whose clock is the tokio timer.
///
/// Plays for `length`, then fires `ended` exactly once per pass.
pub struct SimulatedMedia {
    source: String,
    length: Duration,
    inner: Arc<Mutex<Transport>>,
}

impl SimulatedMedia {
    pub fn new(source: impl Into<String>, length: Duration) -> Self {
        Self {
            source: source.into(),
            length,
            inner: Arc::default(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Transport> {
        lock(&self.inner)
    }
}

fn lock(inner: &Mutex<Transport>) -> MutexGuard<'_, Transport> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Complete the pass started by run `run_id`. A timer that woke up after a
/// pause (or a pause and another play) finds a newer run and does nothing.
fn finish_run(inner: &Mutex<Transport>, length: Duration, run_id: u64, source: &str) -> bool {
    let mut transport = lock(inner);
    if !transport.playing || transport.run_id != run_id {
        debug!(target: LOG_TARGET, "{} stale end timer ignored", source);
        return false;
    }
    transport.playing = false;
    transport.resumed_at = None;
    transport.offset = length;
    transport.completed = true;
    transport.end_timer = None;
    debug!(target: LOG_TARGET, "{} ended", source);
    if let Some(sink) = &transport.sink {
        sink.ended();
    }
    true
}

#[async_trait]
impl MediaHandle for SimulatedMedia {
    fn source(&self) -> &str {
        &self.source
    }

    async fn play(&self) -> Result<(), PlaybackError> {
        if self.length.is_zero() {
            return Err(PlaybackError::SourceUnavailable {
                reason: format!("{} has no playable frames", self.source),
            });
        }

        tokio::time::sleep(START_LATENCY).await;

        let mut transport = self.lock();
        if transport.playing {
            return Ok(());
        }
        if transport.completed {
            transport.offset = Duration::ZERO;
            transport.completed = false;
        }
        transport.playing = true;
        transport.resumed_at = Some(Instant::now());
        transport.run_id += 1;
        let run_id = transport.run_id;

        let remaining = self.length.saturating_sub(transport.offset);
        let inner = Arc::clone(&self.inner);
        let length = self.length;
        let source = self.source.clone();
        transport.end_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(remaining).await;
            finish_run(&inner, length, run_id, &source);
        }));

        debug!(target: LOG_TARGET, "{} playing from {:?}", self.source, transport.offset);
        Ok(())
    }

    async fn pause(&self) {
        let mut transport = self.lock();
        if !transport.playing {
            return;
        }
        transport.offset = transport.position(self.length);
        transport.resumed_at = None;
        transport.playing = false;
        transport.run_id += 1;
        if let Some(timer) = transport.end_timer.take() {
            timer.abort();
        }
        debug!(target: LOG_TARGET, "{} paused at {:?}", self.source, transport.offset);
    }

    fn current_time(&self) -> Duration {
        self.lock().position(self.length)
    }

    fn duration(&self) -> Option<Duration> {
        let transport = self.lock();
        transport.metadata_loaded.then_some(self.length)
    }

    fn is_playing(&self) -> bool {
        self.lock().playing
    }

    fn attach(&self, sink: MediaEventSink) {
        let mut transport = self.lock();
        if transport.metadata_loaded {
            sink.metadata_loaded(self.length);
        } else if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            let inner = Arc::clone(&self.inner);
            let length = self.length;
            runtime.spawn(async move {
                tokio::time::sleep(METADATA_DELAY).await;
                let mut transport = lock(&inner);
                transport.metadata_loaded = true;
                if let Some(sink) = &transport.sink {
                    sink.metadata_loaded(length);
                }
            });
        } else {
            transport.metadata_loaded = true;
            sink.metadata_loaded(self.length);
        }
        transport.sink = Some(sink);
    }

    fn detach(&self) {
        self.lock().sink = None;
    }
}
