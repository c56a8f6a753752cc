//! Shared per-frame callback scheduler.
//!
//! One [`Ticker`] exists per process and is shared by reference (`Arc`).
//! Registering a callback is the only way to get polled every frame;
//! unregistering is the only way to stop it. Callbacks have no timeouts.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const LOG_TARGET: &str = "reelsync::ticker";

/// Timing information passed to every callback on a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTime {
    /// Monotonic frame counter
    pub frame: u64,
    /// Time since the ticker started
    pub elapsed: Duration,
}

/// Registration handle returned by [`Ticker::register`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TickToken(u64);

type TickCallback = Arc<dyn Fn(FrameTime) + Send + Sync>;

/// Per-frame scheduler
pub struct Ticker {
    callbacks: Mutex<BTreeMap<TickToken, TickCallback>>,
    next_token: AtomicU64,
    frame: AtomicU64,
}

impl Ticker {
    /// Create a new shared ticker
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a callback to run every frame
    pub fn register<F>(&self, callback: F) -> TickToken
    where
        F: Fn(FrameTime) + Send + Sync + 'static,
    {
        let token = TickToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        self.lock().insert(token, Arc::new(callback));
        debug!(target: LOG_TARGET, "Registered tick callback {:?}", token);
        token
    }

    /// Remove a callback. Unknown or already removed tokens are ignored.
    ///
    /// Returns whether a callback was removed.
    pub fn unregister(&self, token: TickToken) -> bool {
        let removed = self.lock().remove(&token).is_some();
        if removed {
            debug!(target: LOG_TARGET, "Unregistered tick callback {:?}", token);
        }
        removed
    }

    #[must_use]
    pub fn is_registered(&self, token: TickToken) -> bool {
        self.lock().contains_key(&token)
    }

    /// Number of live callbacks
    #[must_use]
    pub fn callback_count(&self) -> usize {
        self.lock().len()
    }

    /// Run every registered callback once.
    ///
    /// The callback table is snapshotted first, so callbacks may register or
    /// unregister (themselves included) without deadlocking.
    pub fn tick(&self, elapsed: Duration) {
        let frame = self.frame.fetch_add(1, Ordering::Relaxed);
        let snapshot: Vec<TickCallback> = self.lock().values().cloned().collect();
        let time = FrameTime { frame, elapsed };
        for callback in snapshot {
            callback(time);
        }
    }

    /// Drive the ticker at `frame_rate` frames per second until cancelled
    pub async fn run(self: Arc<Self>, frame_rate: u32, cancel_token: CancellationToken) {
        let period = Duration::from_secs(1) / frame_rate.max(1);
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let started = Instant::now();

        info!(target: LOG_TARGET, "Ticker running at {} fps", frame_rate.max(1));

        loop {
            tokio::select! {
                () = cancel_token.cancelled() => {
                    info!(target: LOG_TARGET, "Ticker shutting down");
                    break;
                }
                _ = interval.tick() => {
                    self.tick(started.elapsed());
                }
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<TickToken, TickCallback>> {
        self.callbacks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Ticker {
    fn default() -> Self {
        Self {
            callbacks: Mutex::new(BTreeMap::new()),
            next_token: AtomicU64::new(0),
            frame: AtomicU64::new(0),
        }
    }
}

impl std::fmt::Debug for Ticker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ticker")
            .field("callbacks", &self.callback_count())
            .field("frame", &self.frame.load(Ordering::Relaxed))
            .finish()
    }
}
