//! Scripted page visit: scrolls the carousel into view and works the controls
//! the way a visitor would.

use reelsync_core::{CarouselEvent, ControllerHandle, ScrollSample};
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const LOG_TARGET: &str = "reelsync::sim::page";

const VIEWPORT_HEIGHT: f32 = 800.0;
const ANCHOR_START_TOP: f32 = 1600.0;
const SCROLL_STEP: f32 = 120.0;
const SCROLL_INTERVAL: Duration = Duration::from_millis(60);

/// Scroll geometry at page load: carousel two screens below the fold
pub const MOUNT_SAMPLE: ScrollSample = ScrollSample::new(ANCHOR_START_TOP, VIEWPORT_HEIGHT);

/// How the scripted visitor behaves
#[derive(Debug, Clone)]
pub struct Visit {
    pub viewport_width: f32,
    /// Width to resize to once the second segment starts, if any
    pub resize_to: Option<f32>,
    /// Pause this long during the second segment
    pub pause_for: Option<Duration>,
    /// Number of times to press replay after the sequence ends
    pub replays: u32,
}

impl Default for Visit {
    fn default() -> Self {
        Self {
            viewport_width: 1440.0,
            resize_to: Some(1000.0),
            pause_for: Some(Duration::from_millis(1500)),
            replays: 1,
        }
    }
}

/// Drive the page until the visit is over, then cancel `cancel_token`.
pub async fn run(
    handle: ControllerHandle,
    mut events: broadcast::Receiver<CarouselEvent>,
    visit: Visit,
    cancel_token: CancellationToken,
) {
    handle.viewport_resized(visit.viewport_width);

    let mut top = ANCHOR_START_TOP;
    while top > 0.0 {
        top -= SCROLL_STEP;
        if !handle.scroll(ScrollSample::new(top, VIEWPORT_HEIGHT)) {
            return;
        }
        if !wait(SCROLL_INTERVAL, &cancel_token).await {
            return;
        }
    }

    let mut paused_once = false;
    let mut replays_left = visit.replays;

    loop {
        let event = tokio::select! {
            () = cancel_token.cancelled() => return,
            event = events.recv() => event,
        };

        match event {
            Ok(CarouselEvent::IndexChanged { index: 1 }) if !paused_once => {
                paused_once = true;
                if let Some(width) = visit.resize_to {
                    info!(target: LOG_TARGET, "Resizing viewport to {}px", width);
                    handle.viewport_resized(width);
                }
                if let Some(pause) = visit.pause_for {
                    if !wait(pause / 2, &cancel_token).await {
                        return;
                    }
                    info!(target: LOG_TARGET, "Pressing pause");
                    handle.toggle_play_pause();
                    if !wait(pause, &cancel_token).await {
                        return;
                    }
                    info!(target: LOG_TARGET, "Pressing play");
                    handle.toggle_play_pause();
                }
            }
            Ok(CarouselEvent::SequenceEnded) => {
                if replays_left == 0 {
                    info!(target: LOG_TARGET, "Visit finished");
                    cancel_token.cancel();
                    return;
                }
                replays_left -= 1;
                if !wait(Duration::from_secs(1), &cancel_token).await {
                    return;
                }
                info!(target: LOG_TARGET, "Pressing replay");
                paused_once = false;
                handle.replay();
            }
            Ok(_) => {}
            Err(RecvError::Lagged(n)) => {
                warn!(target: LOG_TARGET, "Missed {} carousel events", n);
            }
            Err(RecvError::Closed) => {
                info!(target: LOG_TARGET, "Carousel event channel closed");
                return;
            }
        }
    }
}

/// Sleep unless cancelled first. Returns false when cancelled.
async fn wait(duration: Duration, cancel_token: &CancellationToken) -> bool {
    tokio::select! {
        () = cancel_token.cancelled() => false,
        () = tokio::time::sleep(duration) => true,
    }
}
