mod media;
mod page;

use crate::media::SimulatedMedia;
use crate::page::Visit;
use reelsync_core::{
    CarouselConfig, CarouselEvent, CoreError, MediaHandle, SequenceController, SlideAnimation,
    Ticker,
};
use std::fs::File;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Transport length for segments that do not declare one
const FALLBACK_CLIP_LENGTH: Duration = Duration::from_secs(3);

/// How often the strip offset is sampled while a slide animates
const SLIDE_SAMPLE_PERIOD: Duration = Duration::from_millis(250);

fn main() {
    // Check config for logging.file_enabled before full config load
    let file_logging_enabled = check_file_logging_enabled();
    init_tracing(file_logging_enabled);

    let config_path = CarouselConfig::config_path();
    let config = match CarouselConfig::load_or_create(&config_path) {
        Ok(config) => config,
        Err(CoreError::ConfigNotFound { path }) => {
            info!(
                "Created a config template at {}. Edit it and run again.",
                path.display()
            );
            std::process::exit(0);
        }
        Err(CoreError::ConfigParseError(parse_error)) => {
            error!(
                "Config at {} has syntax errors: {}",
                config_path.display(),
                parse_error
            );
            std::process::exit(1);
        }
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    let cancel_token = CancellationToken::new();

    // Set up Ctrl+C handler to trigger graceful shutdown
    let ctrlc_token = cancel_token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received Ctrl+C, shutting down gracefully...");
        ctrlc_token.cancel();
    }) {
        error!("Failed to set Ctrl+C handler: {}", e);
    }

    if let Err(e) = runtime.block_on(run_carousel(config, cancel_token)) {
        error!("{e}");
        std::process::exit(1);
    }
}

async fn run_carousel(
    config: CarouselConfig,
    cancel_token: CancellationToken,
) -> Result<(), CoreError> {
    let segments = config.build_segments();
    let media: Vec<Arc<dyn MediaHandle>> = segments
        .iter()
        .map(|segment| {
            let length = segment.declared_duration().unwrap_or(FALLBACK_CLIP_LENGTH);
            Arc::new(SimulatedMedia::new(segment.media_source(), length)) as Arc<dyn MediaHandle>
        })
        .collect();

    let ticker = Ticker::new();
    let mut controller = SequenceController::new(segments, media, Arc::clone(&ticker), &config)?;

    tokio::spawn(log_carousel_events(controller.subscribe()));
    tokio::spawn(Arc::clone(&ticker).run(config.animation.frame_rate, cancel_token.clone()));

    controller.mount(Some(page::MOUNT_SAMPLE)).await;

    let page = tokio::spawn(page::run(
        controller.handle(),
        controller.subscribe(),
        Visit::default(),
        cancel_token.clone(),
    ));

    controller.run(cancel_token.clone()).await;
    cancel_token.cancel();

    if let Err(e) = page.await {
        warn!("Page script task failed: {e}");
    }
    info!("Carousel stopped");
    Ok(())
}

async fn log_carousel_events(mut rx: broadcast::Receiver<CarouselEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                match &event {
                    CarouselEvent::IndexChanged { index } => {
                        info!("Now showing segment {}", index + 1);
                    }
                    CarouselEvent::PlayStateChanged { is_playing } => {
                        info!("{}", if *is_playing { "Playing" } else { "Paused" });
                    }
                    CarouselEvent::SequenceEnded => {
                        info!("Sequence ended, replay available");
                    }
                    CarouselEvent::ControlChanged { control } => {
                        info!("Control shows {}", control.label());
                    }
                    CarouselEvent::Error { error } => {
                        warn!("Carousel degraded: {}", error);
                    }
                    CarouselEvent::Slide { animation } => {
                        tokio::spawn(trace_slide(*animation));
                    }
                    CarouselEvent::IndicatorChanged { .. } => {
                        // Frame-level detail, dumped below at debug level
                    }
                }
                debug!(
                    "{}",
                    serde_json::to_string(&event).unwrap_or_else(|e| e.to_string())
                );
            }
            Err(RecvError::Closed) => {
                info!("Carousel event channel closed");
                break;
            }
            Err(RecvError::Lagged(n)) => {
                warn!("Missed {} carousel events", n);
            }
        }
    }
}

/// Follow a slide the way a renderer would, logging the strip offset
async fn trace_slide(animation: SlideAnimation) {
    let started = tokio::time::Instant::now();
    let mut interval = tokio::time::interval(SLIDE_SAMPLE_PERIOD);
    loop {
        interval.tick().await;
        let elapsed = started.elapsed();
        debug!(
            "Strip at {:.1}% sliding to segment {}",
            animation.offset_at(elapsed),
            animation.index + 1
        );
        if animation.is_finished(elapsed) {
            break;
        }
    }
}

fn check_file_logging_enabled() -> bool {
    // Minimal structs to parse just the logging.file_enabled field
    #[derive(serde::Deserialize)]
    struct PartialConfig {
        #[serde(default)]
        logging: PartialLoggingConfig,
    }
    #[derive(serde::Deserialize, Default)]
    struct PartialLoggingConfig {
        #[serde(default)]
        file_enabled: bool,
    }

    let config_path = CarouselConfig::config_path();
    let Ok(content) = std::fs::read_to_string(&config_path) else {
        return false;
    };

    toml::from_str::<PartialConfig>(&content)
        .map(|c| c.logging.file_enabled)
        .unwrap_or(false)
}

/// Initialize tracing with console output and optional file logging
fn init_tracing(file_logging_enabled: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer();

    if file_logging_enabled {
        let log_path = reelsync_core::paths::log_file_path();

        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        match File::create(&log_path) {
            Ok(file) => {
                let file_layer = tracing_subscriber::fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt_layer)
                    .with(file_layer)
                    .init();

                return;
            }
            Err(e) => {
                eprintln!("Failed to create log file at {}: {e}", log_path.display());
            }
        }
    }

    // Fallback: console only
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
