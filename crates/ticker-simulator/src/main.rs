//! Desktop simulator for the quote and headline ticker.
//!
//! Renders the ticker-core screen in an SDL2 window via
//! `embedded-graphics-simulator`, with the fetch orchestrator running on a
//! second thread against either canned endpoints or the real network.
//!
//! # Usage
//!
//! ```text
//! ticker-simulator [--live] [CONFIG.json]
//! ```
//!
//! Without `--live` every request is answered by a mock server. The optional
//! JSON document overrides any subset of the default configuration.
//!
//! # Key bindings
//!
//! | Key | Action            |
//! |-----|-------------------|
//! | R   | Full redraw       |
//! | Q   | Quit              |

mod host;
mod mock;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use clap::Parser;
use embassy_futures::block_on;
use embassy_time::Instant;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::{
    OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window, sdl2::Keycode,
};
use log::{error, info};

use ticker_core::fetch::POLL_INTERVAL;
use ticker_core::net::HttpClient;
use ticker_core::render::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX};
use ticker_core::{AppConfig, FetchOrchestrator, RenderOrchestrator, StateStore};

use host::{HostLink, ReqwestHttpClient, SystemClock};
use mock::MockHttpClient;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Pixel scale factor for the simulator window.
const WINDOW_SCALE: u32 = 2;

static STORE: StateStore = StateStore::new();

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

/// Desktop simulator for the quote and headline ticker
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Fetch from the configured endpoints instead of the built-in mock
    #[arg(long)]
    live: bool,

    /// JSON document overriding any subset of the default configuration
    config: Option<PathBuf>,
}

fn load_config(path: Option<&Path>) -> AppConfig {
    let Some(path) = path else {
        return AppConfig::default();
    };

    match std::fs::read(path) {
        Ok(bytes) => match AppConfig::from_json(&bytes) {
            Ok(config) => {
                info!("Loaded configuration from {}", path.display());
                config
            }
            Err(e) => {
                error!("{}: {}; using defaults", path.display(), e);
                AppConfig::default()
            }
        },
        Err(e) => {
            error!("Cannot read {}: {}; using defaults", path.display(), e);
            AppConfig::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Fetch thread
// ---------------------------------------------------------------------------

/// Poll the orchestrator until `quit` is raised. Each poll is driven to
/// completion on this thread.
fn run_fetch<H: HttpClient>(
    mut orchestrator: FetchOrchestrator<'_, HostLink, SystemClock, H>,
    quit: &AtomicBool,
) {
    orchestrator.start(Instant::now());
    while !quit.load(Ordering::Relaxed) {
        block_on(orchestrator.poll(Instant::now()));
        thread::sleep(Duration::from_millis(POLL_INTERVAL.as_millis()));
    }
    info!("Fetch thread exiting");
}

// ---------------------------------------------------------------------------
// Window loop
// ---------------------------------------------------------------------------

fn run_window(config: &AppConfig, clock: &SystemClock, booted_at: Instant) {
    let mut display = SimulatorDisplay::<Rgb565>::new(Size::new(
        DISPLAY_WIDTH_PX as u32,
        DISPLAY_HEIGHT_PX as u32,
    ));

    let output_settings = OutputSettingsBuilder::new().scale(WINDOW_SCALE).build();
    let mut window = Window::new("Ticker Simulator", &output_settings);

    let mut render = RenderOrchestrator::new(&STORE, config, clock, booted_at);
    let frame_duration = Duration::from_millis(config.timing.ticker_period_ms as u64);

    // The SDL window is lazily initialized on the first `update()` call.
    // We must call `update()` once before `events()` or it will panic.
    let Ok(()) = render.draw_frame(&mut display);
    window.update(&display);

    'running: loop {
        let frame_start = std::time::Instant::now();

        for event in window.events() {
            match event {
                SimulatorEvent::Quit => break 'running,
                SimulatorEvent::KeyDown { keycode, .. } => match keycode {
                    Keycode::Q | Keycode::Escape => break 'running,
                    Keycode::R => {
                        info!("Full redraw");
                        let Ok(()) = render.draw_frame(&mut display);
                    }
                    _ => {}
                },
                _ => {}
            }
        }

        if let Err(e) = render.tick(&mut display, Instant::now()) {
            error!("Draw error: {:?}", e);
        }
        window.update(&display);

        let elapsed = frame_start.elapsed();
        if elapsed < frame_duration {
            thread::sleep(frame_duration - elapsed);
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();
    let args = Args::parse();
    info!("Starting ticker simulator");
    info!(
        "Display: {}×{} (scale {}×), {} endpoints",
        DISPLAY_WIDTH_PX,
        DISPLAY_HEIGHT_PX,
        WINDOW_SCALE,
        if args.live { "live" } else { "mock" }
    );
    info!("Keys: R=Redraw  Q=Quit");

    let config = load_config(args.config.as_deref());
    let clock = SystemClock;
    let booted_at = Instant::now();
    let quit = AtomicBool::new(false);

    thread::scope(|scope| {
        scope.spawn(|| {
            if args.live {
                let timeout = Duration::from_millis(config.timing.http_timeout_ms as u64);
                let http = match ReqwestHttpClient::new(timeout) {
                    Ok(http) => http,
                    Err(e) => {
                        error!("Cannot build HTTP client: {}", e);
                        return;
                    }
                };
                let fetch = FetchOrchestrator::new(&STORE, &config, HostLink, &clock, http);
                run_fetch(fetch, &quit);
            } else {
                let http = MockHttpClient::new(&config);
                let fetch = FetchOrchestrator::new(&STORE, &config, HostLink, &clock, http);
                run_fetch(fetch, &quit);
            }
        });

        run_window(&config, &clock, booted_at);
        quit.store(true, Ordering::Relaxed);
    });

    info!("Simulator exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_default_to_mock() {
        let args = Args::try_parse_from(["ticker-simulator"]).unwrap();
        assert!(!args.live);
        assert_eq!(args.config, None);
    }

    #[test]
    fn test_args_live_with_config() {
        let args = Args::try_parse_from(["ticker-simulator", "--live", "desk.json"]).unwrap();
        assert!(args.live);
        assert_eq!(args.config, Some(PathBuf::from("desk.json")));
    }

    #[test]
    fn test_args_reject_unknown_options() {
        assert!(Args::try_parse_from(["ticker-simulator", "--lve"]).is_err());
        assert!(Args::try_parse_from(["ticker-simulator", "a.json", "b.json"]).is_err());
    }
}
