//! Render orchestrator (consumer task)
//!
//! Reads snapshots from the [`StateStore`] and draws them. Two cadences run
//! off one loop: a slow status tick for the text fields and the price panel,
//! and a fast ticker tick that scrolls the headline lines. Nothing here
//! touches the network; the only inputs are the store and the local clock.
//!
//! Status fields are redrawn only when their text or colour differs from
//! what was last drawn ([`DrawCache`]). Ticker lines are rendered into
//! per-line offscreen canvases and only changed pixels reach the display.

pub mod canvas;
pub mod color;
pub mod draw_cache;
pub mod layout;
pub mod status;
pub mod theme;
pub mod ticker;

#[cfg(test)]
pub(crate) mod test_display;

pub use canvas::Canvas;
pub use color::{PRICE_CHANGE_SATURATION, change_color};
pub use draw_cache::DrawCache;
pub use layout::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX, StatusField};
pub use ticker::{SCROLL_STEP_PX, TickerLine, TickerStrip};

use core::fmt::{Debug, Write};

use embassy_time::{Instant, Ticker};
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyleBuilder, StrokeAlignment};
use embedded_graphics::text::{Baseline, Text, TextStyleBuilder};
use log::{info, warn};

use crate::app_state::StateStore;
use crate::clock::ClockReading;
use crate::config::AppConfig;
use crate::link::TimeSync;
use layout::{PANEL, PANEL_BORDER_PX};
use status::{DATE_UNKNOWN, FieldText, change_text, link_text, price_text};
use theme::{
    COLOR_ACCENT, COLOR_BACKGROUND, COLOR_FOREGROUND, COLOR_PENDING, GRAY, LIGHT_GRAY, WHITE,
};

pub struct RenderOrchestrator<'a, T> {
    store: &'a StateStore,
    config: &'a AppConfig,
    clock: &'a T,
    booted_at: Instant,
    cache: DrawCache,
    ticker: TickerStrip,
    next_status: Instant,
}

impl<'a, T: TimeSync> RenderOrchestrator<'a, T> {
    /// `booted_at` is the instant uptime is counted from.
    pub fn new(
        store: &'a StateStore,
        config: &'a AppConfig,
        clock: &'a T,
        booted_at: Instant,
    ) -> Self {
        Self {
            store,
            config,
            clock,
            booted_at,
            cache: DrawCache::new(),
            ticker: TickerStrip::new(),
            next_status: booted_at,
        }
    }

    pub fn ticker(&self) -> &TickerStrip {
        &self.ticker
    }

    /// Clear the screen, draw the static frame and forget what was drawn.
    pub fn draw_frame<D>(&mut self, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        display.clear(COLOR_BACKGROUND)?;
        display.fill_solid(&PANEL, COLOR_FOREGROUND)?;
        self.cache.invalidate();
        self.ticker.invalidate();
        Ok(())
    }

    /// Redraw whichever status fields changed. Returns how many were drawn.
    pub fn status_tick<D>(&mut self, display: &mut D, now: Instant) -> Result<usize, D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let link = self.store.snapshot_link();
        let price = self.store.snapshot_price();
        let uptime = now.saturating_duration_since(self.booted_at).as_secs();
        let reading = ClockReading::new(
            self.clock.epoch_secs(),
            uptime,
            self.config.utc_offset_secs,
        );

        let mut clock = FieldText::new();
        write!(clock, "{reading}").ok();
        let mut date = FieldText::new();
        match reading {
            ClockReading::Local(time) => write!(date, "{}", time.date()).ok(),
            ClockReading::Uptime(_) => date.push_str(DATE_UNKNOWN).ok(),
        };
        let mode_color = if reading.is_local() { COLOR_ACCENT } else { COLOR_PENDING };
        let (connectivity, link_color) = link_text(&link);
        let (change, change_text_color) = change_text(&price);
        let price_label = price_text(&price);
        let price_color = if price.is_fetched() { WHITE } else { GRAY };

        let fields: [(StatusField, &str, Rgb565); 8] = [
            (StatusField::Link, &connectivity, link_color),
            (StatusField::Phase, link.phase.label(), LIGHT_GRAY),
            (StatusField::Clock, &clock, WHITE),
            (StatusField::ClockMode, reading.mode_label(), mode_color),
            (StatusField::Date, &date, LIGHT_GRAY),
            (StatusField::PriceLabel, &self.config.price.label, LIGHT_GRAY),
            (StatusField::Change, &change, change_text_color),
            (StatusField::Price, &price_label, price_color),
        ];

        let mut drawn = 0;
        for (field, text, color) in fields {
            if draw_field(&mut self.cache, display, field, text, color)? {
                drawn += 1;
            }
        }

        let border = change_color(&price);
        if self.cache.needs_redraw(StatusField::PanelBorder, "", border) {
            let style = PrimitiveStyleBuilder::new()
                .stroke_color(border)
                .stroke_width(PANEL_BORDER_PX)
                .stroke_alignment(StrokeAlignment::Inside)
                .build();
            PANEL.into_styled(style).draw(display)?;
            self.cache.store(StatusField::PanelBorder, "", border);
            drawn += 1;
        }

        Ok(drawn)
    }

    /// Rebuild the ticker if the feed moved on, then scroll it one step.
    pub fn ticker_tick<D>(&mut self, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        if self.ticker.is_stale(self.store.feed_revision()) {
            let snapshot = self.store.snapshot_feed();
            self.ticker.rebuild(&snapshot, self.config);
        }
        self.ticker.tick(display)
    }

    /// One frame: the status tick when it is due, and always a ticker tick.
    pub fn tick<D>(&mut self, display: &mut D, now: Instant) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        if now >= self.next_status {
            self.next_status = now + self.config.timing.status_period();
            self.status_tick(display, now)?;
        }
        self.ticker_tick(display)
    }

    /// Drive the display forever at the ticker rate.
    ///
    /// Display errors are logged and the next frame is attempted anyway.
    pub async fn run<D>(&mut self, display: &mut D) -> !
    where
        D: DrawTarget<Color = Rgb565>,
        D::Error: Debug,
    {
        info!("Render task started");
        if let Err(e) = self.draw_frame(display) {
            warn!("Initial frame draw failed: {:?}", e);
        }

        let mut frames = Ticker::every(self.config.timing.ticker_period());
        loop {
            if let Err(e) = self.tick(display, Instant::now()) {
                warn!("Display error: {:?}", e);
            }
            frames.next().await;
        }
    }
}

/// Clear `field` and draw `text` into it unless the cache says it is current.
fn draw_field<D>(
    cache: &mut DrawCache,
    display: &mut D,
    field: StatusField,
    text: &str,
    color: Rgb565,
) -> Result<bool, D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    if !cache.needs_redraw(field, text, color) {
        return Ok(false);
    }

    display.fill_solid(&field.region(), field.background())?;
    let character_style = MonoTextStyle::new(field.font(), color);
    let text_style = TextStyleBuilder::new()
        .alignment(field.alignment())
        .baseline(Baseline::Top)
        .build();
    Text::with_text_style(text, field.anchor(), character_style, text_style).draw(display)?;

    cache.store(field, text, color);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_state::{FetchPhase, LinkStatus};
    use crate::config::Category;
    use core::cell::Cell;
    use embassy_time::Duration;
    use test_display::RecordingDisplay;

    struct FixedClock(Cell<Option<u64>>);

    impl TimeSync for FixedClock {
        fn start_sync(&self) {}

        fn epoch_secs(&self) -> Option<u64> {
            self.0.get()
        }
    }

    const T0: u64 = 1_000;

    fn at_ms(ms: u64) -> Instant {
        Instant::from_millis(T0 * 1000 + ms)
    }

    #[test]
    fn test_unchanged_status_is_not_redrawn() {
        let store = StateStore::new();
        let config = AppConfig::default();
        let clock = FixedClock(Cell::new(Some(1_760_000_000)));
        let mut render = RenderOrchestrator::new(&store, &config, &clock, at_ms(0));
        let mut display = RecordingDisplay::new();

        render.draw_frame(&mut display).unwrap();
        assert_eq!(render.status_tick(&mut display, at_ms(0)), Ok(StatusField::COUNT));

        display.reset();
        assert_eq!(render.status_tick(&mut display, at_ms(250)), Ok(0));
        assert_eq!(display.pixels_written, 0);
    }

    #[test]
    fn test_price_updates_redraw_only_price_fields() {
        let store = StateStore::new();
        let config = AppConfig::default();
        let clock = FixedClock(Cell::new(Some(1_760_000_000)));
        let mut render = RenderOrchestrator::new(&store, &config, &clock, at_ms(0));
        let mut display = RecordingDisplay::new();
        render.status_tick(&mut display, at_ms(0)).unwrap();

        // price text and change text; the border stays neutral on a first quote
        store.publish_price(6_000_000.0);
        assert_eq!(render.status_tick(&mut display, at_ms(250)), Ok(2));

        // a +0.50 % move changes price, change and the border colour
        store.publish_price(6_030_000.0);
        assert_eq!(render.status_tick(&mut display, at_ms(500)), Ok(3));
        assert_eq!(change_color(&store.snapshot_price()), theme::COLOR_RISE);
    }

    #[test]
    fn test_uptime_clock_ticks_without_sync() {
        let store = StateStore::new();
        let config = AppConfig::default();
        let clock = FixedClock(Cell::new(None));
        let mut render = RenderOrchestrator::new(&store, &config, &clock, at_ms(0));
        let mut display = RecordingDisplay::new();
        render.status_tick(&mut display, at_ms(0)).unwrap();

        // only the uptime clock moves
        assert_eq!(render.status_tick(&mut display, at_ms(1_000)), Ok(1));

        // syncing swaps clock, mode and date
        clock.0.set(Some(1_760_000_000));
        assert_eq!(render.status_tick(&mut display, at_ms(1_250)), Ok(3));
    }

    #[test]
    fn test_link_changes_are_picked_up() {
        let store = StateStore::new();
        let config = AppConfig::default();
        let clock = FixedClock(Cell::new(Some(1_760_000_000)));
        let mut render = RenderOrchestrator::new(&store, &config, &clock, at_ms(0));
        let mut display = RecordingDisplay::new();
        render.status_tick(&mut display, at_ms(0)).unwrap();

        store.publish_link(LinkStatus {
            phase: FetchPhase::Offline,
            connected: false,
            rssi: None,
            time_valid: true,
        });
        assert_eq!(render.status_tick(&mut display, at_ms(250)), Ok(2));
    }

    #[test]
    fn test_ticker_follows_feed_revision() {
        let store = StateStore::new();
        let config = AppConfig::default();
        let clock = FixedClock(Cell::new(None));
        let mut render = RenderOrchestrator::new(&store, &config, &clock, at_ms(0));
        let mut display = RecordingDisplay::new();

        render.ticker_tick(&mut display).unwrap();
        assert_eq!(render.ticker().line(1).text(), "(pending)");
        for _ in 0..20 {
            render.ticker_tick(&mut display).unwrap();
        }
        let scrolled = render.ticker().line(1).offset();
        assert_eq!(scrolled, DISPLAY_WIDTH_PX as i32 - 21 * SCROLL_STEP_PX);

        store.publish_feed(Category::Headlines, "Fresh news");
        render.ticker_tick(&mut display).unwrap();
        assert_eq!(render.ticker().line(1).offset(), scrolled - SCROLL_STEP_PX);

        store.commit_feed_cycle();
        render.ticker_tick(&mut display).unwrap();
        let line = render.ticker().line(1);
        assert_eq!(line.text(), "Fresh news");
        assert_eq!(line.offset(), DISPLAY_WIDTH_PX as i32 - SCROLL_STEP_PX);
    }

    #[test]
    fn test_status_runs_on_its_own_period() {
        let store = StateStore::new();
        let config = AppConfig::default();
        let clock = FixedClock(Cell::new(Some(1_760_000_000)));
        let mut render = RenderOrchestrator::new(&store, &config, &clock, at_ms(0));
        let mut display = RecordingDisplay::new();

        render.tick(&mut display, at_ms(0)).unwrap();
        store.publish_price(42.0);

        // before the status period elapses only the ticker runs
        display.reset();
        render.tick(&mut display, at_ms(100)).unwrap();
        assert_eq!(display.solid_fills, 0);

        let period = config.timing.status_period();
        let due = at_ms(0) + period + Duration::from_millis(1);
        render.tick(&mut display, due).unwrap();
        assert!(display.solid_fills > 0);
    }
}
