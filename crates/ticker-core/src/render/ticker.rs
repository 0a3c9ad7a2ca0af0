//! Horizontally scrolling headline lines

use alloc::string::String;

use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::text::renderer::TextRenderer;
use embedded_graphics::text::{Baseline, Text};
use log::debug;

use super::canvas::Canvas;
use super::layout::{DISPLAY_WIDTH_PX, TICKER_FONT, TICKER_LINE_HEIGHT_PX, ticker_origin};
use super::theme::{COLOR_BACKGROUND, WHITE, category_color};
use crate::app_state::FeedSnapshot;
use crate::config::{AppConfig, CATEGORY_COUNT, Category};
use crate::feed::TITLE_DELIMITER;

/// Pixels a line moves left per ticker tick.
pub const SCROLL_STEP_PX: i32 = 2;

/// One digest line plus one line per category.
pub const TICKER_LINES: usize = CATEGORY_COUNT + 1;

/// What a ticker line shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSource {
    /// First headline of every category, labelled.
    Digest,
    Category(Category),
}

impl LineSource {
    pub const ALL: [LineSource; TICKER_LINES] = [
        Self::Digest,
        Self::Category(Category::Headlines),
        Self::Category(Category::Business),
        Self::Category(Category::Technology),
    ];

    pub fn color(self) -> Rgb565 {
        match self {
            Self::Digest => WHITE,
            Self::Category(category) => category_color(category),
        }
    }

    pub fn text(self, snapshot: &FeedSnapshot, config: &AppConfig) -> String {
        match self {
            Self::Category(category) => String::from(snapshot.text(category)),
            Self::Digest => {
                let mut text = String::new();
                for category in Category::ALL {
                    if !text.is_empty() {
                        text.push_str(TITLE_DELIMITER);
                    }
                    let first = snapshot
                        .text(category)
                        .split(TITLE_DELIMITER)
                        .next()
                        .unwrap_or_default();
                    text.push_str(&config.feed(category).label);
                    text.push_str(": ");
                    text.push_str(first);
                }
                text
            }
        }
    }
}

/// Scroll state of one line.
#[derive(Debug, Clone)]
pub struct TickerLine {
    text: String,
    /// X position of the text's left edge; negative once it has scrolled in.
    offset: i32,
    /// Rendered width of `text` in pixels.
    width: i32,
    color: Rgb565,
    /// Feed revision the text was built from; `None` before the first build.
    built_from: Option<u32>,
}

impl TickerLine {
    pub fn new(color: Rgb565) -> Self {
        Self {
            text: String::new(),
            offset: DISPLAY_WIDTH_PX as i32,
            width: 0,
            color,
            built_from: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn offset(&self) -> i32 {
        self.offset
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn is_stale(&self, revision: u32) -> bool {
        self.built_from != Some(revision)
    }

    /// Replace the text and restart it from the right edge.
    pub fn rebuild(
        &mut self,
        text: String,
        revision: u32,
        font: &MonoFont<'_>,
        view_width: i32,
    ) {
        let style = MonoTextStyle::new(font, self.color);
        self.width = style
            .measure_string(&text, Point::zero(), Baseline::Top)
            .next_position
            .x;
        self.text = text;
        self.offset = view_width;
        self.built_from = Some(revision);
    }

    /// Move one step left, wrapping to the right edge once the whole text
    /// has left the screen.
    pub fn advance(&mut self, view_width: i32) {
        self.offset -= SCROLL_STEP_PX;
        if self.offset < -self.width {
            self.offset = view_width;
        }
    }

    /// The part of the text that can touch `0..view_width`, and the x
    /// position to draw it at.
    ///
    /// Mono fonts give every character the same advance, so characters wholly
    /// off either edge are skipped instead of being rasterised and clipped.
    pub fn visible_slice(&self, font: &MonoFont<'_>, view_width: i32) -> (i32, &str) {
        let advance = (font.character_size.width + font.character_spacing).max(1) as i32;

        let skip = if self.offset < 0 {
            (-self.offset / advance) as usize
        } else {
            0
        };
        let x = self.offset + skip as i32 * advance;
        let take = (((view_width - x).max(0) + advance - 1) / advance) as usize;

        let start = char_boundary_at_or_before(&self.text, skip);
        let end = char_boundary_at_or_before(&self.text, skip.saturating_add(take));
        (x, &self.text[start..end])
    }
}

/// Byte index of the `n`th character, or the text length. Ticker text is
/// ASCII, so this is normally just `n`.
fn char_boundary_at_or_before(text: &str, n: usize) -> usize {
    if text.is_ascii() {
        return n.min(text.len());
    }
    text.char_indices().nth(n).map_or(text.len(), |(i, _)| i)
}

/// All ticker lines, each with its own offscreen canvas.
pub struct TickerStrip {
    sources: [LineSource; TICKER_LINES],
    lines: [TickerLine; TICKER_LINES],
    canvases: [Canvas; TICKER_LINES],
}

impl Default for TickerStrip {
    fn default() -> Self {
        Self::new()
    }
}

impl TickerStrip {
    pub fn new() -> Self {
        let size = Size::new(DISPLAY_WIDTH_PX as u32, TICKER_LINE_HEIGHT_PX);
        Self {
            sources: LineSource::ALL,
            lines: LineSource::ALL.map(|source| TickerLine::new(source.color())),
            canvases: core::array::from_fn(|_| Canvas::new(size, COLOR_BACKGROUND)),
        }
    }

    pub fn line(&self, index: usize) -> &TickerLine {
        &self.lines[index]
    }

    pub fn is_stale(&self, revision: u32) -> bool {
        self.lines.iter().any(|line| line.is_stale(revision))
    }

    /// Rebuild every line from `snapshot`.
    pub fn rebuild(&mut self, snapshot: &FeedSnapshot, config: &AppConfig) {
        debug!("Rebuilding ticker from feed revision {}", snapshot.revision);
        for (source, line) in self.sources.iter().zip(self.lines.iter_mut()) {
            let text = source.text(snapshot, config);
            line.rebuild(text, snapshot.revision, TICKER_FONT, DISPLAY_WIDTH_PX as i32);
        }
    }

    /// Force the next tick to push every canvas in full.
    pub fn invalidate(&mut self) {
        for canvas in &mut self.canvases {
            canvas.mark_all_dirty();
        }
    }

    /// Draw each line at its current offset, push what changed, then scroll.
    pub fn tick<D>(&mut self, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let view_width = DISPLAY_WIDTH_PX as i32;

        let rows = self.lines.iter_mut().zip(&mut self.canvases);
        for (index, (line, canvas)) in rows.enumerate() {
            let Ok(()) = canvas.clear(COLOR_BACKGROUND);
            let (x, visible) = line.visible_slice(TICKER_FONT, view_width);
            let style = MonoTextStyle::new(TICKER_FONT, line.color);
            let Ok(_) = Text::with_baseline(visible, Point::new(x, 0), style, Baseline::Top)
                .draw(canvas);

            canvas.flush_at(display, ticker_origin(index))?;
            line.advance(view_width);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::test_display::RecordingDisplay;
    use embedded_graphics::mono_font::ascii::FONT_6X10;

    fn line_with_width(width: i32) -> TickerLine {
        let mut line = TickerLine::new(WHITE);
        line.width = width;
        line
    }

    #[test]
    fn test_wraps_only_when_past_negative_width() {
        let mut line = line_with_width(100);
        line.offset = -98;

        line.advance(320);
        assert_eq!(line.offset(), -100);

        line.advance(320);
        assert_eq!(line.offset(), 320);
    }

    #[test]
    fn test_full_scroll_cycle_length() {
        let mut line = line_with_width(40);
        let mut ticks = 0;
        loop {
            line.advance(320);
            ticks += 1;
            if line.offset() == 320 {
                break;
            }
        }
        // 320 -> -42 in steps of two
        assert_eq!(ticks, 181);
    }

    #[test]
    fn test_rebuild_measures_and_restarts() {
        let mut line = TickerLine::new(WHITE);
        assert!(line.is_stale(0));

        line.rebuild(String::from("Hello"), 3, &FONT_6X10, 320);
        assert_eq!(line.width(), 30);
        assert_eq!(line.offset(), 320);
        assert!(!line.is_stale(3));
        assert!(line.is_stale(4));
    }

    #[test]
    fn test_visible_slice_skips_offscreen_characters() {
        let mut line = TickerLine::new(WHITE);
        line.rebuild("abcdefghijklmnopqrstuvwxyz".repeat(4), 1, &FONT_6X10, 60);

        // fully off the right edge: nothing visible yet
        let (x, visible) = line.visible_slice(&FONT_6X10, 60);
        assert_eq!(x, 60);
        assert_eq!(visible, "");

        line.offset = -20;
        let (x, visible) = line.visible_slice(&FONT_6X10, 60);
        // three characters scrolled off, one partially visible at x = -2
        assert_eq!(x, -2);
        assert!(visible.starts_with('d'));
        assert_eq!(visible.len(), 11);
    }

    #[test]
    fn test_digest_takes_first_title_of_each_category() {
        let config = AppConfig::default();
        let mut snapshot = FeedSnapshot::new();
        snapshot.set_text(Category::Headlines, "Rates hold  |  Storm warning");
        snapshot.set_text(Category::Technology, "New chip");

        let digest = LineSource::Digest.text(&snapshot, &config);
        assert_eq!(
            digest,
            "Headlines: Rates hold  |  Business: (pending)  |  Technology: New chip"
        );
        assert_eq!(
            LineSource::Category(Category::Headlines).text(&snapshot, &config),
            "Rates hold  |  Storm warning"
        );
    }

    #[test]
    fn test_tick_pushes_each_line_to_its_row() {
        let mut strip = TickerStrip::new();
        let mut snapshot = FeedSnapshot::new();
        for category in Category::ALL {
            snapshot.set_text(category, "x");
        }
        snapshot.commit();
        strip.rebuild(&snapshot, &AppConfig::default());

        // Text starts at the right edge; scroll it into view first
        for _ in 0..10 {
            let mut display = RecordingDisplay::new();
            strip.tick(&mut display).unwrap();
        }

        let mut display = RecordingDisplay::new();
        strip.tick(&mut display).unwrap();
        assert_eq!(display.contiguous.len(), TICKER_LINES);
        for (index, area) in display.contiguous.iter().enumerate() {
            assert!(area.top_left.y >= ticker_origin(index).y);
            assert!(area.top_left.y < ticker_origin(index).y + TICKER_LINE_HEIGHT_PX as i32);
        }
        assert!(!strip.is_stale(1));
    }
}
