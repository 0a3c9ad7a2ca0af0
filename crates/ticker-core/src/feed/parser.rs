use alloc::string::String;
use core::ops::ControlFlow;

use log::debug;

use super::ParseError;
use super::matcher::TagMatcher;
use super::sanitize::{normalize_title, sanitize_non_ascii};
use crate::net::BodySink;

/// Hard cap on captured bytes per title. Bytes past the cap are dropped.
pub const TITLE_MAX: usize = 220;

/// Number of titles extracted per feed before parsing stops.
pub const MAX_TITLES: usize = 5;

/// Separator placed between titles in the joined output.
pub const TITLE_DELIMITER: &str = "  |  ";

/// The four literal tags the parser looks for.
#[derive(Debug, Clone, Copy)]
pub struct TagSet {
    pub container_open: &'static [u8],
    pub container_close: &'static [u8],
    pub field_open: &'static [u8],
    /// Must start with `<`; capture suspends on that byte.
    pub field_close: &'static [u8],
}

impl TagSet {
    /// RSS 2.0: `<item>` elements carrying a `<title>`.
    ///
    /// The container opener has no closing `>` so items with attributes match.
    pub const RSS: Self = Self {
        container_open: b"<item",
        container_close: b"</item>",
        field_open: b"<title>",
        field_close: b"</title>",
    };
}

impl Default for TagSet {
    fn default() -> Self {
        Self::RSS
    }
}

/// Streaming extractor for titles nested inside container elements.
///
/// Bytes may arrive in chunks of any size, including one tag split across
/// several chunks; the result only depends on the concatenated stream.
/// Memory use is bounded by [`TITLE_MAX`] plus the joined output.
///
/// ```rust,ignore
/// let mut parser = FeedParser::new(TagSet::RSS, MAX_TITLES);
/// for chunk in body_chunks {
///     if parser.push(chunk).is_break() {
///         break;
///     }
/// }
/// let joined = parser.finish()?;
/// ```
pub struct FeedParser {
    container_open: TagMatcher,
    container_close: TagMatcher,
    field_open: TagMatcher,
    field_close: &'static [u8],
    in_container: bool,
    capturing: bool,
    /// Bytes of `field_close` matched since capture was suspended on `<`.
    candidate: usize,
    capture: heapless::Vec<u8, TITLE_MAX>,
    output: String,
    count: usize,
    max_titles: usize,
}

impl FeedParser {
    pub fn new(tags: TagSet, max_titles: usize) -> Self {
        debug_assert_eq!(tags.field_close.first(), Some(&b'<'));

        Self {
            container_open: TagMatcher::new(tags.container_open),
            container_close: TagMatcher::new(tags.container_close),
            field_open: TagMatcher::new(tags.field_open),
            field_close: tags.field_close,
            in_container: false,
            capturing: false,
            candidate: 0,
            capture: heapless::Vec::new(),
            output: String::new(),
            count: 0,
            max_titles,
        }
    }

    /// Feed the next chunk of the document.
    ///
    /// Returns `Break` once the title limit has been reached; further input
    /// is ignored.
    pub fn push(&mut self, chunk: &[u8]) -> ControlFlow<()> {
        for &byte in chunk {
            if self.is_complete() {
                break;
            }
            self.push_byte(byte);
        }

        if self.is_complete() {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }

    pub fn is_complete(&self) -> bool {
        self.count >= self.max_titles
    }

    /// Titles extracted so far.
    pub fn title_count(&self) -> usize {
        self.count
    }

    /// Finish parsing and return the delimiter-joined titles.
    pub fn finish(self) -> Result<String, ParseError> {
        if self.count == 0 {
            return Err(ParseError::NoTitles);
        }
        Ok(sanitize_non_ascii(self.output.as_bytes()))
    }

    fn push_byte(&mut self, byte: u8) {
        if self.capturing {
            if self.container_close.feed(byte) {
                // Container ended before the field did
                debug!("Abandoning unterminated title");
                self.end_capture();
                self.in_container = false;
                return;
            }
            self.capture_byte(byte);
            return;
        }

        if self.container_open.feed(byte) {
            self.in_container = true;
        }
        if self.container_close.feed(byte) {
            self.in_container = false;
        }
        if self.field_open.feed(byte) && self.in_container {
            self.capturing = true;
            self.candidate = 0;
            self.capture.clear();
        }
    }

    fn capture_byte(&mut self, byte: u8) {
        if self.candidate > 0 {
            if byte == self.field_close[self.candidate] {
                self.candidate += 1;
                if self.candidate == self.field_close.len() {
                    self.finish_title();
                }
                return;
            }

            // Not the closing tag after all: keep what was held back, then
            // treat the breaking byte as ordinary input
            let held = self.candidate;
            self.candidate = 0;
            for &b in &self.field_close[..held] {
                self.append(b);
            }
        }

        if byte == self.field_close[0] {
            self.candidate = 1;
        } else {
            self.append(byte);
        }
    }

    fn append(&mut self, byte: u8) {
        // Past the cap bytes are dropped but capture continues
        self.capture.push(byte).ok();
    }

    fn finish_title(&mut self) {
        let title = normalize_title(&self.capture);
        self.end_capture();

        if title.is_empty() {
            return;
        }
        if !self.output.is_empty() {
            self.output.push_str(TITLE_DELIMITER);
        }
        self.output.push_str(&title);
        self.count += 1;
    }

    fn end_capture(&mut self) {
        self.capturing = false;
        self.candidate = 0;
        self.capture.clear();
        self.field_open.reset();
        self.container_close.reset();
    }
}

impl BodySink for FeedParser {
    fn write(&mut self, chunk: &[u8]) -> ControlFlow<()> {
        self.push(chunk)
    }
}
