use crate::config::{CATEGORY_COUNT, Category};

/// Maximum stored length of one category's joined headlines, in bytes.
pub const FEED_TEXT_MAX: usize = 512;

/// Text reported for a category that has never been published.
pub const PENDING_TEXT: &str = "(pending)";

pub type FeedText = heapless::String<FEED_TEXT_MAX>;

/// Joined headlines for every category plus one shared freshness counter.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSnapshot {
    texts: [FeedText; CATEGORY_COUNT],
    /// Incremented once per completed fetch cycle across all categories.
    pub revision: u32,
}

impl Default for FeedSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedSnapshot {
    pub const fn new() -> Self {
        Self {
            texts: [const { FeedText::new() }; CATEGORY_COUNT],
            revision: 0,
        }
    }

    /// Headlines for `category`, or [`PENDING_TEXT`] before the first publish.
    pub fn text(&self, category: Category) -> &str {
        let text = self.texts[category.index()].as_str();
        if text.is_empty() { PENDING_TEXT } else { text }
    }

    /// Replace a category's text, truncating on a character boundary.
    pub(crate) fn set_text(&mut self, category: Category, text: &str) {
        let slot = &mut self.texts[category.index()];
        slot.clear();
        // Cannot fail: the slice is cut to capacity first
        slot.push_str(truncate(text, FEED_TEXT_MAX)).ok();
    }

    pub(crate) fn commit(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

/// Longest prefix of `text` that fits in `max` bytes without splitting a character.
pub fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
