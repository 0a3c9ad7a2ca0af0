use embedded_graphics::pixelcolor::Rgb565;

use super::layout::StatusField;
use crate::app_state::truncate;

/// Longest text remembered per field. Status texts are all shorter.
pub const FIELD_TEXT_MAX: usize = 32;

#[derive(Debug, Clone)]
struct DrawnField {
    text: heapless::String<FIELD_TEXT_MAX>,
    color: Rgb565,
}

/// Last text and colour drawn into each status field.
///
/// A field is only pushed to the display when one of the two differs from
/// what is already there.
#[derive(Debug, Clone, Default)]
pub struct DrawCache {
    fields: [Option<DrawnField>; StatusField::COUNT],
}

impl DrawCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn needs_redraw(&self, field: StatusField, text: &str, color: Rgb565) -> bool {
        match &self.fields[field.index()] {
            Some(drawn) => {
                drawn.color != color || drawn.text.as_str() != truncate(text, FIELD_TEXT_MAX)
            }
            None => true,
        }
    }

    pub fn store(&mut self, field: StatusField, text: &str, color: Rgb565) {
        let mut stored = heapless::String::new();
        stored.push_str(truncate(text, FIELD_TEXT_MAX)).ok();
        self.fields[field.index()] = Some(DrawnField {
            text: stored,
            color,
        });
    }

    /// Forget everything, e.g. after the whole screen was cleared.
    pub fn invalidate(&mut self) {
        self.fields = Default::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::theme::{GRAY, WHITE};

    #[test]
    fn test_identical_text_and_color_is_suppressed() {
        let mut cache = DrawCache::new();
        assert!(cache.needs_redraw(StatusField::Clock, "12:00:00", WHITE));

        cache.store(StatusField::Clock, "12:00:00", WHITE);
        assert!(!cache.needs_redraw(StatusField::Clock, "12:00:00", WHITE));
        assert!(cache.needs_redraw(StatusField::Clock, "12:00:01", WHITE));
        assert!(cache.needs_redraw(StatusField::Clock, "12:00:00", GRAY));

        // fields are tracked independently
        assert!(cache.needs_redraw(StatusField::Date, "12:00:00", WHITE));
    }

    #[test]
    fn test_invalidate_forces_redraw() {
        let mut cache = DrawCache::new();
        cache.store(StatusField::Price, "6,030,000", WHITE);
        cache.invalidate();
        assert!(cache.needs_redraw(StatusField::Price, "6,030,000", WHITE));
    }

    #[test]
    fn test_overlong_text_compares_on_stored_prefix() {
        let mut cache = DrawCache::new();
        let long = "x".repeat(FIELD_TEXT_MAX + 8);
        cache.store(StatusField::Phase, &long, WHITE);
        assert!(!cache.needs_redraw(StatusField::Phase, &long, WHITE));
    }
}
