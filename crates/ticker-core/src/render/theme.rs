//! Colour palette
//!
//! RGB565 constants. To convert from 8-bit RGB: R>>3, G>>2, B>>3

use embedded_graphics::pixelcolor::Rgb565;

use crate::config::Category;

// ============================================================================
// Surfaces
// ============================================================================

/// Screen background - very dark gray-blue
pub const COLOR_BACKGROUND: Rgb565 = Rgb565::new(18 >> 3, 23 >> 2, 24 >> 3);

/// Price panel fill - slightly lighter than background
pub const COLOR_FOREGROUND: Rgb565 = Rgb565::new(26 >> 3, 32 >> 2, 33 >> 3);

/// Price panel border while there is no change to show
pub const COLOR_NEUTRAL: Rgb565 = Rgb565::new(43 >> 3, 55 >> 2, 57 >> 3);

// ============================================================================
// Price movement
// ============================================================================

/// Fully saturated rise - bright teal-green
pub const COLOR_RISE: Rgb565 = Rgb565::new(95 >> 3, 185 >> 2, 141 >> 3);

/// Fully saturated fall - muted red
pub const COLOR_FALL: Rgb565 = Rgb565::new(190 >> 3, 95 >> 2, 95 >> 3);

// ============================================================================
// Text
// ============================================================================

pub const WHITE: Rgb565 = Rgb565::new(31, 63, 31);

pub const LIGHT_GRAY: Rgb565 = Rgb565::new(21, 42, 21);

pub const GRAY: Rgb565 = Rgb565::new(16, 32, 16);

/// Warm orange for "in progress" states
pub const COLOR_PENDING: Rgb565 = Rgb565::new(200 >> 3, 145 >> 2, 85 >> 3);

/// Soft blue accent
pub const COLOR_ACCENT: Rgb565 = Rgb565::new(110 >> 3, 160 >> 2, 220 >> 3);

/// Ticker colour of each category's own line.
pub const fn category_color(category: Category) -> Rgb565 {
    match category {
        Category::Headlines => COLOR_ACCENT,
        Category::Business => COLOR_PENDING,
        Category::Technology => COLOR_RISE,
    }
}
