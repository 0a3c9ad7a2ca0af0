//! Screen geometry for a 320x240 landscape panel
//!
//! ```text
//! +--------------------------------------------+
//! | link                                 phase |
//! | HH:MM:SS NTP                    YYYY/MM/DD |
//! | +----------------------------------------+ |
//! | | BTC/JPY                         +0.50% | |
//! | |                                        | |
//! | | 6,030,000                              | |
//! | +----------------------------------------+ |
//! | digest ticker                              |
//! | headlines ticker                           |
//! | business ticker                            |
//! | technology ticker                          |
//! +--------------------------------------------+
//! ```

use embedded_graphics::geometry::{Point, Size};
use embedded_graphics::mono_font::MonoFont;
use embedded_graphics::mono_font::ascii::{FONT_6X10, FONT_9X15, FONT_10X20};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics::text::Alignment;

use super::theme::{COLOR_BACKGROUND, COLOR_FOREGROUND};

pub const DISPLAY_WIDTH_PX: u16 = 320;
pub const DISPLAY_HEIGHT_PX: u16 = 240;

/// Price panel, including its border.
pub const PANEL: Rectangle = Rectangle::new(Point::new(4, 46), Size::new(312, 94));
pub const PANEL_BORDER_PX: u32 = 2;

pub const TICKER_FONT: &MonoFont<'static> = &FONT_9X15;
pub const TICKER_LINE_HEIGHT_PX: u32 = 16;
pub const TICKER_TOP_PX: i32 = 148;
pub const TICKER_PITCH_PX: i32 = 22;

/// Top-left corner of ticker line `index`.
pub const fn ticker_origin(index: usize) -> Point {
    Point::new(0, TICKER_TOP_PX + index as i32 * TICKER_PITCH_PX)
}

/// Independently redrawn parts of the status area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusField {
    Link,
    Phase,
    Clock,
    ClockMode,
    Date,
    PriceLabel,
    Change,
    Price,
    PanelBorder,
}

impl StatusField {
    pub const COUNT: usize = 9;

    pub const ALL: [StatusField; Self::COUNT] = [
        Self::Link,
        Self::Phase,
        Self::Clock,
        Self::ClockMode,
        Self::Date,
        Self::PriceLabel,
        Self::Change,
        Self::Price,
        Self::PanelBorder,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Area cleared before the field's text is drawn.
    pub const fn region(self) -> Rectangle {
        let (x, y, w, h) = match self {
            Self::Link => (4, 4, 150, 10),
            Self::Phase => (166, 4, 150, 10),
            Self::Clock => (4, 18, 80, 20),
            Self::ClockMode => (90, 26, 24, 10),
            Self::Date => (196, 22, 120, 15),
            Self::PriceLabel => (12, 54, 140, 10),
            Self::Change => (164, 52, 144, 15),
            Self::Price => (12, 98, 296, 20),
            Self::PanelBorder => return PANEL,
        };
        Rectangle::new(Point::new(x, y), Size::new(w, h))
    }

    pub fn font(self) -> &'static MonoFont<'static> {
        match self {
            Self::Clock | Self::Price => &FONT_10X20,
            Self::Date | Self::Change => &FONT_9X15,
            _ => &FONT_6X10,
        }
    }

    pub fn alignment(self) -> Alignment {
        match self {
            Self::Phase | Self::Date | Self::Change => Alignment::Right,
            _ => Alignment::Left,
        }
    }

    pub fn background(self) -> Rgb565 {
        match self {
            Self::PriceLabel | Self::Change | Self::Price => COLOR_FOREGROUND,
            _ => COLOR_BACKGROUND,
        }
    }

    /// Where text is anchored, for a top baseline.
    pub fn anchor(self) -> Point {
        let region = self.region();
        match self.alignment() {
            Alignment::Right => {
                region.top_left + Point::new(region.size.width as i32 - 1, 0)
            }
            Alignment::Center => {
                region.top_left + Point::new(region.size.width as i32 / 2, 0)
            }
            Alignment::Left => region.top_left,
        }
    }
}
