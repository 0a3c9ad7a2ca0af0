//! In-memory display used by the render tests

use alloc::vec::Vec;
use core::convert::Infallible;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use super::layout::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX};

/// Counts what was pushed to it instead of showing anything.
pub struct RecordingDisplay {
    /// Pixels written by any means.
    pub pixels_written: usize,
    /// Number of `fill_solid` calls.
    pub solid_fills: usize,
    /// Areas written through `fill_contiguous`.
    pub contiguous: Vec<Rectangle>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self {
            pixels_written: 0,
            solid_fills: 0,
            contiguous: Vec::new(),
        }
    }

    pub fn reset(&mut self) {
        self.pixels_written = 0;
        self.solid_fills = 0;
        self.contiguous.clear();
    }
}

impl OriginDimensions for RecordingDisplay {
    fn size(&self) -> Size {
        Size::new(DISPLAY_WIDTH_PX as u32, DISPLAY_HEIGHT_PX as u32)
    }
}

impl DrawTarget for RecordingDisplay {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        self.pixels_written += pixels.into_iter().count();
        Ok(())
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        self.contiguous.push(*area);
        self.pixels_written += colors.into_iter().count();
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, _color: Self::Color) -> Result<(), Self::Error> {
        self.solid_fills += 1;
        self.pixels_written += (area.size.width * area.size.height) as usize;
        Ok(())
    }
}
