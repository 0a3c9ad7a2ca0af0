use embedded_graphics::pixelcolor::{Rgb565, RgbColor};

use super::theme::{COLOR_FALL, COLOR_NEUTRAL, COLOR_RISE};
use crate::app_state::PriceSample;

/// Relative change at which the price colour is fully green or red (0.5 %).
pub const PRICE_CHANGE_SATURATION: f64 = 0.005;

/// Colour for the latest price movement.
///
/// Blends from neutral toward green (rise) or red (fall) in proportion to
/// `|value - previous| / previous`, reaching the full colour at
/// [`PRICE_CHANGE_SATURATION`].
pub fn change_color(sample: &PriceSample) -> Rgb565 {
    let Some(ratio) = sample.change_ratio() else {
        return COLOR_NEUTRAL;
    };
    if ratio == 0.0 {
        return COLOR_NEUTRAL;
    }

    let magnitude = if ratio < 0.0 { -ratio } else { ratio };
    let t = (magnitude / PRICE_CHANGE_SATURATION).min(1.0) as f32;
    let target = if ratio > 0.0 { COLOR_RISE } else { COLOR_FALL };
    lerp(COLOR_NEUTRAL, target, t)
}

/// Per-channel linear blend, `t` in `0.0..=1.0`.
pub fn lerp(from: Rgb565, to: Rgb565, t: f32) -> Rgb565 {
    let t = t.clamp(0.0, 1.0);
    let channel = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t + 0.5) as u8;
    Rgb565::new(
        channel(from.r(), to.r()),
        channel(from.g(), to.g()),
        channel(from.b(), to.b()),
    )
}
