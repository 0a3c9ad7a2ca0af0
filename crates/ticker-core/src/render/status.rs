//! Text shown in the status fields

use core::fmt::Write;

use embedded_graphics::pixelcolor::Rgb565;

use super::draw_cache::FIELD_TEXT_MAX;
use super::theme::{COLOR_FALL, COLOR_PENDING, COLOR_RISE, LIGHT_GRAY};
use crate::app_state::{LinkStatus, PriceSample};
use crate::link::ConnectivityState;

pub type FieldText = heapless::String<FIELD_TEXT_MAX>;

/// Shown in place of the price until the first quote arrives.
pub const PRICE_PENDING: &str = "Pending";

/// Shown in place of the change until a quote exists.
pub const CHANGE_UNKNOWN: &str = "--";

/// Shown in place of the date while only uptime is known.
pub const DATE_UNKNOWN: &str = "----/--/--";

/// Connectivity summary and its colour.
pub fn link_text(status: &LinkStatus) -> (FieldText, Rgb565) {
    let mut text = FieldText::new();
    let color = match ConnectivityState::from_status(status) {
        ConnectivityState::Connected => {
            match status.rssi {
                Some(rssi) => write!(text, "WiFi {}dBm", rssi),
                None => text.write_str("WiFi OK"),
            }
            .ok();
            COLOR_RISE
        }
        ConnectivityState::Connecting => {
            text.push_str("WiFi ...").ok();
            COLOR_PENDING
        }
        ConnectivityState::Offline => {
            text.push_str("Offline").ok();
            COLOR_FALL
        }
    };
    (text, color)
}

/// Price with thousands separators; two decimals below 1000.
pub fn price_text(sample: &PriceSample) -> FieldText {
    let mut text = FieldText::new();
    if !sample.is_fetched() {
        text.push_str(PRICE_PENDING).ok();
    } else if sample.value < 1000.0 {
        write!(text, "{:.2}", sample.value).ok();
    } else {
        group_thousands(&mut text, (sample.value + 0.5) as u64);
    }
    text
}

fn group_thousands(out: &mut FieldText, whole: u64) {
    let mut digits = heapless::Vec::<u8, 20>::new();
    let mut rest = whole;
    loop {
        digits.push(b'0' + (rest % 10) as u8).ok();
        rest /= 10;
        if rest == 0 {
            break;
        }
    }

    let len = digits.len();
    for (i, digit) in digits.iter().rev().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',').ok();
        }
        out.push(*digit as char).ok();
    }
}

/// Signed percent change, e.g. `+0.50%`, and its colour.
pub fn change_text(sample: &PriceSample) -> (FieldText, Rgb565) {
    let mut text = FieldText::new();
    let Some(ratio) = sample.change_ratio() else {
        text.push_str(CHANGE_UNKNOWN).ok();
        return (text, LIGHT_GRAY);
    };

    write!(text, "{:+.2}%", ratio * 100.0).ok();
    let color = if ratio > 0.0 {
        COLOR_RISE
    } else if ratio < 0.0 {
        COLOR_FALL
    } else {
        LIGHT_GRAY
    };
    (text, color)
}
