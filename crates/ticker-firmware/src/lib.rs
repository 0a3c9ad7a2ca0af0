//! ESP32-S3 firmware-specific modules for the ticker appliance
//!
//! Everything here needs the ESP32-S3 peripherals or the esp-radio Wi-Fi
//! stack: power and display bring-up, the station link, the SNTP clock and the
//! TCP HTTP client. The portable logic lives in `ticker-core`.

#![no_std]

extern crate alloc;

pub mod build_config;
pub mod hardware;
pub mod http;
pub mod sntp;
pub mod wifi;
