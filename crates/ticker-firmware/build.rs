//! Bakes Wi-Fi credentials and endpoint overrides from `.env` into the image.

use std::env;

/// Variables forwarded to the firmware as `option_env!` values.
const FORWARDED: [&str; 7] = [
    "WIFI_SSID",
    "WIFI_PASSWORD",
    "TICKER_PRICE_URL",
    "TICKER_HEADLINES_URL",
    "TICKER_BUSINESS_URL",
    "TICKER_TECHNOLOGY_URL",
    "TICKER_UTC_OFFSET_SECS",
];

fn main() {
    match dotenvy::dotenv() {
        Ok(path) => println!("cargo:rerun-if-changed={}", path.display()),
        Err(e) => println!("cargo:warning=No .env loaded ({e}), Wi-Fi credentials will be empty"),
    }

    for key in FORWARDED {
        println!("cargo:rerun-if-env-changed={key}");
        if let Ok(value) = env::var(key) {
            println!("cargo:rustc-env={key}={value}");
        }
    }

    println!("cargo:rustc-link-arg=-Tlinkall.x");
}
