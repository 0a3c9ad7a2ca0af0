//! Configuration baked in at build time
//!
//! `build.rs` forwards values from `.env`; anything unset keeps the
//! [`AppConfig`] default.

use alloc::string::String;

use log::{info, warn};
use ticker_core::config::{AppConfig, Category};

/// Primary feed URL overrides, in [`Category::ALL`] order.
const FEED_OVERRIDES: [Option<&str>; 3] = [
    option_env!("TICKER_HEADLINES_URL"),
    option_env!("TICKER_BUSINESS_URL"),
    option_env!("TICKER_TECHNOLOGY_URL"),
];

pub fn app_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.internet.ssid = String::from(option_env!("WIFI_SSID").unwrap_or_default());
    config.internet.password = String::from(option_env!("WIFI_PASSWORD").unwrap_or_default());

    if let Some(url) = option_env!("TICKER_PRICE_URL") {
        config.price.url = String::from(url);
    }
    for (category, url) in Category::ALL.into_iter().zip(FEED_OVERRIDES) {
        if let Some(url) = url {
            config.feeds[category.index()].primary_url = String::from(url);
        }
    }
    if let Some(offset) = option_env!("TICKER_UTC_OFFSET_SECS").and_then(|s| s.parse().ok()) {
        config.utc_offset_secs = offset;
    }

    if let Err(e) = config.validate() {
        warn!("{}; falling back to default endpoints", e);
        let internet = core::mem::take(&mut config.internet);
        let utc_offset_secs = config.utc_offset_secs;
        config = AppConfig {
            internet,
            utc_offset_secs,
            ..AppConfig::default()
        };
    }

    let feed_urls = config
        .feeds
        .iter()
        .flat_map(|feed| [&feed.primary_url, &feed.fallback_url]);
    for url in core::iter::once(&config.price.url).chain(feed_urls) {
        if url.starts_with("https://") {
            warn!("{} needs TLS, which this build lacks; set a plain http override", url);
        }
    }

    if config.internet.ssid.is_empty() {
        warn!("WIFI_SSID not set at build time, the link will never come up");
    } else {
        info!("Configured for network {}", config.internet.ssid);
    }
    config
}
