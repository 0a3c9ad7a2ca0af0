//! Application configuration
//!
//! Every field has a sensible default, so a configuration document only needs
//! to carry the values it overrides. The firmware bakes its values in at build
//! time; the simulator can load a JSON document at start-up.

use alloc::string::{String, ToString};
use embassy_time::Duration;
use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

use crate::net::http::Url;

/// Number of headline categories shown by the appliance.
pub const CATEGORY_COUNT: usize = 3;

/// Headline categories. Membership is fixed at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Headlines,
    Business,
    Technology,
}

impl Category {
    /// All categories, in fetch order.
    pub const ALL: [Category; CATEGORY_COUNT] =
        [Category::Headlines, Category::Business, Category::Technology];

    pub const fn index(self) -> usize {
        self as usize
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Malformed configuration document")]
    Malformed,
    #[error("Invalid URL in configuration: {0}")]
    InvalidUrl(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct InternetConfig {
    pub ssid: String,
    pub password: String,
}

/// Where the price quote comes from and where the number sits in the JSON body.
///
/// The value is read from `body[asset][currency]`, e.g. `{"bitcoin":{"jpy":6030000}}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PriceEndpoint {
    pub url: String,
    pub asset: String,
    pub currency: String,
    /// Short label drawn above the price, e.g. `BTC/JPY`.
    pub label: String,
}

impl Default for PriceEndpoint {
    fn default() -> Self {
        Self {
            url: "https://api.coingecko.com/api/v3/simple/price?ids=bitcoin&vs_currencies=jpy"
                .to_string(),
            asset: "bitcoin".to_string(),
            currency: "jpy".to_string(),
            label: "BTC/JPY".to_string(),
        }
    }
}

/// Primary and fallback feed URLs for one category.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct FeedSource {
    pub label: String,
    pub primary_url: String,
    pub fallback_url: String,
    /// Shown in place of the headlines when both URLs fail.
    pub placeholder: String,
}

impl FeedSource {
    fn new(label: &str, primary_url: &str, fallback_url: &str) -> Self {
        let mut placeholder = String::from("(");
        placeholder.push_str(label);
        placeholder.push_str(" feed unavailable)");

        Self {
            label: label.to_string(),
            primary_url: primary_url.to_string(),
            fallback_url: fallback_url.to_string(),
            placeholder,
        }
    }
}

/// Periods and timeouts, in milliseconds.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct Timing {
    pub price_period_ms: u32,
    pub feed_period_ms: u32,
    pub wifi_timeout_ms: u32,
    pub time_sync_timeout_ms: u32,
    pub reconnect_interval_ms: u32,
    pub http_timeout_ms: u32,
    pub status_period_ms: u32,
    pub ticker_period_ms: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            price_period_ms: 60_000,
            feed_period_ms: 5 * 60_000,
            wifi_timeout_ms: 15_000,
            time_sync_timeout_ms: 8_000,
            reconnect_interval_ms: 10_000,
            http_timeout_ms: 3_500,
            status_period_ms: 250,
            ticker_period_ms: 33,
        }
    }
}

impl Timing {
    pub fn price_period(&self) -> Duration {
        Duration::from_millis(self.price_period_ms as u64)
    }

    pub fn feed_period(&self) -> Duration {
        Duration::from_millis(self.feed_period_ms as u64)
    }

    pub fn wifi_timeout(&self) -> Duration {
        Duration::from_millis(self.wifi_timeout_ms as u64)
    }

    pub fn time_sync_timeout(&self) -> Duration {
        Duration::from_millis(self.time_sync_timeout_ms as u64)
    }

    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms as u64)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms as u64)
    }

    pub fn status_period(&self) -> Duration {
        Duration::from_millis(self.status_period_ms as u64)
    }

    pub fn ticker_period(&self) -> Duration {
        Duration::from_millis(self.ticker_period_ms as u64)
    }
}

/// Complete appliance configuration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub internet: InternetConfig,
    pub price: PriceEndpoint,
    /// One source per [`Category`], indexed by [`Category::index`].
    pub feeds: [FeedSource; CATEGORY_COUNT],
    pub timing: Timing,
    /// Offset of the displayed local time from UTC. Defaults to JST (+09:00).
    pub utc_offset_secs: i32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            internet: InternetConfig::default(),
            price: PriceEndpoint::default(),
            feeds: [
                FeedSource::new(
                    "Headlines",
                    "http://feeds.bbci.co.uk/news/rss.xml",
                    "http://rss.cnn.com/rss/edition.rss",
                ),
                FeedSource::new(
                    "Business",
                    "http://feeds.bbci.co.uk/news/business/rss.xml",
                    "http://rss.cnn.com/rss/money_latest.rss",
                ),
                FeedSource::new(
                    "Technology",
                    "http://feeds.bbci.co.uk/news/technology/rss.xml",
                    "http://rss.cnn.com/rss/edition_technology.rss",
                ),
            ],
            timing: Timing::default(),
            utc_offset_secs: 9 * 3600,
        }
    }
}

impl AppConfig {
    /// Parse a JSON configuration document; missing fields keep their defaults.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_slice(bytes).map_err(|_| ConfigError::Malformed)?;
        config.validate()?;
        Ok(config)
    }

    pub fn feed(&self, category: Category) -> &FeedSource {
        &self.feeds[category.index()]
    }

    /// Check that every configured URL is a well-formed `http` or `https`
    /// URL. Which schemes are served is up to the HTTP client.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let urls = core::iter::once(&self.price.url).chain(
            self.feeds
                .iter()
                .flat_map(|feed| [&feed.primary_url, &feed.fallback_url]),
        );

        for url in urls {
            Url::parse(url).map_err(|_| ConfigError::InvalidUrl(url.clone()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.utc_offset_secs, 32_400);
        assert_eq!(
            config.feed(Category::Business).placeholder,
            "(Business feed unavailable)"
        );
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = br#"{
            "internet": { "ssid": "lab", "password": "hunter2" },
            "timing": { "price_period_ms": 30000 }
        }"#;

        let config = AppConfig::from_json(json).unwrap();
        assert_eq!(config.internet.ssid, "lab");
        assert_eq!(config.timing.price_period(), Duration::from_secs(30));
        assert_eq!(config.timing.feed_period(), Duration::from_secs(300));
        assert_eq!(config.price.asset, "bitcoin");
    }

    #[test]
    fn test_rejects_unrequestable_url() {
        let json = br#"{ "price": { "url": "ftp://example.com/price" } }"#;
        assert!(matches!(
            AppConfig::from_json(json),
            Err(ConfigError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_accepts_secure_endpoints() {
        let json = br#"{
            "price": { "url": "https://api.example.com/v3/price?ids=bitcoin" }
        }"#;
        let config = AppConfig::from_json(json).unwrap();
        assert!(config.price.url.starts_with("https://"));
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_malformed_document() {
        assert!(matches!(
            AppConfig::from_json(b"{ not json"),
            Err(ConfigError::Malformed)
        ));
    }

    #[test]
    fn test_category_indices_follow_fetch_order() {
        for (i, category) in Category::ALL.iter().enumerate() {
            assert_eq!(category.index(), i);
        }
    }
}
