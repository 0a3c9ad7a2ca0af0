//! Canned endpoints so the UI can be exercised without network access
//!
//! The quote follows a slow synthetic curve and each feed cycles through a
//! small pool of headlines. The Business primary feed always answers 503, so
//! the fallback path is visible on screen.

use std::fmt::Write;
use std::time::Instant;

use ticker_core::config::{AppConfig, Category};
use ticker_core::net::{BodySink, FetchError, HttpClient};

/// Bodies are delivered in odd-sized pieces, like a real socket would.
const CHUNK_LEN: usize = 61;

const HEADLINES: [&str; 6] = [
    "Council approves riverside transit plan",
    "Heavy snow expected across the north tonight",
    "Museum reopens after &quot;decade-long&quot; restoration",
    "Marathon route changes announced",
    "Water &amp; power restored after storm",
    "Schools trial four-day week",
];

const BUSINESS: [&str; 6] = [
    "Central bank holds rates steady",
    "Chipmaker shares jump on earnings beat",
    "Retail sales slip for a second month",
    "Oil edges higher as supply tightens",
    "Start-up raises $40m for battery recycling",
    "Airline orders 30 new long-haul jets",
];

const TECHNOLOGY: [&str; 6] = [
    "New open-source RTOS targets tiny sensors",
    "Researchers demo 1 Tbit/s optical link",
    "<![CDATA[Browser adds <b>memory</b> saver by default]]>",
    "Satellite broadband reaches polar stations",
    "Rust adoption grows in embedded firmware",
    "Phone makers agree on repair standard",
];

const ITEMS_PER_FEED: usize = 4;

const RSS_PROLOGUE: &str = r#"<?xml version="1.0" encoding="UTF-8"?><rss version="2.0"><channel>"#;

pub struct MockHttpClient<'a> {
    config: &'a AppConfig,
    started: Instant,
    feed_requests: usize,
}

impl<'a> MockHttpClient<'a> {
    pub fn new(config: &'a AppConfig) -> Self {
        Self {
            config,
            started: Instant::now(),
            feed_requests: 0,
        }
    }

    fn price_body(&self) -> String {
        let t = self.started.elapsed().as_secs_f64();
        let value = 6_000_000.0 + 60_000.0 * (t / 90.0).sin() + 15_000.0 * (t / 23.0).cos();
        let price = &self.config.price;
        format!(r#"{{"{}":{{"{}":{:.0}}}}}"#, price.asset, price.currency, value)
    }

    fn feed_body(&mut self, category: Category) -> String {
        let pool = match category {
            Category::Headlines => &HEADLINES,
            Category::Business => &BUSINESS,
            Category::Technology => &TECHNOLOGY,
        };
        let start = self.feed_requests;
        self.feed_requests += 1;

        let mut body = String::from(RSS_PROLOGUE);
        write!(
            body,
            "<title>{} (simulated)</title>",
            self.config.feed(category).label
        )
        .ok();
        for i in 0..ITEMS_PER_FEED {
            let title = pool[(start + i) % pool.len()];
            write!(
                body,
                "<item>\n  <title>{title}</title>\n  <link>http://example.invalid/{i}</link>\n</item>"
            )
            .ok();
        }
        body.push_str("</channel></rss>");
        body
    }

    fn route(&mut self, url: &str) -> Result<String, FetchError> {
        if url == self.config.price.url {
            return Ok(self.price_body());
        }

        for category in Category::ALL {
            let feed = self.config.feed(category);
            if url == feed.primary_url && category == Category::Business {
                return Err(FetchError::Status(503));
            }
            if url == feed.primary_url || url == feed.fallback_url {
                return Ok(self.feed_body(category));
            }
        }
        Err(FetchError::Status(404))
    }
}

impl HttpClient for MockHttpClient<'_> {
    async fn get<S: BodySink>(&mut self, url: &str, sink: &mut S) -> Result<(), FetchError> {
        let body = self.route(url)?;
        for chunk in body.as_bytes().chunks(CHUNK_LEN) {
            if sink.write(chunk).is_break() {
                break;
            }
        }
        Ok(())
    }
}
