//! Fetch orchestrator (producer task)
//!
//! Owns the network link and the HTTP client. It walks the link life-cycle
//! (`Connecting → TimeSyncing → Running`, `Offline` on link loss), fetches the
//! price and the headline feeds on their own periods, and publishes results
//! into the [`StateStore`]. No error stops the task: failures are logged and
//! the next attempt happens on schedule.

use alloc::string::String;

use embassy_time::{Duration, Instant, Timer};
use log::{debug, info, warn};
use thiserror_no_std::Error;

use crate::app_state::{FetchPhase, LinkStatus, StateStore};
use crate::config::{AppConfig, Category, FeedSource};
use crate::feed::{FeedParser, MAX_TITLES, ParseError, TagSet};
use crate::link::{Link, TimeSync};
use crate::net::price::PriceBody;
use crate::net::{FetchError, HttpClient};

/// How often [`FetchOrchestrator::run`] re-evaluates the state machine.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Why one feed source produced no headlines.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceError {
    #[error("Transport failed: {0}")]
    Fetch(FetchError),
    #[error("Parse failed: {0}")]
    Parse(ParseError),
}

impl From<FetchError> for SourceError {
    fn from(e: FetchError) -> Self {
        Self::Fetch(e)
    }
}

impl From<ParseError> for SourceError {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

pub struct FetchOrchestrator<'a, L, T, H> {
    store: &'a StateStore,
    config: &'a AppConfig,
    link: L,
    clock: &'a T,
    http: H,
    phase: FetchPhase,
    /// Timeout of the current Connecting/TimeSyncing phase.
    phase_deadline: Instant,
    next_reconnect: Instant,
    next_price: Instant,
    next_feed: Instant,
}

impl<'a, L, T, H> FetchOrchestrator<'a, L, T, H>
where
    L: Link,
    T: TimeSync,
    H: HttpClient,
{
    pub fn new(
        store: &'a StateStore,
        config: &'a AppConfig,
        link: L,
        clock: &'a T,
        http: H,
    ) -> Self {
        Self {
            store,
            config,
            link,
            clock,
            http,
            phase: FetchPhase::Connecting,
            phase_deadline: Instant::MAX,
            next_reconnect: Instant::MAX,
            next_price: Instant::MAX,
            next_feed: Instant::MAX,
        }
    }

    pub fn phase(&self) -> FetchPhase {
        self.phase
    }

    /// Begin joining the network. Call once before polling.
    pub fn start(&mut self, now: Instant) {
        info!("Fetch task starting, joining network");
        self.link.begin_connect();
        self.phase = FetchPhase::Connecting;
        self.phase_deadline = now + self.config.timing.wifi_timeout();
        self.publish_status();
    }

    /// Advance the state machine and run whichever fetches are due.
    pub async fn poll(&mut self, now: Instant) {
        let connected = self.link.is_connected();

        match self.phase {
            FetchPhase::Connecting => {
                if connected {
                    self.on_link_up(now);
                } else if now >= self.phase_deadline {
                    warn!("Network not joined within timeout, going offline");
                    self.enter_offline(now);
                }
            }
            FetchPhase::TimeSyncing => {
                if !connected {
                    warn!("Link lost during time sync");
                    self.enter_offline(now);
                } else if self.clock.is_time_valid() {
                    info!("Clock synchronised");
                    self.enter_running(now);
                } else if now >= self.phase_deadline {
                    warn!("Time sync timed out, showing uptime clock");
                    self.enter_running(now);
                }
            }
            FetchPhase::Running => {
                if !connected {
                    warn!("Link lost, going offline");
                    self.enter_offline(now);
                } else {
                    self.run_due_fetches(now).await;
                }
            }
            FetchPhase::Offline => {
                if connected {
                    info!("Link restored");
                    self.on_link_up(now);
                } else if now >= self.next_reconnect {
                    debug!("Retrying network join");
                    self.link.begin_connect();
                    self.next_reconnect = now + self.config.timing.reconnect_interval();
                }
            }
        }

        self.publish_status();
    }

    /// Drive the orchestrator forever from the embassy timer.
    pub async fn run(&mut self) -> ! {
        self.start(Instant::now());
        loop {
            self.poll(Instant::now()).await;
            Timer::after(POLL_INTERVAL).await;
        }
    }

    fn on_link_up(&mut self, now: Instant) {
        if self.clock.is_time_valid() {
            self.enter_running(now);
            return;
        }
        self.clock.start_sync();
        self.phase = FetchPhase::TimeSyncing;
        self.phase_deadline = now + self.config.timing.time_sync_timeout();
    }

    fn enter_running(&mut self, now: Instant) {
        self.phase = FetchPhase::Running;
        self.next_price = now;
        self.next_feed = now;
    }

    fn enter_offline(&mut self, now: Instant) {
        self.phase = FetchPhase::Offline;
        self.next_reconnect = now + self.config.timing.reconnect_interval();
    }

    async fn run_due_fetches(&mut self, now: Instant) {
        if now >= self.next_price {
            self.next_price = now + self.config.timing.price_period();
            if let Err(e) = self.fetch_price().await {
                warn!("Price fetch failed: {}", e);
            }
        }

        if now >= self.next_feed {
            self.next_feed = now + self.config.timing.feed_period();
            let filled = self.fetch_feeds().await;
            info!("Feed cycle done, {}/{} categories filled", filled, Category::ALL.len());
        }
    }

    /// Fetch one quote and publish it. A failure leaves the store untouched.
    pub async fn fetch_price(&mut self) -> Result<f64, FetchError> {
        let endpoint = &self.config.price;
        let mut body = PriceBody::new();
        self.http.get(&endpoint.url, &mut body).await?;
        let value = body.parse(&endpoint.asset, &endpoint.currency)?;

        if self.store.publish_price(value) {
            debug!("Published {} = {}", endpoint.label, value);
        }
        Ok(value)
    }

    /// Refresh every category, then commit the cycle once.
    ///
    /// Returns how many categories got real headlines; the rest carry their
    /// placeholder text.
    pub async fn fetch_feeds(&mut self) -> usize {
        let config = self.config;
        let mut filled = 0;

        for category in Category::ALL {
            let source = config.feed(category);
            match self.fetch_source(source).await {
                Ok(text) => {
                    self.store.publish_feed(category, &text);
                    filled += 1;
                }
                Err(e) => {
                    warn!("{} feed unavailable: {}", source.label, e);
                    self.store.publish_feed(category, &source.placeholder);
                }
            }
        }

        self.store.commit_feed_cycle();
        filled
    }

    async fn fetch_source(&mut self, source: &FeedSource) -> Result<String, SourceError> {
        match self.fetch_titles(&source.primary_url).await {
            Ok(text) => Ok(text),
            Err(e) => {
                debug!("{} primary failed ({}), trying fallback", source.label, e);
                self.fetch_titles(&source.fallback_url).await
            }
        }
    }

    async fn fetch_titles(&mut self, url: &str) -> Result<String, SourceError> {
        let mut parser = FeedParser::new(TagSet::RSS, MAX_TITLES);
        self.http.get(url, &mut parser).await?;
        Ok(parser.finish()?)
    }

    fn publish_status(&self) {
        let connected = self.link.is_connected();
        self.store.publish_link(LinkStatus {
            phase: self.phase,
            connected,
            rssi: if connected { self.link.rssi() } else { None },
            time_valid: self.clock.is_time_valid(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::BodySink;
    use alloc::vec::Vec;
    use core::cell::{Cell, RefCell};
    use embassy_futures::block_on;

    const VALID_EPOCH: u64 = 1_760_000_000;

    #[derive(Default)]
    struct FakeRadio {
        connected: Cell<bool>,
        join_on_begin: Cell<bool>,
        begins: Cell<u32>,
    }

    struct FakeLink<'r>(&'r FakeRadio);

    impl Link for FakeLink<'_> {
        fn begin_connect(&mut self) {
            self.0.begins.set(self.0.begins.get() + 1);
            if self.0.join_on_begin.get() {
                self.0.connected.set(true);
            }
        }

        fn is_connected(&self) -> bool {
            self.0.connected.get()
        }

        fn rssi(&self) -> Option<i8> {
            Some(-61)
        }
    }

    #[derive(Default)]
    struct FakeClock {
        epoch: Cell<Option<u64>>,
        syncs: Cell<u32>,
    }

    impl TimeSync for FakeClock {
        fn start_sync(&self) {
            self.syncs.set(self.syncs.get() + 1);
        }

        fn epoch_secs(&self) -> Option<u64> {
            self.epoch.get()
        }
    }

    #[derive(Default)]
    struct FakeServer {
        routes: RefCell<Vec<(String, Result<Vec<u8>, FetchError>)>>,
        requests: RefCell<Vec<String>>,
    }

    impl FakeServer {
        fn route(&self, url: &str, response: Result<&[u8], FetchError>) {
            let mut routes = self.routes.borrow_mut();
            routes.retain(|(u, _)| u != url);
            routes.push((String::from(url), response.map(Vec::from)));
        }

        fn requested(&self, url: &str) -> usize {
            self.requests.borrow().iter().filter(|r| *r == url).count()
        }
    }

    struct FakeHttp<'s>(&'s FakeServer);

    impl HttpClient for FakeHttp<'_> {
        async fn get<S: BodySink>(&mut self, url: &str, sink: &mut S) -> Result<(), FetchError> {
            self.0.requests.borrow_mut().push(String::from(url));
            let routes = self.0.routes.borrow();
            let (_, response) = routes
                .iter()
                .find(|(u, _)| u == url)
                .ok_or(FetchError::Dns)?;
            let body = response.as_ref().map_err(|e| *e)?;
            for chunk in body.chunks(7) {
                if sink.write(chunk).is_break() {
                    break;
                }
            }
            Ok(())
        }
    }

    fn at(secs: u64) -> Instant {
        Instant::from_secs(secs)
    }

    fn rss(titles: &[&str]) -> Vec<u8> {
        let mut doc = String::from("<rss><channel><title>Channel</title>");
        for title in titles {
            doc.push_str("<item><title>");
            doc.push_str(title);
            doc.push_str("</title></item>");
        }
        doc.push_str("</channel></rss>");
        doc.into_bytes()
    }

    fn serve_all(server: &FakeServer, config: &AppConfig) {
        server.route(&config.price.url, Ok(br#"{"bitcoin":{"jpy":6000000}}"#));
        for category in Category::ALL {
            let body = rss(&[config.feed(category).label.as_str(), "second"]);
            server.route(&config.feed(category).primary_url, Ok(&body));
        }
    }

    struct Rig {
        store: StateStore,
        config: AppConfig,
        radio: FakeRadio,
        clock: FakeClock,
        server: FakeServer,
    }

    impl Rig {
        fn new() -> Self {
            let rig = Self {
                store: StateStore::new(),
                config: AppConfig::default(),
                radio: FakeRadio::default(),
                clock: FakeClock::default(),
                server: FakeServer::default(),
            };
            serve_all(&rig.server, &rig.config);
            rig
        }

        fn orchestrator(&self) -> FetchOrchestrator<'_, FakeLink<'_>, FakeClock, FakeHttp<'_>> {
            FetchOrchestrator::new(
                &self.store,
                &self.config,
                FakeLink(&self.radio),
                &self.clock,
                FakeHttp(&self.server),
            )
        }
    }

    /// Bring an orchestrator to `Running` at t = 0 with a synced clock.
    fn running(rig: &Rig) -> FetchOrchestrator<'_, FakeLink<'_>, FakeClock, FakeHttp<'_>> {
        rig.radio.join_on_begin.set(true);
        rig.clock.epoch.set(Some(VALID_EPOCH));
        let mut orchestrator = rig.orchestrator();
        orchestrator.start(at(0));
        block_on(orchestrator.poll(at(0)));
        assert_eq!(orchestrator.phase(), FetchPhase::Running);
        orchestrator
    }

    #[test]
    fn test_startup_walks_through_time_sync() {
        let rig = Rig::new();
        rig.radio.join_on_begin.set(true);
        let mut orchestrator = rig.orchestrator();

        orchestrator.start(at(0));
        assert_eq!(rig.store.snapshot_link().phase, FetchPhase::Connecting);

        block_on(orchestrator.poll(at(1)));
        assert_eq!(orchestrator.phase(), FetchPhase::TimeSyncing);
        assert_eq!(rig.clock.syncs.get(), 1);

        block_on(orchestrator.poll(at(2)));
        assert_eq!(orchestrator.phase(), FetchPhase::TimeSyncing);

        rig.clock.epoch.set(Some(VALID_EPOCH));
        block_on(orchestrator.poll(at(3)));
        assert_eq!(orchestrator.phase(), FetchPhase::Running);

        // both fetches run on the first Running poll
        block_on(orchestrator.poll(at(3)));
        assert_eq!(rig.store.snapshot_price().value, 6_000_000.0);
        assert_eq!(rig.store.feed_revision(), 1);

        let link = rig.store.snapshot_link();
        assert!(link.connected && link.time_valid);
        assert_eq!(link.rssi, Some(-61));
    }

    #[test]
    fn test_time_sync_timeout_still_reaches_running() {
        let rig = Rig::new();
        rig.radio.join_on_begin.set(true);
        let mut orchestrator = rig.orchestrator();
        orchestrator.start(at(0));
        block_on(orchestrator.poll(at(0)));

        block_on(orchestrator.poll(at(7)));
        assert_eq!(orchestrator.phase(), FetchPhase::TimeSyncing);
        block_on(orchestrator.poll(at(8)));
        assert_eq!(orchestrator.phase(), FetchPhase::Running);
        assert!(!rig.store.snapshot_link().time_valid);
    }

    #[test]
    fn test_join_timeout_then_fixed_interval_retries() {
        let rig = Rig::new();
        let mut orchestrator = rig.orchestrator();
        orchestrator.start(at(0));
        assert_eq!(rig.radio.begins.get(), 1);

        block_on(orchestrator.poll(at(14)));
        assert_eq!(orchestrator.phase(), FetchPhase::Connecting);
        block_on(orchestrator.poll(at(15)));
        assert_eq!(orchestrator.phase(), FetchPhase::Offline);
        assert_eq!(rig.store.snapshot_link().phase, FetchPhase::Offline);

        let mut retries_at = Vec::new();
        for t in 16..=50 {
            let before = rig.radio.begins.get();
            block_on(orchestrator.poll(at(t)));
            if rig.radio.begins.get() > before {
                retries_at.push(t);
            }
        }
        assert_eq!(retries_at, [25, 35, 45]);
        assert!(rig.server.requests.borrow().is_empty());
    }

    #[test]
    fn test_reconnect_with_valid_clock_skips_time_sync() {
        let rig = Rig::new();
        let mut orchestrator = running(&rig);

        rig.radio.connected.set(false);
        block_on(orchestrator.poll(at(1)));
        assert_eq!(orchestrator.phase(), FetchPhase::Offline);

        rig.radio.connected.set(true);
        block_on(orchestrator.poll(at(2)));
        assert_eq!(orchestrator.phase(), FetchPhase::Running);
        assert_eq!(rig.clock.syncs.get(), 0);
    }

    #[test]
    fn test_failing_category_gets_placeholder_and_one_revision() {
        let rig = Rig::new();
        let business = rig.config.feed(Category::Business).clone();
        rig.server.route(&business.primary_url, Err(FetchError::Status(500)));
        rig.server.route(&business.fallback_url, Err(FetchError::Connect));

        let mut orchestrator = running(&rig);
        let filled = block_on(orchestrator.fetch_feeds());

        assert_eq!(filled, 2);
        let feed = rig.store.snapshot_feed();
        assert_eq!(feed.revision, 1);
        assert_eq!(feed.text(Category::Business), "(Business feed unavailable)");
        assert_eq!(feed.text(Category::Headlines), "Headlines  |  second");
        assert_eq!(rig.server.requested(&business.fallback_url), 1);
    }

    #[test]
    fn test_fallback_used_when_primary_has_no_titles() {
        let rig = Rig::new();
        let tech = rig.config.feed(Category::Technology).clone();
        rig.server.route(&tech.primary_url, Ok(b"<html>maintenance</html>"));
        rig.server.route(&tech.fallback_url, Ok(&rss(&["From fallback"])));

        let mut orchestrator = running(&rig);
        block_on(orchestrator.fetch_feeds());

        let feed = rig.store.snapshot_feed();
        assert_eq!(feed.text(Category::Technology), "From fallback");
        let headlines = rig.config.feed(Category::Headlines);
        assert_eq!(rig.server.requested(&headlines.fallback_url), 0);
    }

    #[test]
    fn test_link_loss_keeps_handed_out_snapshots() {
        let rig = Rig::new();
        let mut orchestrator = running(&rig);
        block_on(orchestrator.poll(at(1)));

        let held_feed = rig.store.snapshot_feed();
        let held_price = rig.store.snapshot_price();
        let requests = rig.server.requests.borrow().len();

        rig.radio.connected.set(false);
        block_on(orchestrator.poll(at(400)));

        assert_eq!(orchestrator.phase(), FetchPhase::Offline);
        let link = rig.store.snapshot_link();
        assert!(!link.connected);
        assert_eq!(link.rssi, None);

        assert_eq!(rig.server.requests.borrow().len(), requests);
        assert_eq!(rig.store.snapshot_feed(), held_feed);
        assert_eq!(rig.store.snapshot_price(), held_price);
        assert_eq!(held_feed.text(Category::Headlines), "Headlines  |  second");
    }

    #[test]
    fn test_price_failure_retains_last_value() {
        let rig = Rig::new();
        let mut orchestrator = running(&rig);
        block_on(orchestrator.poll(at(1)));
        let before = rig.store.snapshot_price();
        assert_eq!(before.revision, 1);

        rig.server.route(&rig.config.price.url, Ok(b"{\"error\":\"rate limited\"}"));
        block_on(orchestrator.poll(at(61)));
        assert_eq!(rig.store.snapshot_price(), before);

        rig.server.route(&rig.config.price.url, Ok(br#"{"bitcoin":{"jpy":6030000}}"#));
        block_on(orchestrator.poll(at(90)));
        assert_eq!(rig.store.snapshot_price(), before);

        block_on(orchestrator.poll(at(121)));
        let after = rig.store.snapshot_price();
        assert_eq!(after.revision, 2);
        assert_eq!(after.previous, 6_000_000.0);
        assert_eq!(after.value, 6_030_000.0);
    }

    #[test]
    fn test_periods_are_independent() {
        let rig = Rig::new();
        let mut orchestrator = running(&rig);
        for t in 1..=301 {
            block_on(orchestrator.poll(at(t)));
        }

        assert_eq!(rig.server.requested(&rig.config.price.url), 6);
        let headlines = rig.config.feed(Category::Headlines);
        assert_eq!(rig.server.requested(&headlines.primary_url), 2);
        assert_eq!(rig.store.feed_revision(), 2);
    }
}
