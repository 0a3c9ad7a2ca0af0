//! Shared state between the fetch task and the render task
//!
//! The [`StateStore`] is the only channel between the producer and the
//! consumer. Every operation takes the single coarse lock, touches memory
//! only, and hands back copies, so a slow network call can never hold the
//! lock and the render path never sees a half-updated value.

mod feed;
mod price;

pub use feed::*;
pub use price::*;

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::config::Category;

/// Fetch task life-cycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPhase {
    Connecting,
    TimeSyncing,
    Running,
    Offline,
}

impl FetchPhase {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Connecting => "WiFi connecting",
            Self::TimeSyncing => "Time syncing",
            Self::Running => "Running",
            Self::Offline => "Offline mode",
        }
    }
}

/// Link and clock state as last observed by the fetch task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkStatus {
    pub phase: FetchPhase,
    pub connected: bool,
    /// Received signal strength in dBm, when the link reports one.
    pub rssi: Option<i8>,
    pub time_valid: bool,
}

impl LinkStatus {
    pub const INITIAL: Self = Self {
        phase: FetchPhase::Connecting,
        connected: false,
        rssi: None,
        time_valid: false,
    };
}

impl Default for LinkStatus {
    fn default() -> Self {
        Self::INITIAL
    }
}

struct SharedState {
    price: PriceSample,
    feed: FeedSnapshot,
    link: LinkStatus,
}

/// Mutex-guarded home of the latest fetched values.
///
/// `new` is `const`, so the store is normally declared as a `static` and
/// borrowed by both tasks:
///
/// ```rust,ignore
/// static STORE: StateStore = StateStore::new();
/// ```
pub struct StateStore {
    inner: Mutex<CriticalSectionRawMutex, RefCell<SharedState>>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(SharedState {
                price: PriceSample::EMPTY,
                feed: FeedSnapshot::new(),
                link: LinkStatus::INITIAL,
            })),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut SharedState) -> R) -> R {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }

    /// Record a new quote. Returns `false` (and changes nothing) for
    /// non-positive values.
    pub fn publish_price(&self, value: f64) -> bool {
        self.with(|state| state.price.apply(value))
    }

    /// Replace one category's headlines. Does not bump the feed revision.
    pub fn publish_feed(&self, category: Category, text: &str) {
        self.with(|state| state.feed.set_text(category, text));
    }

    /// Mark the end of a feed fetch cycle; bumps the shared revision once.
    pub fn commit_feed_cycle(&self) {
        self.with(|state| state.feed.commit());
    }

    pub fn publish_link(&self, link: LinkStatus) {
        self.with(|state| state.link = link);
    }

    pub fn snapshot_price(&self) -> PriceSample {
        self.with(|state| state.price)
    }

    pub fn snapshot_feed(&self) -> FeedSnapshot {
        self.with(|state| state.feed.clone())
    }

    pub fn snapshot_link(&self) -> LinkStatus {
        self.with(|state| state.link)
    }

    /// Feed revision alone, for consumers that only need to detect staleness.
    pub fn feed_revision(&self) -> u32 {
        self.with(|state| state.feed.revision)
    }
}
