//! Connectivity and time-sync collaborators
//!
//! The core never talks to a radio or an NTP server directly. It consumes
//! these two traits, implemented by the firmware (esp-radio, SNTP over
//! embassy-net) and by the simulator (host network, system clock).

use crate::app_state::{FetchPhase, LinkStatus};
use crate::clock::is_plausible_epoch;

/// Network link (Wi-Fi station on the device).
pub trait Link {
    /// Start (or restart) joining the network. Must not block.
    fn begin_connect(&mut self);

    fn is_connected(&self) -> bool;

    /// Received signal strength in dBm, if the link knows it.
    fn rssi(&self) -> Option<i8>;
}

/// Wall-clock source backed by some time synchronisation service.
///
/// Methods take `&self` so a single clock can be shared by both tasks.
pub trait TimeSync {
    /// Kick off synchronisation. Must not block; repeated calls are harmless.
    fn start_sync(&self);

    /// Current UTC epoch in seconds, if the clock has any notion of it.
    fn epoch_secs(&self) -> Option<u64>;

    fn is_time_valid(&self) -> bool {
        self.epoch_secs().is_some_and(is_plausible_epoch)
    }
}

/// Connectivity as presented to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityState {
    Connecting,
    Connected,
    Offline,
}

impl ConnectivityState {
    pub fn from_status(status: &LinkStatus) -> Self {
        if status.connected {
            Self::Connected
        } else if status.phase == FetchPhase::Connecting {
            Self::Connecting
        } else {
            Self::Offline
        }
    }
}
