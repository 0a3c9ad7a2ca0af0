//! Wall clock kept by SNTP
//!
//! The clock stores the epoch of the last good reply together with the
//! embassy instant it arrived at, and extrapolates from there.

use core::cell::Cell;

use embassy_futures::select::select;
use embassy_net::dns::DnsQueryType;
use embassy_net::udp::{PacketMetadata, UdpSocket};
use embassy_net::Stack;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Timer, with_timeout};
use log::{info, warn};
use thiserror_no_std::Error;
use ticker_core::link::TimeSync;
use ticker_core::net::sntp::{SNTP_PACKET_LEN, SNTP_PORT, SntpError, parse_reply, request_packet};

const NTP_HOST: &str = "pool.ntp.org";

const REPLY_TIMEOUT: Duration = Duration::from_secs(3);

/// Drift correction once the clock is set.
const RESYNC_PERIOD: Duration = Duration::from_secs(6 * 3600);

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncError {
    #[error("NTP server lookup failed")]
    Dns,
    #[error("UDP socket error")]
    Socket,
    #[error("No reply from NTP server")]
    Timeout,
    #[error("Bad NTP reply: {0}")]
    Reply(SntpError),
}

pub struct SntpClock {
    /// Epoch seconds of the last reply and when it was received.
    anchor: Mutex<CriticalSectionRawMutex, Cell<Option<(u64, Instant)>>>,
    request: Signal<CriticalSectionRawMutex, ()>,
}

impl Default for SntpClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SntpClock {
    pub const fn new() -> Self {
        Self {
            anchor: Mutex::new(Cell::new(None)),
            request: Signal::new(),
        }
    }

    fn set(&self, epoch_secs: u64, at: Instant) {
        self.anchor.lock(|anchor| anchor.set(Some((epoch_secs, at))));
    }
}

impl TimeSync for SntpClock {
    fn start_sync(&self) {
        self.request.signal(());
    }

    fn epoch_secs(&self) -> Option<u64> {
        let (epoch_secs, at) = self.anchor.lock(Cell::get)?;
        Some(epoch_secs + at.elapsed().as_secs())
    }
}

/// Answer sync requests, and refresh the clock periodically once it is set.
#[embassy_executor::task]
pub async fn sntp_task(stack: Stack<'static>, clock: &'static SntpClock) {
    loop {
        select(clock.request.wait(), Timer::after(RESYNC_PERIOD)).await;
        if !stack.is_config_up() {
            continue;
        }

        match query(stack).await {
            Ok(epoch_secs) => {
                clock.set(epoch_secs, Instant::now());
                info!("Clock set from SNTP: {}", epoch_secs);
            }
            Err(e) => warn!("SNTP sync failed: {}", e),
        }
    }
}

async fn query(stack: Stack<'_>) -> Result<u64, SyncError> {
    let server = stack
        .dns_query(NTP_HOST, DnsQueryType::A)
        .await
        .map_err(|_| SyncError::Dns)?
        .first()
        .copied()
        .ok_or(SyncError::Dns)?;

    let mut rx_meta = [PacketMetadata::EMPTY; 1];
    let mut rx_buffer = [0u8; 2 * SNTP_PACKET_LEN];
    let mut tx_meta = [PacketMetadata::EMPTY; 1];
    let mut tx_buffer = [0u8; SNTP_PACKET_LEN];
    let mut socket = UdpSocket::new(
        stack,
        &mut rx_meta,
        &mut rx_buffer,
        &mut tx_meta,
        &mut tx_buffer,
    );
    // port 0 picks an ephemeral port
    socket.bind(0).map_err(|_| SyncError::Socket)?;

    socket
        .send_to(&request_packet(), (server, SNTP_PORT))
        .await
        .map_err(|_| SyncError::Socket)?;

    let mut reply = [0u8; SNTP_PACKET_LEN];
    let (len, _) = with_timeout(REPLY_TIMEOUT, socket.recv_from(&mut reply))
        .await
        .map_err(|_| SyncError::Timeout)?
        .map_err(|_| SyncError::Socket)?;

    parse_reply(&reply[..len]).map_err(SyncError::Reply)
}
