//! Wi-Fi station link
//!
//! The esp-radio controller is owned by [`connection_task`]. The fetch task
//! only holds an [`EspLink`], which asks for a (re)join through a signal and
//! reads the link state back from the radio and the embassy-net stack.

use core::sync::atomic::{AtomicI32, Ordering};

use alloc::string::String;
use embassy_futures::select::{Either, select};
use embassy_net::{Runner, Stack};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Timer};
use esp_radio::wifi::{
    ClientConfig, ModeConfig, WifiController, WifiDevice, WifiEvent, WifiStaState,
};
use log::{debug, info, warn};
use ticker_core::link::Link;

/// How often the signal strength is re-read while associated.
const RSSI_REFRESH: Duration = Duration::from_secs(5);

const RSSI_UNKNOWN: i32 = i32::MIN;

static CONNECT_REQUEST: Signal<CriticalSectionRawMutex, ()> = Signal::new();
static RSSI: AtomicI32 = AtomicI32::new(RSSI_UNKNOWN);

/// [`Link`] handle given to the fetch task.
pub struct EspLink {
    stack: Stack<'static>,
}

impl EspLink {
    pub fn new(stack: Stack<'static>) -> Self {
        Self { stack }
    }
}

impl Link for EspLink {
    fn begin_connect(&mut self) {
        CONNECT_REQUEST.signal(());
    }

    /// Associated with the AP and holding a DHCP lease.
    fn is_connected(&self) -> bool {
        matches!(esp_radio::wifi::sta_state(), WifiStaState::Connected)
            && self.stack.is_config_up()
    }

    fn rssi(&self) -> Option<i8> {
        match RSSI.load(Ordering::Relaxed) {
            RSSI_UNKNOWN => None,
            rssi => Some(rssi.clamp(i8::MIN as i32, i8::MAX as i32) as i8),
        }
    }
}

/// Owns the Wi-Fi controller: joins when asked, then tracks signal strength
/// until the association drops.
#[embassy_executor::task]
pub async fn connection_task(
    mut controller: WifiController<'static>,
    ssid: String,
    password: String,
) {
    info!("Wi-Fi connection task started");
    loop {
        CONNECT_REQUEST.wait().await;

        if !matches!(controller.is_started(), Ok(true)) {
            let mode = ModeConfig::Client(
                ClientConfig::default()
                    .with_ssid(ssid.clone())
                    .with_password(password.clone()),
            );
            if let Err(e) = controller.set_config(&mode) {
                warn!("Wi-Fi config rejected: {:?}", e);
                continue;
            }
            if let Err(e) = controller.start_async().await {
                warn!("Wi-Fi start failed: {:?}", e);
                continue;
            }
            info!("Wi-Fi started");
        }

        if !matches!(esp_radio::wifi::sta_state(), WifiStaState::Connected) {
            info!("Joining {}", ssid);
            if let Err(e) = controller.connect_async().await {
                warn!("Wi-Fi join failed: {:?}", e);
                continue;
            }
            info!("Wi-Fi associated");
        }

        track_rssi(&mut controller).await;
        warn!("Wi-Fi disconnected");
    }
}

async fn track_rssi(controller: &mut WifiController<'static>) {
    while matches!(esp_radio::wifi::sta_state(), WifiStaState::Connected) {
        match controller.rssi() {
            Ok(rssi) => RSSI.store(rssi, Ordering::Relaxed),
            Err(e) => debug!("RSSI read failed: {:?}", e),
        }

        let disconnected = controller.wait_for_event(WifiEvent::StaDisconnected);
        if let Either::First(()) = select(disconnected, Timer::after(RSSI_REFRESH)).await {
            break;
        }
    }
    RSSI.store(RSSI_UNKNOWN, Ordering::Relaxed);
}

#[embassy_executor::task]
pub async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) {
    runner.run().await
}
