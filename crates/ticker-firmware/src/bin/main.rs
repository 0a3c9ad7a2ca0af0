#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use embassy_executor::Spawner;
use embassy_net::StackResources;
use embassy_time::Instant;
use esp_hal::clock::CpuClock;
use esp_hal::gpio::{Level, Output, OutputConfig};
use esp_hal::rng::Rng;
use esp_hal::timer::timg::TimerGroup;
use log::info;
use static_cell::StaticCell;

// Display-LCD panel specific imports
use embedded_hal_bus::spi::ExclusiveDevice;
use esp_hal::spi::master::{Config, Spi};
use mipidsi::interface::SpiInterface;
use mipidsi::{Builder as MipidsiBuilder, models::ILI9342CRgb565};

use ticker_core::render::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX};
use ticker_core::{AppConfig, FetchOrchestrator, RenderOrchestrator, StateStore};
use ticker_firmware::http::TcpHttpClient;
use ticker_firmware::sntp::{SntpClock, sntp_task};
use ticker_firmware::wifi::{EspLink, connection_task, net_task};
use ticker_firmware::{build_config, hardware};

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    loop {}
}

extern crate alloc;

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

/// Sockets: DHCP, DNS, one HTTP connection and one SNTP exchange.
const SOCKET_COUNT: usize = 4;

static STORE: StateStore = StateStore::new();
static CLOCK: SntpClock = SntpClock::new();

static CONFIG: StaticCell<AppConfig> = StaticCell::new();
static RADIO: StaticCell<esp_radio::Controller<'static>> = StaticCell::new();
static NET_RESOURCES: StaticCell<StackResources<SOCKET_COUNT>> = StaticCell::new();

type FirmwareFetch = FetchOrchestrator<'static, EspLink, SntpClock, TcpHttpClient>;

#[embassy_executor::task]
async fn fetch_task(mut orchestrator: FirmwareFetch) {
    orchestrator.run().await
}

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    rtt_target::rtt_init_log!();

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 73744);
    // Ticker canvases and headline text live in PSRAM
    esp_alloc::psram_allocator!(peripherals.PSRAM, esp_hal::psram);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);
    let booted_at = Instant::now();

    info!("Embassy initialized!");

    let app_config: &'static AppConfig = CONFIG.init(build_config::app_config());

    // Power rails and LCD reset come first; the panel is dead without them
    let mut i2c =
        hardware::create_i2c_bus(peripherals.I2C0, peripherals.GPIO12, peripherals.GPIO11);
    hardware::power_up_display(&mut i2c).await;

    // Wi-Fi station and the embassy-net stack on top of it
    let radio_init =
        RADIO.init(esp_radio::init().expect("Failed to initialize Wi-Fi/BLE controller"));
    let (wifi_controller, interfaces) =
        esp_radio::wifi::new(radio_init, peripherals.WIFI, Default::default())
            .expect("Failed to initialize Wi-Fi controller");

    let rng = Rng::new();
    let seed = (rng.random() as u64) << 32 | rng.random() as u64;
    let (stack, runner) = embassy_net::new(
        interfaces.sta,
        embassy_net::Config::dhcpv4(Default::default()),
        NET_RESOURCES.init(StackResources::new()),
        seed,
    );

    spawner.spawn(net_task(runner).expect("net task"));
    spawner.spawn(
        connection_task(
            wifi_controller,
            app_config.internet.ssid.clone(),
            app_config.internet.password.clone(),
        )
        .expect("connection task"),
    );
    spawner.spawn(sntp_task(stack, &CLOCK).expect("sntp task"));

    let fetch = FetchOrchestrator::new(
        &STORE,
        app_config,
        EspLink::new(stack),
        &CLOCK,
        TcpHttpClient::new(stack, app_config.timing.http_timeout()),
    );
    spawner.spawn(fetch_task(fetch).expect("fetch task"));

    // Configure and initialize the display

    // 1. Configure SPI bus
    let spi_bus = Spi::new(peripherals.SPI2, Config::default())
        .expect("Failed to configure SPI2")
        .with_sck(peripherals.GPIO36)
        .with_mosi(peripherals.GPIO37);

    // 2. Create a dummy CS pin (we don't use hardware CS for this display)
    let cs = Output::new(peripherals.GPIO35, Level::High, OutputConfig::default());

    // 3. Wrap the SPI bus as a SPI device (required by embedded-hal traits)
    let spi_device = ExclusiveDevice::new_no_delay(spi_bus, cs).expect("SPI device");

    // 4. Set up DC (Data/Command) pin
    let dc = Output::new(peripherals.GPIO34, Level::Low, OutputConfig::default());

    // 5. Create a buffer for SPI batching (larger = faster, uses more RAM)
    let mut spi_buffer = [0u8; 512];

    // 6. Create display interface
    let di = SpiInterface::new(spi_device, dc, &mut spi_buffer);

    // 7. Build and initialize the display driver
    let mut display = MipidsiBuilder::new(ILI9342CRgb565, di)
        .display_size(DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX)
        .init(&mut embassy_time::Delay)
        .expect("Failed to initialize display");

    info!("Display initialized!");

    // The render loop owns the display and runs on the main task
    let mut render = RenderOrchestrator::new(&STORE, app_config, &CLOCK, booted_at);
    render.run(&mut display).await
}
