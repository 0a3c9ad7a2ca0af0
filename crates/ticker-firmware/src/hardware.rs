//! Hardware initialization for the ticker device
//!
//! The display rails on the CoreS3 come from the AXP2101 PMIC, and the LCD
//! reset line sits behind the AW9523 expander, so both must be configured
//! over I2C before the panel is touched.

use axp2101_embedded::AsyncAxp2101;
use esp_hal::Async;
use esp_hal::i2c::master::{Config as I2cConfig, I2c};
use esp_hal::time::Rate;
use log::{info, warn};

const AW9523_ADDRESS: u8 = 0x58;

/// P1_1 on the expander drives the LCD reset line.
const LCD_RESET_PIN: u8 = 9;

/// Create the internal I2C bus (400 kHz).
pub fn create_i2c_bus(
    i2c0: esp_hal::peripherals::I2C0<'static>,
    sda: esp_hal::peripherals::GPIO12<'static>,
    scl: esp_hal::peripherals::GPIO11<'static>,
) -> I2c<'static, Async> {
    I2c::new(
        i2c0,
        I2cConfig::default().with_frequency(Rate::from_khz(400)),
    )
    .expect("Failed to configure I2C0")
    .with_sda(sda)
    .with_scl(scl)
    .into_async()
}

/// Power the display and release its reset line.
///
/// Neither chip is needed afterwards, so they borrow the bus in turn instead
/// of sharing it.
pub async fn power_up_display(i2c: &mut I2c<'static, Async>) {
    info!("Configuring power management");
    let mut power_mgmt_chip = AsyncAxp2101::new(&mut *i2c);

    match power_mgmt_chip.init().await {
        Ok(_) => info!("Power management ready"),
        Err(e) => warn!("Power init failed: {:?}", e),
    }

    power_mgmt_chip.enable_aldo1().await.expect("ALDO1");
    power_mgmt_chip.enable_aldo2().await.expect("ALDO2");
    power_mgmt_chip.enable_aldo3().await.expect("ALDO3");
    power_mgmt_chip.enable_aldo4().await.expect("ALDO4");
    power_mgmt_chip.enable_bldo1().await.expect("BLDO1");
    power_mgmt_chip.enable_bldo2().await.expect("BLDO2");
    power_mgmt_chip.enable_dldo1().await.expect("DLDO1");

    // ALDO4 feeds the panel at 3.3 V
    power_mgmt_chip
        .set_aldo4_voltage(3300)
        .await
        .expect("ALDO4 voltage");

    info!("Configuring GPIO expander");
    let mut gpio_expander = aw9523_embedded::r#async::Aw9523Async::new(&mut *i2c, AW9523_ADDRESS);
    gpio_expander.init().await.expect("AW9523 init");
    gpio_expander
        .pin_mode(LCD_RESET_PIN, aw9523_embedded::PinMode::Output)
        .await
        .expect("LCD reset pin mode");
    gpio_expander
        .digital_write(LCD_RESET_PIN, true)
        .await
        .expect("LCD reset release");

    info!("Display power ready");
}
