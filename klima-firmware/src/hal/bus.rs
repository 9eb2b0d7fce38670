// Geteilter I2C-Bus für Sensor und Display
use core::cell::RefCell;

use embedded_hal_bus::i2c::RefCellDevice;
use esp_hal::Blocking;
use esp_hal::gpio::interconnect::PeripheralOutput;
use esp_hal::i2c::master::{Config as I2cConfig, I2c};
use esp_hal::peripherals::I2C0;
use esp_hal::time::Rate;
use static_cell::StaticCell;

use crate::config::I2C_FREQUENCY_KHZ;

/// Ein Gerät am geteilten Bus
///
/// Alle Geräte leben im selben Task (bzw. in main), daher reicht RefCell.
pub type SharedI2c = RefCellDevice<'static, I2c<'static, Blocking>>;

static I2C_BUS: StaticCell<RefCell<I2c<'static, Blocking>>> = StaticCell::new();

/// Initialisiert I2C0 einmalig und gibt den Bus zurück
pub fn init_i2c_bus(
    i2c0: I2C0<'static>,
    sda: impl PeripheralOutput<'static>,
    scl: impl PeripheralOutput<'static>,
) -> &'static RefCell<I2c<'static, Blocking>> {
    let i2c = I2c::new(
        i2c0,
        I2cConfig::default().with_frequency(Rate::from_khz(I2C_FREQUENCY_KHZ)),
    )
    .expect("Failed to initialize I2C0")
    .with_sda(sda)
    .with_scl(scl);

    I2C_BUS.init(RefCell::new(i2c))
}
