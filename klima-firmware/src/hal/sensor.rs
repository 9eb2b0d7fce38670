// SHT4x Temperatur/Feuchte-Sensor
use defmt::{Debug2Format, warn};
use esp_hal::delay::Delay;
use klima_core::{Reading, Sensor, SensorError};
use sht4x::{Precision, Sht4x};

use super::SharedI2c;

/// SHT4x am geteilten I2C-Bus (Default-Adresse 0x44)
pub struct ShtSensor {
    sht: Sht4x<SharedI2c, Delay>,
    delay: Delay,
}

impl ShtSensor {
    pub fn new(i2c: SharedI2c) -> Self {
        Self {
            sht: Sht4x::new(i2c),
            delay: Delay::new(),
        }
    }
}

impl Sensor for ShtSensor {
    fn read(&mut self) -> Result<Reading, SensorError> {
        let measurement = self
            .sht
            .measure(Precision::High, &mut self.delay)
            .map_err(|e| {
                warn!("Sampling: SHT4x measurement failed: {}", Debug2Format(&e));
                SensorError::ReadFailed
            })?;

        // Die Umrechnungsformel des SHT4x kann leicht über 100 %RH liefern
        let reading = Reading::new(
            measurement.temperature_celsius().to_num::<f32>(),
            measurement.humidity_percent().to_num::<f32>().clamp(0.0, 100.0),
        );

        if reading.is_unknown() {
            return Err(SensorError::InvalidData);
        }
        Ok(reading)
    }
}
