// SSD1306 OLED (128x64) - Messwert und Verbindungsstatus
use core::fmt::Write;

use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::mono_font::iso_8859_1::{FONT_6X10, FONT_10X20};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};
use heapless::String;
use klima_core::{DisplayError, Reading, StatusDisplay};
use ssd1306::mode::BufferedGraphicsMode;
use ssd1306::prelude::*;
use ssd1306::{I2CDisplayInterface, Ssd1306};

use super::SharedI2c;

type Driver = Ssd1306<
    I2CInterface<SharedI2c>,
    DisplaySize128x64,
    BufferedGraphicsMode<DisplaySize128x64>,
>;

/// Precharge-Periode für `Brightness::custom` (1..=15)
const PRECHARGE: u8 = 1;

pub struct OledDisplay {
    driver: Driver,
}

impl OledDisplay {
    pub fn new(i2c: SharedI2c) -> Result<Self, DisplayError> {
        let interface = I2CDisplayInterface::new(i2c);
        let mut driver = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
            .into_buffered_graphics_mode();
        driver.init().map_err(|_| DisplayError::WriteFailed)?;
        Ok(Self { driver })
    }
}

impl StatusDisplay for OledDisplay {
    fn set_contrast(&mut self, contrast: u8) -> Result<(), DisplayError> {
        self.driver
            .set_brightness(Brightness::custom(PRECHARGE, contrast))
            .map_err(|_| DisplayError::WriteFailed)
    }

    fn show(&mut self, reading: &Reading, address: Option<&str>) -> Result<(), DisplayError> {
        let large = MonoTextStyle::new(&FONT_10X20, BinaryColor::On);
        let small = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);

        let mut temperature: String<16> = String::new();
        let mut humidity: String<16> = String::new();
        if reading.is_unknown() {
            temperature.push_str("--.- °C").ok();
            humidity.push_str("-- %").ok();
        } else {
            write!(temperature, "{:.1} °C", reading.temperature_c)
                .map_err(|_| DisplayError::WriteFailed)?;
            write!(humidity, "{:.0} %", reading.humidity_pct)
                .map_err(|_| DisplayError::WriteFailed)?;
        }

        self.driver.clear_buffer();
        let lines = [
            (temperature.as_str(), Point::new(0, 0), large),
            (humidity.as_str(), Point::new(0, 24), large),
            (address.unwrap_or("Not connected"), Point::new(0, 52), small),
        ];
        for (text, position, style) in lines {
            Text::with_baseline(text, position, style, Baseline::Top)
                .draw(&mut self.driver)
                .map_err(|_| DisplayError::WriteFailed)?;
        }

        self.driver.flush().map_err(|_| DisplayError::WriteFailed)
    }
}
