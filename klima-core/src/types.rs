//! Core Types für den Klima-Sensor
//!
//! Datenstrukturen ohne Hardware-Dependencies

use heapless::String;
use serde::{Deserialize, Serialize};

/// Maximale Länge des Influx-Hostnamens (wie das alte `char[20]` ohne Terminator)
pub const HOST_CAPACITY: usize = 19;
/// Maximale Länge des Datenbank-Namens
pub const DATABASE_CAPACITY: usize = 19;
/// Maximale Länge des Series-Namens (Measurement)
pub const SERIES_CAPACITY: usize = 19;
/// Maximale Länge des Tag-Strings (z.B. "name=Sensor 1")
pub const TAGS_CAPACITY: usize = 29;

/// Obergrenze für das Sample-Intervall (ein Tag)
pub const MAX_SAMPLE_INTERVAL_SECS: u32 = 86_400;

// ============================================================================
// Sensor-Messwert
// ============================================================================

/// Temperatur/Luftfeuchte-Messwert
///
/// "Unbekannt" wird als NaN dargestellt (vor dem ersten gültigen Sample oder
/// nach einem Wake ohne erhaltenes RTC-Memory). Deshalb kein `Eq` - zwei
/// unbekannte Readings sind nicht gleich, geprüft wird mit [`Reading::is_unknown`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

impl Reading {
    /// Sentinel für "noch kein Messwert"
    pub const UNKNOWN: Self = Self {
        temperature_c: f32::NAN,
        humidity_pct: f32::NAN,
    };

    pub const fn new(temperature_c: f32, humidity_pct: f32) -> Self {
        Self {
            temperature_c,
            humidity_pct,
        }
    }

    /// `true` wenn mindestens ein Feld NaN ist
    pub fn is_unknown(&self) -> bool {
        self.temperature_c.is_nan() || self.humidity_pct.is_nan()
    }
}

impl Default for Reading {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

// ============================================================================
// Laufzeit-Zustände
// ============================================================================

/// Betriebsmodus des Geräts (nur zur Laufzeit, wird nicht persistiert)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceMode {
    /// Display, WiFi und HTTP-API aktiv
    Serving,
    /// Alles abgeschaltet, Gerät schläft zwischen den Samples
    LowPowerCycling,
}

/// Grund für den aktuellen Boot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeCause {
    /// Power-On, Reset, Firmware-Update, Watchdog, ...
    ColdBoot,
    /// Deep-Sleep-Timer abgelaufen
    TimerWake,
    /// Deep-Sleep durch den Bedien-Taster beendet
    OperatorWake,
}

/// Wake-Quelle wie sie die Plattform meldet (bereits auf das Nötigste reduziert)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeSource {
    Timer,
    OperatorPin,
    Other,
}

impl WakeCause {
    /// Leitet die WakeCause aus Reset-Grund und Wake-Quelle ab
    ///
    /// Nur ein Reset aus dem Deep-Sleep kann Timer- oder Operator-Wake sein,
    /// alles andere ist ein Kaltstart.
    pub fn classify(deep_sleep_reset: bool, source: WakeSource) -> Self {
        match (deep_sleep_reset, source) {
            (true, WakeSource::Timer) => WakeCause::TimerWake,
            (true, WakeSource::OperatorPin) => WakeCause::OperatorWake,
            _ => WakeCause::ColdBoot,
        }
    }
}

/// Status des letzten Publish-Versuchs
///
/// Positive Werte sind HTTP-Statuscodes der Datenbank, negative Werte
/// lokale Fehler, 0 heißt "noch kein Versuch".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PublishStatus(pub i16);

impl PublishStatus {
    pub const NONE: Self = Self(0);
    pub const CONNECTION_FAILED: Self = Self(-1);
    pub const DNS_FAILED: Self = Self(-2);
    pub const TIMEOUT: Self = Self(-3);
    pub const MALFORMED_REPLY: Self = Self(-4);
    pub const REQUEST_TOO_LARGE: Self = Self(-5);
    pub const UNKNOWN_READING: Self = Self(-6);

    pub const fn code(self) -> i16 {
        self.0
    }

    pub const fn is_success(self) -> bool {
        self.0 >= 200 && self.0 < 300
    }
}

// ============================================================================
// Persistierte Konfiguration
// ============================================================================

/// Ziel für das Publishing (InfluxDB 1.x HTTP API)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishTarget {
    pub host: String<HOST_CAPACITY>,
    pub port: u16,
    pub database: String<DATABASE_CAPACITY>,
    pub series: String<SERIES_CAPACITY>,
    pub tags: String<TAGS_CAPACITY>,
}

/// Vom Benutzer einstellbare Parameter
///
/// Der Schema-Tag steht nicht im Struct, sondern in den ersten Bytes des
/// Storage-Layouts (siehe `config_store`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRecord {
    pub sample_interval_secs: u32,
    pub low_power_contrast: u8,
    pub normal_contrast: u8,
    pub publish_enabled: bool,
    pub publish_target: PublishTarget,
}

impl ConfigRecord {
    /// Display-Kontrast für den jeweiligen Betriebsmodus
    pub fn contrast_for(&self, mode: DeviceMode) -> u8 {
        match mode {
            DeviceMode::Serving => self.normal_contrast,
            DeviceMode::LowPowerCycling => self.low_power_contrast,
        }
    }
}

impl Default for PublishTarget {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 8086,
            database: String::new(),
            series: String::try_from("climate").unwrap_or_default(),
            tags: String::try_from("name=Sensor 1").unwrap_or_default(),
        }
    }
}

/// Einkompilierte Defaults (werden bei unbekanntem Schema-Tag geschrieben)
impl Default for ConfigRecord {
    fn default() -> Self {
        Self {
            sample_interval_secs: 10,
            low_power_contrast: 16,
            normal_contrast: 255,
            publish_enabled: false,
            publish_target: PublishTarget::default(),
        }
    }
}

// ============================================================================
// defmt::Format Implementations (optional feature)
// ============================================================================

#[cfg(feature = "defmt")]
impl defmt::Format for Reading {
    fn format(&self, fmt: defmt::Formatter) {
        if self.is_unknown() {
            defmt::write!(fmt, "Reading {{ unknown }}")
        } else {
            defmt::write!(
                fmt,
                "Reading {{ {=f32} °C, {=f32} % }}",
                self.temperature_c,
                self.humidity_pct
            )
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for DeviceMode {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            DeviceMode::Serving => defmt::write!(fmt, "Serving"),
            DeviceMode::LowPowerCycling => defmt::write!(fmt, "LowPowerCycling"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for WakeCause {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            WakeCause::ColdBoot => defmt::write!(fmt, "ColdBoot"),
            WakeCause::TimerWake => defmt::write!(fmt, "TimerWake"),
            WakeCause::OperatorWake => defmt::write!(fmt, "OperatorWake"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for PublishStatus {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "PublishStatus({=i16})", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConfigRecord {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "ConfigRecord {{ interval: {=u32}s, contrast: {=u8}/{=u8}, publish: {=bool} -> {=str}:{=u16}/{=str} }}",
            self.sample_interval_secs,
            self.normal_contrast,
            self.low_power_contrast,
            self.publish_enabled,
            self.publish_target.host.as_str(),
            self.publish_target.port,
            self.publish_target.database.as_str()
        )
    }
}
