//! Hardware Abstraction Traits
//!
//! Diese Traits definieren Schnittstellen für Hardware-Zugriff
//! ohne konkrete Implementierung.

use crate::retained::RETAINED_SIZE;
use crate::types::{PublishStatus, PublishTarget, Reading};

/// Fehler-Typ für Zugriffe auf den nichtflüchtigen Speicher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    ReadFailed,
    WriteFailed,
}

/// Fehler-Typ für Sensor-Messungen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// I2C-Transaktion fehlgeschlagen oder Sensor antwortet nicht
    ReadFailed,
    /// Sensor hat geantwortet, aber die Werte sind unplausibel (NaN, CRC, ...)
    InvalidData,
}

/// Fehler-Typ für Display-Operationen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayError {
    WriteFailed,
}

/// Trait für den nichtflüchtigen Konfigurations-Speicher
///
/// Flacher Byte-Bereich an fester Position, genau so groß wie der Record.
///
/// # Implementierungen
/// - **Production:** FlashConfigStorage (esp-storage, Flash-Sektor)
/// - **Testing:** MockConfigStorage (in-memory)
pub trait ConfigStorage {
    /// Größe des Bereichs in Bytes
    fn capacity(&self) -> usize;

    /// Liest `bytes.len()` Bytes ab Offset 0 des Bereichs
    fn read(&mut self, bytes: &mut [u8]) -> Result<(), StorageError>;

    /// Schreibt `bytes` synchron ab Offset 0 des Bereichs
    ///
    /// Der Aufrufer garantiert `bytes.len() <= capacity()`.
    fn write(&mut self, bytes: &[u8]) -> Result<(), StorageError>;
}

/// Trait für das RTC-Memory, das den Deep-Sleep überlebt
///
/// # Implementierungen
/// - **Production:** RtcRetainedMemory (LP-RAM, `#[ram(unstable(rtc_fast, persistent))]`)
/// - **Testing:** MockRetainedMemory
pub trait RetainedMemory {
    fn load(&self) -> [u8; RETAINED_SIZE];
    fn store(&mut self, bytes: &[u8; RETAINED_SIZE]);
}

/// Trait für den Temperatur/Feuchte-Sensor
pub trait Sensor {
    /// Eine Messung, keine Retries
    fn read(&mut self) -> Result<Reading, SensorError>;
}

/// Trait für das Display
pub trait StatusDisplay {
    fn set_contrast(&mut self, contrast: u8) -> Result<(), DisplayError>;

    /// Zeichnet Messwert und Verbindungsstatus (`None` = nicht verbunden)
    fn show(&mut self, reading: &Reading, address: Option<&str>) -> Result<(), DisplayError>;
}

/// Trait für das Publishing an die Zeitreihen-Datenbank
///
/// Ein Versuch, kein Retry. Fehler werden als negativer [`PublishStatus`]
/// gemeldet statt als `Err`, der Status landet unverändert in
/// `/publish/lastResponse`.
pub trait Publisher {
    fn publish(
        &mut self,
        reading: Reading,
        target: &PublishTarget,
    ) -> impl Future<Output = PublishStatus>;
}

#[cfg(feature = "defmt")]
impl defmt::Format for StorageError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            StorageError::ReadFailed => defmt::write!(fmt, "storage read failed"),
            StorageError::WriteFailed => defmt::write!(fmt, "storage write failed"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SensorError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            SensorError::ReadFailed => defmt::write!(fmt, "sensor read failed"),
            SensorError::InvalidData => defmt::write!(fmt, "invalid sensor data"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for DisplayError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            DisplayError::WriteFailed => defmt::write!(fmt, "display write failed"),
        }
    }
}
