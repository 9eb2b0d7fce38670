// Library-Root: Wiederverwendbare Logik und Module
// Keine Standard-Bibliothek (Embedded System)
#![no_std]

extern crate alloc;

// Module
pub mod config;
pub mod hal;
pub mod settings;
pub mod tasks;
pub mod web;

use core::cell::Cell;

// Re-exports von klima-core
pub use klima_core::{ConfigRecord, DeviceMode, PublishStatus, Reading};

// Embassy Sync-Typen
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::{CriticalSectionRawMutex, NoopRawMutex};
use embassy_sync::channel::{Channel, Receiver, Sender};
use embassy_sync::signal::Signal;
use embassy_sync::watch::{Receiver as WatchReceiver, Watch};

use crate::config::PUBLISH_QUEUE_SIZE;

// ============================================================================
// Lifecycle-Kommandos (HTTP → Supervisor in main)
// ============================================================================

/// Vom Bediener über HTTP ausgelöste Zustandswechsel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleCommand {
    /// WiFi vergessen und neu starten
    ResetWifi,
    /// Defaults geschrieben, WiFi vergessen und neu starten
    FactoryReset,
    /// Low-Power-Kontrast setzen und sofort schlafen
    LowPower,
}

impl defmt::Format for LifecycleCommand {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            LifecycleCommand::ResetWifi => defmt::write!(fmt, "ResetWifi"),
            LifecycleCommand::FactoryReset => defmt::write!(fmt, "FactoryReset"),
            LifecycleCommand::LowPower => defmt::write!(fmt, "LowPower"),
        }
    }
}

// ============================================================================
// Type-Aliase für Channel-Typen
// ============================================================================

/// Channel für Lifecycle-Kommandos (HTTP Tasks → main)
pub type CommandChannel = Channel<NoopRawMutex, LifecycleCommand, 2>;
pub type CommandSender = Sender<'static, NoopRawMutex, LifecycleCommand, 2>;
pub type CommandReceiver = Receiver<'static, NoopRawMutex, LifecycleCommand, 2>;

/// Channel für zu publizierende Messwerte (Sampling → Publish Task)
/// Voll = Messwert wird verworfen, Sampling wartet nie auf das Netzwerk
pub type PublishChannel = Channel<NoopRawMutex, Reading, PUBLISH_QUEUE_SIZE>;
pub type PublishSender = Sender<'static, NoopRawMutex, Reading, PUBLISH_QUEUE_SIZE>;
pub type PublishReceiver = Receiver<'static, NoopRawMutex, Reading, PUBLISH_QUEUE_SIZE>;

/// Read-only Snapshots des ConfigRecords
/// - 3 Receiver: Sampling, Publish, Reserve
pub const CONFIG_RECEIVERS: usize = 3;
pub type ConfigWatch = Watch<CriticalSectionRawMutex, ConfigRecord, CONFIG_RECEIVERS>;
pub type ConfigReceiver = WatchReceiver<'static, CriticalSectionRawMutex, ConfigRecord, CONFIG_RECEIVERS>;

// ============================================================================
// Geteilter Zustand
// ============================================================================

/// Letzter gültiger Messwert (Writer: Sampling, Reader: HTTP + Supervisor)
static LATEST_READING: Mutex<CriticalSectionRawMutex, Cell<Reading>> =
    Mutex::new(Cell::new(Reading::UNKNOWN));

/// Status des letzten Publish-Versuchs für `/publish/lastResponse`
static LAST_PUBLISH_STATUS: Mutex<CriticalSectionRawMutex, Cell<PublishStatus>> =
    Mutex::new(Cell::new(PublishStatus::NONE));

/// Supervisor → Sampling: Display auf anderen Modus umstellen
pub static DISPLAY_MODE: Signal<CriticalSectionRawMutex, DeviceMode> = Signal::new();

/// Sampling → Supervisor: Display umgestellt
pub static DISPLAY_ACK: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Supervisor → WiFi: Verbindung trennen (vor dem Neustart)
pub static WIFI_FORGET: Signal<CriticalSectionRawMutex, ()> = Signal::new();

pub fn latest_reading() -> Reading {
    LATEST_READING.lock(|cell| cell.get())
}

pub fn set_latest_reading(reading: Reading) {
    LATEST_READING.lock(|cell| cell.set(reading));
}

pub fn last_publish_status() -> PublishStatus {
    LAST_PUBLISH_STATUS.lock(|cell| cell.get())
}

pub fn set_last_publish_status(status: PublishStatus) {
    LAST_PUBLISH_STATUS.lock(|cell| cell.set(status));
}
