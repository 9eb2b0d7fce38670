// Retained Memory im LP-RAM (überlebt den Deep-Sleep)
use core::sync::atomic::{AtomicBool, Ordering};

use klima_core::{RETAINED_SIZE, RetainedMemory};

/// Rohbytes im RTC-Fast-Memory, werden beim Boot NICHT initialisiert
///
/// Inhalt nach Kaltstart undefiniert. Gültigkeit prüft `RetainedState` über
/// den Layout-Tag und den Wake-Grund.
#[esp_hal::ram(unstable(rtc_fast, persistent))]
static mut RETAINED: [u8; RETAINED_SIZE] = [0; RETAINED_SIZE];

static TAKEN: AtomicBool = AtomicBool::new(false);

/// Exklusiver Zugriff auf den RTC-Bereich
pub struct RtcRetainedMemory {
    _private: (),
}

impl RtcRetainedMemory {
    /// Liefert den Zugriff genau einmal
    pub fn take() -> Option<Self> {
        if TAKEN.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(Self { _private: () })
        }
    }
}

impl RetainedMemory for RtcRetainedMemory {
    fn load(&self) -> [u8; RETAINED_SIZE] {
        // SAFETY: einziger Zugriff über dieses Handle (siehe `take`)
        unsafe { core::ptr::read_volatile(&raw const RETAINED) }
    }

    fn store(&mut self, bytes: &[u8; RETAINED_SIZE]) {
        // SAFETY: wie oben
        unsafe { core::ptr::write_volatile(&raw mut RETAINED, *bytes) }
    }
}
