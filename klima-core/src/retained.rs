//! Retained State - letzter Messwert über den Deep-Sleep hinweg
//!
//! Layout im RTC-Memory (16 Bytes, little endian):
//!
//! | Offset | Inhalt                |
//! |--------|-----------------------|
//! | 0..4   | Layout-Tag            |
//! | 4..8   | Temperatur (f32)      |
//! | 8..12  | Feuchte (f32)         |
//! | 12..16 | reserviert (0)        |
//!
//! Keine Prüfsumme: ein korrupter Payload mit gültigem Tag wird so
//! zurückgegeben wie er ist.

use crate::traits::RetainedMemory;
use crate::types::{Reading, WakeCause};

/// Größe des RTC-Bereichs in Bytes
pub const RETAINED_SIZE: usize = 16;

/// Layout-Version "KLR1"
pub const RETAINED_LAYOUT_TAG: u32 = 0x4b4c_5231;

/// Serialisiert ein Reading in das RTC-Layout
pub fn encode_reading(reading: &Reading) -> [u8; RETAINED_SIZE] {
    let mut bytes = [0u8; RETAINED_SIZE];
    bytes[0..4].copy_from_slice(&RETAINED_LAYOUT_TAG.to_le_bytes());
    bytes[4..8].copy_from_slice(&reading.temperature_c.to_le_bytes());
    bytes[8..12].copy_from_slice(&reading.humidity_pct.to_le_bytes());
    bytes
}

/// Liest ein Reading aus dem RTC-Layout, `None` bei fremdem Layout-Tag
pub fn decode_reading(bytes: &[u8; RETAINED_SIZE]) -> Option<Reading> {
    if le_u32(&bytes[0..4]) != RETAINED_LAYOUT_TAG {
        return None;
    }

    Some(Reading {
        temperature_c: f32::from_bits(le_u32(&bytes[4..8])),
        humidity_pct: f32::from_bits(le_u32(&bytes[8..12])),
    })
}

fn le_u32(bytes: &[u8]) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(bytes);
    u32::from_le_bytes(word)
}

/// Zugriff auf das RTC-Memory
///
/// Gehört exklusiv dem `DutyCycleController`.
pub struct RetainedState<M: RetainedMemory> {
    memory: M,
}

impl<M: RetainedMemory> RetainedState<M> {
    pub fn new(memory: M) -> Self {
        Self { memory }
    }

    /// Schreibt den Messwert ins RTC-Memory
    ///
    /// Muss die letzte Aktion vor dem Deep-Sleep sein.
    pub fn persist_before_sleep(&mut self, reading: &Reading) {
        self.memory.store(&encode_reading(reading));
    }

    /// Liefert den gespeicherten Messwert, aber nur nach einem Timer-Wake
    ///
    /// Nur der Timer-Wake kommt garantiert aus dem Deep-Sleep, der das
    /// RTC-Memory erhält. In allen anderen Fällen ist der Inhalt undefiniert
    /// und das Ergebnis ist [`Reading::UNKNOWN`].
    pub fn restore_after_wake(&self, cause: WakeCause) -> Reading {
        match cause {
            WakeCause::TimerWake => decode_reading(&self.memory.load()).unwrap_or(Reading::UNKNOWN),
            WakeCause::ColdBoot | WakeCause::OperatorWake => Reading::UNKNOWN,
        }
    }

    pub fn memory(&self) -> &M {
        &self.memory
    }
}
