//! Sampling während einer Serving-Sitzung
//!
//! Pro Tick ein Messwert. Verglichen wird gegen den zuletzt *publizierten*
//! Wert, nicht gegen den letzten Tick, damit langsame Drift irgendwann
//! doch publiziert wird.

use crate::logic::is_significant;
use crate::traits::SensorError;
use crate::types::Reading;

/// Ergebnis eines Ticks
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Sensor-Fehler, letzter Wert bleibt stehen
    ReadFailed(SensorError),
    /// Neuer Messwert, aber keine relevante Änderung
    Unchanged(Reading),
    /// Relevante Änderung, an den Publisher übergeben
    Publish(Reading),
}

/// Zustand des Serving-Samplers
#[derive(Debug, Clone, Copy)]
pub struct ServingSampler {
    last_published: Reading,
    latest: Reading,
}

impl ServingSampler {
    pub fn new() -> Self {
        Self {
            last_published: Reading::UNKNOWN,
            latest: Reading::UNKNOWN,
        }
    }

    /// Startet mit einem bekannten Messwert (z.B. aus dem Quick-Sample)
    pub fn with_latest(latest: Reading) -> Self {
        Self {
            last_published: Reading::UNKNOWN,
            latest,
        }
    }

    pub fn on_tick(&mut self, sample: Result<Reading, SensorError>) -> TickOutcome {
        let reading = match sample {
            Ok(reading) if reading.is_unknown() => {
                return TickOutcome::ReadFailed(SensorError::InvalidData);
            }
            Ok(reading) => reading,
            Err(e) => return TickOutcome::ReadFailed(e),
        };

        self.latest = reading;
        if is_significant(&self.last_published, &reading) {
            self.last_published = reading;
            TickOutcome::Publish(reading)
        } else {
            TickOutcome::Unchanged(reading)
        }
    }

    /// Letzter gültiger Messwert (für Display und `/reading`)
    pub fn latest(&self) -> Reading {
        self.latest
    }

    pub fn last_published(&self) -> Reading {
        self.last_published
    }
}

impl Default for ServingSampler {
    fn default() -> Self {
        Self::new()
    }
}
