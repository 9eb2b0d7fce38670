//! Duty-Cycle Controller - Zustandsmaschine Wach/Schlafen
//!
//! ```text
//! Booting ─► DecidingWakePath ─┬─► QuickSample ─┬─► EnteringSleep
//!                              │                └─► Serving(Transient) ─► EnteringSleep
//!                              └─► Serving(Session) ──(Low-Power)──────► EnteringSleep
//! ```
//!
//! Der Controller kennt keine Hardware. Er bekommt Messwerte als
//! `Result<Reading, SensorError>`, publiziert über den [`Publisher`]-Trait und
//! schreibt vor dem Schlafen in den [`RetainedState`]. Den eigentlichen
//! Deep-Sleep löst die Firmware mit dem [`SleepRequest`] aus.

use crate::logic::is_significant;
use crate::retained::RetainedState;
use crate::traits::{Publisher, RetainedMemory, SensorError};
use crate::types::{ConfigRecord, DeviceMode, PublishStatus, Reading, WakeCause};

/// Art des Serving-Zustands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServingKind {
    /// Volle Sitzung mit HTTP-API, endet nur auf Bediener-Wunsch
    Session,
    /// Kurz aufgewacht wegen relevanter Änderung, endet nach dem Publish
    Transient,
}

/// Zustände des Controllers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Booting,
    DecidingWakePath,
    QuickSample,
    Serving(ServingKind),
    EnteringSleep,
}

/// Ergebnis eines Quick-Samples
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QuickOutcome {
    /// Keine relevante Änderung (oder Lesefehler): direkt wieder schlafen
    Sleep,
    /// Relevante Änderung: aufwachen und diesen Messwert publizieren
    WakeAndPublish(Reading),
}

/// Auftrag an die Firmware, jetzt in den Deep-Sleep zu gehen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SleepRequest {
    /// Der ins RTC-Memory geschriebene Messwert
    pub reading: Reading,
    /// Wake-Timer in Sekunden
    pub duration_secs: u32,
}

/// Operation im aktuellen Zustand nicht erlaubt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleError {
    InvalidState(CycleState),
}

/// Zustandsmaschine für einen Boot-Zyklus
pub struct DutyCycleController {
    state: CycleState,
    sample_interval_secs: u32,
    /// Messwert aus dem RTC-Memory (bzw. unbekannt)
    previous: Reading,
    /// Der Wert, der beim Schlafen persistiert wird
    current: Reading,
}

impl DutyCycleController {
    pub fn new(sample_interval_secs: u32) -> Self {
        Self {
            state: CycleState::Booting,
            sample_interval_secs,
            previous: Reading::UNKNOWN,
            current: Reading::UNKNOWN,
        }
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    /// Betriebsmodus für Display-Kontrast etc.
    pub fn mode(&self) -> DeviceMode {
        match self.state {
            CycleState::Serving(ServingKind::Session) => DeviceMode::Serving,
            _ => DeviceMode::LowPowerCycling,
        }
    }

    pub fn current_reading(&self) -> Reading {
        self.current
    }

    pub fn sample_interval_secs(&self) -> u32 {
        self.sample_interval_secs
    }

    /// Übernimmt ein geändertes Intervall (gilt für den nächsten Sleep)
    pub fn set_sample_interval(&mut self, secs: u32) {
        self.sample_interval_secs = secs;
    }

    /// Plattform-Init fertig
    pub fn booted(&mut self) -> Result<(), CycleError> {
        self.expect(CycleState::Booting)?;
        self.state = CycleState::DecidingWakePath;
        Ok(())
    }

    /// Entscheidet zwischen Quick-Sample und voller Sitzung
    ///
    /// `restored` ist das Ergebnis von `RetainedState::restore_after_wake`.
    pub fn decide_wake_path(
        &mut self,
        cause: WakeCause,
        operator_asserted: bool,
        restored: Reading,
    ) -> Result<CycleState, CycleError> {
        self.expect(CycleState::DecidingWakePath)?;

        self.previous = restored;
        self.current = restored;
        self.state = match (cause, operator_asserted) {
            (WakeCause::TimerWake, false) => CycleState::QuickSample,
            _ => CycleState::Serving(ServingKind::Session),
        };
        Ok(self.state)
    }

    /// Wertet das eine Sample nach einem Timer-Wake aus
    pub fn quick_sample(
        &mut self,
        sample: Result<Reading, SensorError>,
    ) -> Result<QuickOutcome, CycleError> {
        self.expect(CycleState::QuickSample)?;

        // NaN in einem Feld zählt wie ein Lesefehler
        let reading = match sample {
            Ok(reading) if !reading.is_unknown() => reading,
            Ok(_) | Err(_) => {
                // Alter Wert bleibt erhalten
                self.state = CycleState::EnteringSleep;
                return Ok(QuickOutcome::Sleep);
            }
        };

        self.current = reading;
        if is_significant(&self.previous, &reading) {
            self.state = CycleState::Serving(ServingKind::Transient);
            Ok(QuickOutcome::WakeAndPublish(reading))
        } else {
            self.state = CycleState::EnteringSleep;
            Ok(QuickOutcome::Sleep)
        }
    }

    /// Ein Publish-Versuch im transienten Serving, danach `EnteringSleep`
    ///
    /// Bei deaktiviertem Publishing wird nichts gesendet und
    /// [`PublishStatus::NONE`] zurückgegeben.
    pub async fn publish_change<P: Publisher>(
        &mut self,
        publisher: &mut P,
        config: &ConfigRecord,
    ) -> Result<PublishStatus, CycleError> {
        self.expect(CycleState::Serving(ServingKind::Transient))?;

        let status = if config.publish_enabled {
            publisher.publish(self.current, &config.publish_target).await
        } else {
            PublishStatus::NONE
        };

        self.state = CycleState::EnteringSleep;
        Ok(status)
    }

    /// Bediener fordert Low-Power an (nur aus der Sitzung)
    ///
    /// `latest` ist der letzte Messwert der Sitzung und wird persistiert.
    pub fn request_low_power(&mut self, latest: Reading) -> Result<(), CycleError> {
        self.expect(CycleState::Serving(ServingKind::Session))?;

        if !latest.is_unknown() {
            self.current = latest;
        }
        self.state = CycleState::EnteringSleep;
        Ok(())
    }

    /// Persistiert den aktuellen Messwert und liefert den Sleep-Auftrag
    ///
    /// Der einzige Weg, auf dem der [`RetainedState`] beschrieben wird.
    pub fn enter_sleep<M: RetainedMemory>(
        &mut self,
        retained: &mut RetainedState<M>,
    ) -> Result<SleepRequest, CycleError> {
        self.expect(CycleState::EnteringSleep)?;

        retained.persist_before_sleep(&self.current);
        Ok(SleepRequest {
            reading: self.current,
            duration_secs: self.sample_interval_secs,
        })
    }

    fn expect(&self, state: CycleState) -> Result<(), CycleError> {
        if self.state == state {
            Ok(())
        } else {
            Err(CycleError::InvalidState(self.state))
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for CycleState {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            CycleState::Booting => defmt::write!(fmt, "Booting"),
            CycleState::DecidingWakePath => defmt::write!(fmt, "DecidingWakePath"),
            CycleState::QuickSample => defmt::write!(fmt, "QuickSample"),
            CycleState::Serving(ServingKind::Session) => defmt::write!(fmt, "Serving(Session)"),
            CycleState::Serving(ServingKind::Transient) => {
                defmt::write!(fmt, "Serving(Transient)")
            }
            CycleState::EnteringSleep => defmt::write!(fmt, "EnteringSleep"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for CycleError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            CycleError::InvalidState(state) => defmt::write!(fmt, "invalid in state {}", state),
        }
    }
}
