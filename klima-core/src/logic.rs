//! Pure Business Logic Functions
//!
//! Funktionen ohne Hardware-Dependencies (testbar!)

use crate::types::Reading;

/// Temperatur-Schwelle in °C, darunter gilt eine Änderung als Rauschen
pub const TEMPERATURE_THRESHOLD_C: f32 = 0.2;

/// Feuchte-Schwelle in %RH
pub const HUMIDITY_THRESHOLD_PCT: f32 = 1.0;

/// Hysterese: ist `candidate` gegenüber `previous` eine relevante Änderung?
///
/// - `previous` unbekannt → immer relevant (erstes Reading)
/// - sonst relevant, wenn Temperatur um mehr als 0.2 °C oder Feuchte um mehr
///   als 1 %RH abweicht
///
/// Ein unbekannter `candidate` ist gegenüber einem bekannten Wert nie relevant
/// (NaN-Vergleiche sind `false`).
///
/// # Beispiele
///
/// ```
/// # use klima_core::{Reading, is_significant};
/// let previous = Reading::new(20.0, 50.0);
/// assert!(!is_significant(&previous, &Reading::new(20.1, 50.0)));
/// assert!(is_significant(&previous, &Reading::new(20.3, 50.0)));
/// assert!(is_significant(&Reading::UNKNOWN, &previous));
/// assert!(!is_significant(&previous, &Reading::UNKNOWN));
/// ```
pub fn is_significant(previous: &Reading, candidate: &Reading) -> bool {
    if previous.is_unknown() {
        return true;
    }

    let delta_t = abs_diff(candidate.temperature_c, previous.temperature_c);
    let delta_h = abs_diff(candidate.humidity_pct, previous.humidity_pct);

    delta_t > TEMPERATURE_THRESHOLD_C || delta_h > HUMIDITY_THRESHOLD_PCT
}

// no_std: kein libm, daher Betrag von Hand
fn abs_diff(a: f32, b: f32) -> f32 {
    let d = a - b;
    if d < 0.0 { -d } else { d }
}
