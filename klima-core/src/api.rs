//! Settings-API - JSON-Sicht auf den ConfigRecord
//!
//! Die HTTP-Handler in der Firmware reichen nur Bytes durch. Parsen,
//! Mergen, Validieren, Speichern und Rendern passiert hier, damit alles auf
//! dem Host testbar bleibt.
//!
//! # JSON-Format
//!
//! ```json
//! {
//!   "sampleIntervalSeconds": 10,
//!   "lowPowerDisplayContrast": 16,
//!   "normalDisplayContrast": 255,
//!   "publishEnabled": false,
//!   "publishTarget": { "host": "", "port": 8086, "database": "",
//!                      "series": "climate", "tags": "name=Sensor 1" }
//! }
//! ```
//!
//! Ein Update darf beliebige Teilmengen davon enthalten, fehlende Felder
//! behalten ihren aktuellen Wert.

use serde::{Deserialize, Serialize};

use crate::config_store::{ConfigError, ConfigStore};
use crate::traits::{ConfigStorage, StorageError};
use crate::types::{ConfigRecord, PublishStatus, Reading};
use crate::validation::{Candidate, ValidationError, validate_update};

/// Fehler beim Verarbeiten eines Settings-Requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsError {
    /// Body ist kein gültiges JSON für ein Update
    Malformed,
    /// Wert abgelehnt, nichts gespeichert
    Invalid(ValidationError),
    /// Speicher nicht beschreibbar
    Storage(StorageError),
    /// Antwort passt nicht in den Puffer
    ResponseTooLarge,
}

impl SettingsError {
    pub fn status_code(&self) -> u16 {
        match self {
            SettingsError::Malformed | SettingsError::Invalid(_) => 400,
            SettingsError::Storage(_) | SettingsError::ResponseTooLarge => 500,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            SettingsError::Malformed => "malformed JSON",
            SettingsError::Invalid(e) => e.message(),
            SettingsError::Storage(_) => "storage write failed",
            SettingsError::ResponseTooLarge => "response too large",
        }
    }
}

impl From<ConfigError> for SettingsError {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::Validation(e) => SettingsError::Invalid(e),
            ConfigError::Storage(e) => SettingsError::Storage(e),
        }
    }
}

impl From<ValidationError> for SettingsError {
    fn from(e: ValidationError) -> Self {
        SettingsError::Invalid(e)
    }
}

// ============================================================================
// Eingehend: Teil-Update
// ============================================================================

/// Teil-Update des Records, alle Felder optional
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SettingsUpdate<'a> {
    pub sample_interval_seconds: Option<u32>,
    pub low_power_display_contrast: Option<u8>,
    pub normal_display_contrast: Option<u8>,
    pub publish_enabled: Option<bool>,
    #[serde(borrow)]
    pub publish_target: Option<PublishTargetUpdate<'a>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PublishTargetUpdate<'a> {
    #[serde(borrow)]
    pub host: Option<&'a str>,
    pub port: Option<u16>,
    #[serde(borrow)]
    pub database: Option<&'a str>,
    #[serde(borrow)]
    pub series: Option<&'a str>,
    #[serde(borrow)]
    pub tags: Option<&'a str>,
}

/// Parst einen Request-Body
pub fn parse_update(body: &[u8]) -> Result<SettingsUpdate<'_>, SettingsError> {
    serde_json_core::from_slice(body)
        .map(|(update, _)| update)
        .map_err(|_| SettingsError::Malformed)
}

impl<'a> SettingsUpdate<'a> {
    /// Legt das Update über den aktuellen Record
    pub fn apply_to<'r>(&self, current: &'r ConfigRecord) -> Candidate<'r>
    where
        'a: 'r,
    {
        let base = current.candidate();
        let target = self.publish_target.as_ref();

        Candidate {
            sample_interval_secs: self
                .sample_interval_seconds
                .unwrap_or(base.sample_interval_secs),
            low_power_contrast: self
                .low_power_display_contrast
                .unwrap_or(base.low_power_contrast),
            normal_contrast: self
                .normal_display_contrast
                .unwrap_or(base.normal_contrast),
            publish_enabled: self.publish_enabled.unwrap_or(base.publish_enabled),
            host: target.and_then(|t| t.host).unwrap_or(base.host),
            port: target.and_then(|t| t.port).unwrap_or(base.port),
            database: target.and_then(|t| t.database).unwrap_or(base.database),
            series: target.and_then(|t| t.series).unwrap_or(base.series),
            tags: target.and_then(|t| t.tags).unwrap_or(base.tags),
        }
    }
}

/// Parst, merged, validiert und speichert ein Update
///
/// Bei jedem Fehler bleibt der Speicher unberührt. Bei Erfolg ist der neue
/// Record bereits persistiert.
pub fn apply_settings<S: ConfigStorage>(
    store: &mut ConfigStore<S>,
    current: &ConfigRecord,
    body: &[u8],
) -> Result<ConfigRecord, SettingsError> {
    let update = parse_update(body)?;
    let candidate = update.apply_to(current);

    validate_update(&candidate)?;
    let record = candidate.to_record()?;
    store.save(&record)?;

    Ok(record)
}

// ============================================================================
// Ausgehend: JSON-Antworten
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SettingsView<'a> {
    sample_interval_seconds: u32,
    low_power_display_contrast: u8,
    normal_display_contrast: u8,
    publish_enabled: bool,
    publish_target: TargetView<'a>,
}

#[derive(Serialize)]
struct TargetView<'a> {
    host: &'a str,
    port: u16,
    database: &'a str,
    series: &'a str,
    tags: &'a str,
}

#[derive(Serialize)]
struct ErrorView<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'a str>,
    message: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReadingView {
    temperature_c: Option<f32>,
    humidity_pct: Option<f32>,
}

#[derive(Serialize)]
struct StatusView {
    status: i16,
}

fn render<T: Serialize>(value: &T, buf: &mut [u8]) -> Result<usize, SettingsError> {
    serde_json_core::to_slice(value, buf).map_err(|_| SettingsError::ResponseTooLarge)
}

/// Record als JSON, liefert die Anzahl geschriebener Bytes
pub fn render_settings(record: &ConfigRecord, buf: &mut [u8]) -> Result<usize, SettingsError> {
    let target = &record.publish_target;
    render(
        &SettingsView {
            sample_interval_seconds: record.sample_interval_secs,
            low_power_display_contrast: record.low_power_contrast,
            normal_display_contrast: record.normal_contrast,
            publish_enabled: record.publish_enabled,
            publish_target: TargetView {
                host: &target.host,
                port: target.port,
                database: &target.database,
                series: &target.series,
                tags: &target.tags,
            },
        },
        buf,
    )
}

/// Fehler als JSON (`{"field":"...","message":"..."}`)
pub fn render_error(error: &SettingsError, buf: &mut [u8]) -> Result<usize, SettingsError> {
    let field = match error {
        SettingsError::Invalid(e) => Some(e.field.as_str()),
        _ => None,
    };
    render(
        &ErrorView {
            field,
            message: error.message(),
        },
        buf,
    )
}

/// Messwert als JSON, unbekannte Werte als `null`
pub fn render_reading(reading: &Reading, buf: &mut [u8]) -> Result<usize, SettingsError> {
    let known = |v: f32| if v.is_nan() { None } else { Some(v) };
    render(
        &ReadingView {
            temperature_c: known(reading.temperature_c),
            humidity_pct: known(reading.humidity_pct),
        },
        buf,
    )
}

/// Status des letzten Publish-Versuchs als JSON (`{"status":204}`)
pub fn render_publish_status(status: PublishStatus, buf: &mut [u8]) -> Result<usize, SettingsError> {
    render(
        &StatusView {
            status: status.code(),
        },
        buf,
    )
}

#[cfg(feature = "defmt")]
impl defmt::Format for SettingsError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            SettingsError::Invalid(e) => defmt::write!(fmt, "invalid: {}", e),
            other => defmt::write!(fmt, "{=str}", other.message()),
        }
    }
}
