//! Validierung von Konfigurations-Kandidaten
//!
//! Geordnete Liste von Validatoren, jeder prüft genau ein Feld und meldet
//! bei Verletzung das Feld zurück. Ausgewertet wird von links nach rechts,
//! der erste Fehler bricht ab.

use heapless::String;

use crate::types::{ConfigRecord, MAX_SAMPLE_INTERVAL_SECS, PublishTarget};
use crate::types::{DATABASE_CAPACITY, HOST_CAPACITY, SERIES_CAPACITY, TAGS_CAPACITY};

/// Feld-Bezeichner wie sie in der JSON-API heißen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    SampleIntervalSeconds,
    PublishHost,
    PublishPort,
    PublishDatabase,
    PublishSeries,
    PublishTags,
    /// Der gesamte Record (z.B. passt nicht in den Speicherbereich)
    Record,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Field::SampleIntervalSeconds => "sampleIntervalSeconds",
            Field::PublishHost => "publishTarget.host",
            Field::PublishPort => "publishTarget.port",
            Field::PublishDatabase => "publishTarget.database",
            Field::PublishSeries => "publishTarget.series",
            Field::PublishTags => "publishTarget.tags",
            Field::Record => "record",
        }
    }
}

/// Art der Verletzung
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// Pflichtfeld leer (bei aktiviertem Publishing)
    Empty,
    /// String länger als der Speicherplatz
    TooLong,
    /// Zahl außerhalb des erlaubten Bereichs
    OutOfRange,
    /// Kodierter Record größer als der Speicherbereich
    ExceedsStorage,
    /// Escape-Sequenz im String (wird beim Parsen nicht aufgelöst)
    Escaped,
}

/// Abgelehnte Konfiguration mit betroffenem Feld
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationError {
    pub field: Field,
    pub violation: Violation,
}

impl ValidationError {
    pub const fn new(field: Field, violation: Violation) -> Self {
        Self { field, violation }
    }

    /// Kurzbeschreibung für die HTTP-Antwort
    pub fn message(&self) -> &'static str {
        match self.violation {
            Violation::Empty => "must not be empty when publishing is enabled",
            Violation::TooLong => "too long",
            Violation::OutOfRange => "out of range",
            Violation::ExceedsStorage => "does not fit into storage",
            Violation::Escaped => "escape sequences are not supported",
        }
    }
}

/// Konfigurations-Kandidat mit geliehenen Strings
///
/// Strings sind hier noch unbegrenzt (`&str`), damit zu lange Werte als
/// Feld-Fehler gemeldet werden können statt als Parse-Fehler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate<'a> {
    pub sample_interval_secs: u32,
    pub low_power_contrast: u8,
    pub normal_contrast: u8,
    pub publish_enabled: bool,
    pub host: &'a str,
    pub port: u16,
    pub database: &'a str,
    pub series: &'a str,
    pub tags: &'a str,
}

impl ConfigRecord {
    /// Sicht auf den Record als Kandidat (für Validierung und Merge)
    pub fn candidate(&self) -> Candidate<'_> {
        Candidate {
            sample_interval_secs: self.sample_interval_secs,
            low_power_contrast: self.low_power_contrast,
            normal_contrast: self.normal_contrast,
            publish_enabled: self.publish_enabled,
            host: self.publish_target.host.as_str(),
            port: self.publish_target.port,
            database: self.publish_target.database.as_str(),
            series: self.publish_target.series.as_str(),
            tags: self.publish_target.tags.as_str(),
        }
    }
}

impl Candidate<'_> {
    /// Wandelt den Kandidaten in einen Record um
    ///
    /// Nur nach erfolgreicher Validierung aufrufen; zu lange Strings werden
    /// trotzdem als `TooLong` gemeldet statt abgeschnitten.
    pub fn to_record(&self) -> Result<ConfigRecord, ValidationError> {
        Ok(ConfigRecord {
            sample_interval_secs: self.sample_interval_secs,
            low_power_contrast: self.low_power_contrast,
            normal_contrast: self.normal_contrast,
            publish_enabled: self.publish_enabled,
            publish_target: PublishTarget {
                host: bounded(self.host, Field::PublishHost)?,
                port: self.port,
                database: bounded(self.database, Field::PublishDatabase)?,
                series: bounded(self.series, Field::PublishSeries)?,
                tags: bounded(self.tags, Field::PublishTags)?,
            },
        })
    }
}

fn bounded<const N: usize>(value: &str, field: Field) -> Result<String<N>, ValidationError> {
    String::try_from(value).map_err(|_| ValidationError::new(field, Violation::TooLong))
}

// ============================================================================
// Validatoren
// ============================================================================

pub type Validator = fn(&Candidate<'_>) -> Result<(), ValidationError>;

/// Strukturelle Prüfungen: Wertebereiche und String-Kapazitäten
pub const STRUCTURAL: &[Validator] = &[
    sample_interval_in_range,
    host_fits,
    database_fits,
    series_fits,
    tags_fits,
];

/// Feldübergreifende Prüfungen, nur für Updates über die API
pub const CROSS_FIELD: &[Validator] = &[
    publish_host_present,
    publish_database_present,
    publish_series_present,
    publish_port_present,
];

/// Wendet die Validatoren der Reihe nach an, erster Fehler gewinnt
pub fn run(validators: &[Validator], candidate: &Candidate<'_>) -> Result<(), ValidationError> {
    validators.iter().try_for_each(|validate| validate(candidate))
}

/// Prüfung für gespeicherte Records (Load/Save)
pub fn validate_structure(candidate: &Candidate<'_>) -> Result<(), ValidationError> {
    run(STRUCTURAL, candidate)
}

/// Prüfung für Updates über die API: erst strukturell, dann feldübergreifend
pub fn validate_update(candidate: &Candidate<'_>) -> Result<(), ValidationError> {
    run(STRUCTURAL, candidate)?;
    run(CROSS_FIELD, candidate)
}

fn sample_interval_in_range(c: &Candidate<'_>) -> Result<(), ValidationError> {
    if c.sample_interval_secs == 0 || c.sample_interval_secs > MAX_SAMPLE_INTERVAL_SECS {
        return Err(ValidationError::new(
            Field::SampleIntervalSeconds,
            Violation::OutOfRange,
        ));
    }
    Ok(())
}

fn fits(value: &str, capacity: usize, field: Field) -> Result<(), ValidationError> {
    if value.len() > capacity {
        return Err(ValidationError::new(field, Violation::TooLong));
    }
    // serde-json-core liefert geliehene Strings roh, `\"` bliebe sonst stehen
    if value.contains('\\') {
        return Err(ValidationError::new(field, Violation::Escaped));
    }
    Ok(())
}

fn host_fits(c: &Candidate<'_>) -> Result<(), ValidationError> {
    fits(c.host, HOST_CAPACITY, Field::PublishHost)
}

fn database_fits(c: &Candidate<'_>) -> Result<(), ValidationError> {
    fits(c.database, DATABASE_CAPACITY, Field::PublishDatabase)
}

fn series_fits(c: &Candidate<'_>) -> Result<(), ValidationError> {
    fits(c.series, SERIES_CAPACITY, Field::PublishSeries)
}

fn tags_fits(c: &Candidate<'_>) -> Result<(), ValidationError> {
    fits(c.tags, TAGS_CAPACITY, Field::PublishTags)
}

fn required(enabled: bool, value: &str, field: Field) -> Result<(), ValidationError> {
    if enabled && value.is_empty() {
        return Err(ValidationError::new(field, Violation::Empty));
    }
    Ok(())
}

fn publish_host_present(c: &Candidate<'_>) -> Result<(), ValidationError> {
    required(c.publish_enabled, c.host, Field::PublishHost)
}

fn publish_database_present(c: &Candidate<'_>) -> Result<(), ValidationError> {
    required(c.publish_enabled, c.database, Field::PublishDatabase)
}

fn publish_series_present(c: &Candidate<'_>) -> Result<(), ValidationError> {
    required(c.publish_enabled, c.series, Field::PublishSeries)
}

fn publish_port_present(c: &Candidate<'_>) -> Result<(), ValidationError> {
    if c.publish_enabled && c.port == 0 {
        return Err(ValidationError::new(Field::PublishPort, Violation::OutOfRange));
    }
    Ok(())
}

#[cfg(feature = "defmt")]
impl defmt::Format for ValidationError {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{=str}: {=str}", self.field.as_str(), self.message())
    }
}
