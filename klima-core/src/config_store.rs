//! Config Store - versionierter Konfigurations-Record im Flash
//!
//! Layout im Speicherbereich:
//!
//! ```text
//! [ Schema-Tag u32 LE ][ postcard(ConfigRecord) ][ Padding 0x00 ... ]
//! ```
//!
//! Der Schema-Tag ist die einzige Kompatibilitätsprüfung. Unbekannter Tag
//! (nie beschrieben, gelöschter Flash, altes Layout) heißt: Defaults
//! verwenden und sofort zurückschreiben. Es gibt keine Migration.

use crate::traits::{ConfigStorage, StorageError};
use crate::types::ConfigRecord;
use crate::validation::{Field, ValidationError, Violation, validate_structure};

/// Sentinel für das aktuelle Layout
pub const SCHEMA_TAG: u32 = 0x1a51_2f59;

/// Bytes für den Schema-Tag am Anfang des Bereichs
pub const TAG_SIZE: usize = 4;

/// Größe des Speicherbereichs (maximaler kodierter Record + Tag, aufgerundet)
pub const CONFIG_STORAGE_SIZE: usize = 128;

/// Fehler beim Speichern der Konfiguration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    Validation(ValidationError),
    Storage(StorageError),
}

impl From<ValidationError> for ConfigError {
    fn from(e: ValidationError) -> Self {
        ConfigError::Validation(e)
    }
}

impl From<StorageError> for ConfigError {
    fn from(e: StorageError) -> Self {
        ConfigError::Storage(e)
    }
}

/// Warum der gespeicherte Record verworfen wurde
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageCorrupt {
    /// Lesen aus dem Speicher fehlgeschlagen
    Unreadable,
    /// Schema-Tag unbekannt (inkl. gelöschtem Flash `0xFFFF_FFFF`)
    UnknownSchemaTag(u32),
    /// Tag passt, aber der Payload lässt sich nicht dekodieren
    Undecodable,
    /// Dekodiert, aber ein Feld liegt außerhalb seines Wertebereichs
    OutOfDomain(Field),
}

/// Ergebnis von [`ConfigStore::load_detailed`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub record: ConfigRecord,
    /// `Some`, wenn der gespeicherte Record verworfen wurde
    pub discarded: Option<StorageCorrupt>,
    /// `Some`, wenn das Zurückschreiben der Defaults fehlschlug
    pub heal_error: Option<StorageError>,
}

/// Konfigurations-Speicher über einem [`ConfigStorage`]
pub struct ConfigStore<S: ConfigStorage> {
    storage: S,
}

impl<S: ConfigStorage> ConfigStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Lädt den Record, fällt still auf die Defaults zurück
    ///
    /// Schlägt nie fehl: fehlende oder ungültige Daten heißen "Defaults".
    pub fn load(&mut self) -> ConfigRecord {
        self.load_detailed().record
    }

    /// Wie [`ConfigStore::load`], meldet aber den Grund für ein Verwerfen
    ///
    /// Defaults werden zurückgeschrieben, außer bei einem Lesefehler.
    pub fn load_detailed(&mut self) -> LoadReport {
        match self.read_stored() {
            Ok(record) => LoadReport {
                record,
                discarded: None,
                heal_error: None,
            },
            // Lesefehler: Flash-Inhalt unbekannt, nicht überschreiben
            Err(StorageCorrupt::Unreadable) => LoadReport {
                record: ConfigRecord::default(),
                discarded: Some(StorageCorrupt::Unreadable),
                heal_error: None,
            },
            Err(reason) => {
                let record = ConfigRecord::default();
                let heal_error = self.write_record(&record).err().and_then(|e| match e {
                    ConfigError::Storage(e) => Some(e),
                    // Defaults passen immer
                    ConfigError::Validation(_) => None,
                });
                LoadReport {
                    record,
                    discarded: Some(reason),
                    heal_error,
                }
            }
        }
    }

    /// Validiert und schreibt den Record synchron
    ///
    /// Ein Record, der nicht in den Bereich passt, wird abgelehnt bevor
    /// ein Byte geschrieben wird.
    pub fn save(&mut self, record: &ConfigRecord) -> Result<(), ConfigError> {
        validate_structure(&record.candidate())?;
        self.write_record(record)
    }

    /// Schreibt die einkompilierten Defaults (Factory Reset)
    pub fn reset_to_defaults(&mut self) -> Result<ConfigRecord, ConfigError> {
        let record = ConfigRecord::default();
        self.write_record(&record)?;
        Ok(record)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    fn region_len(&self) -> usize {
        self.storage.capacity().min(CONFIG_STORAGE_SIZE)
    }

    fn read_stored(&mut self) -> Result<ConfigRecord, StorageCorrupt> {
        let len = self.region_len();
        if len < TAG_SIZE {
            return Err(StorageCorrupt::Unreadable);
        }

        let mut buffer = [0u8; CONFIG_STORAGE_SIZE];
        self.storage
            .read(&mut buffer[..len])
            .map_err(|_| StorageCorrupt::Unreadable)?;

        let mut tag = [0u8; TAG_SIZE];
        tag.copy_from_slice(&buffer[..TAG_SIZE]);
        let tag = u32::from_le_bytes(tag);
        if tag != SCHEMA_TAG {
            return Err(StorageCorrupt::UnknownSchemaTag(tag));
        }

        let record: ConfigRecord =
            postcard::from_bytes(&buffer[TAG_SIZE..len]).map_err(|_| StorageCorrupt::Undecodable)?;

        validate_structure(&record.candidate())
            .map_err(|e| StorageCorrupt::OutOfDomain(e.field))?;

        Ok(record)
    }

    fn write_record(&mut self, record: &ConfigRecord) -> Result<(), ConfigError> {
        let len = self.region_len();
        let too_large = ValidationError::new(Field::Record, Violation::ExceedsStorage);
        if len < TAG_SIZE {
            return Err(too_large.into());
        }

        // Erst komplett im RAM kodieren, dann in einem Rutsch schreiben
        let mut buffer = [0u8; CONFIG_STORAGE_SIZE];
        buffer[..TAG_SIZE].copy_from_slice(&SCHEMA_TAG.to_le_bytes());
        postcard::to_slice(record, &mut buffer[TAG_SIZE..len]).map_err(|_| too_large)?;

        self.storage.write(&buffer[..len])?;
        Ok(())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for StorageCorrupt {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            StorageCorrupt::Unreadable => defmt::write!(fmt, "unreadable"),
            StorageCorrupt::UnknownSchemaTag(tag) => {
                defmt::write!(fmt, "unknown schema tag {=u32:#x}", tag)
            }
            StorageCorrupt::Undecodable => defmt::write!(fmt, "undecodable payload"),
            StorageCorrupt::OutOfDomain(field) => {
                defmt::write!(fmt, "{=str} out of domain", field.as_str())
            }
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConfigError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            ConfigError::Validation(e) => defmt::write!(fmt, "validation failed: {}", e),
            ConfigError::Storage(e) => defmt::write!(fmt, "{}", e),
        }
    }
}
