// Config-Bereich im SPI-Flash
use embedded_storage::{ReadStorage, Storage};
use esp_hal::peripherals::FLASH;
use esp_storage::FlashStorage;
use klima_core::{CONFIG_STORAGE_SIZE, ConfigStorage, StorageError};

use crate::config::CONFIG_FLASH_OFFSET;

/// Fester Flash-Bereich für den ConfigRecord
///
/// `esp-storage` übernimmt Read-Modify-Write und das Löschen des Sektors.
pub struct FlashConfigStorage {
    flash: FlashStorage<'static>,
}

impl FlashConfigStorage {
    pub fn new(flash: FLASH<'static>) -> Self {
        Self {
            flash: FlashStorage::new(flash),
        }
    }
}

impl ConfigStorage for FlashConfigStorage {
    fn capacity(&self) -> usize {
        CONFIG_STORAGE_SIZE
    }

    fn read(&mut self, bytes: &mut [u8]) -> Result<(), StorageError> {
        self.flash
            .read(CONFIG_FLASH_OFFSET, bytes)
            .map_err(|_| StorageError::ReadFailed)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), StorageError> {
        self.flash
            .write(CONFIG_FLASH_OFFSET, bytes)
            .map_err(|_| StorageError::WriteFailed)
    }
}
