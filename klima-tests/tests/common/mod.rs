//! Mock-Hardware für die Host-Tests
#![allow(dead_code)]

use klima_core::{
    CONFIG_STORAGE_SIZE, ConfigStorage, PublishStatus, PublishTarget, Publisher, RETAINED_SIZE,
    Reading, RetainedMemory, Sensor, SensorError, StorageError,
};

// ============================================================================
// Mock Config Storage
// ============================================================================

pub struct MockConfigStorage {
    pub bytes: [u8; CONFIG_STORAGE_SIZE],
    pub write_count: usize,
    pub fail_next_write: bool,
    pub fail_reads: bool,
}

impl MockConfigStorage {
    /// Gelöschter Flash (alles 0xFF)
    pub fn erased() -> Self {
        Self {
            bytes: [0xFF; CONFIG_STORAGE_SIZE],
            write_count: 0,
            fail_next_write: false,
            fail_reads: false,
        }
    }
}

impl ConfigStorage for MockConfigStorage {
    fn capacity(&self) -> usize {
        CONFIG_STORAGE_SIZE
    }

    fn read(&mut self, bytes: &mut [u8]) -> Result<(), StorageError> {
        if self.fail_reads {
            return Err(StorageError::ReadFailed);
        }
        bytes.copy_from_slice(&self.bytes[..bytes.len()]);
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), StorageError> {
        if self.fail_next_write {
            self.fail_next_write = false;
            return Err(StorageError::WriteFailed);
        }
        self.bytes[..bytes.len()].copy_from_slice(bytes);
        self.write_count += 1;
        Ok(())
    }
}

// ============================================================================
// Mock Retained Memory
// ============================================================================

#[derive(Default)]
pub struct MockRetainedMemory {
    pub bytes: [u8; RETAINED_SIZE],
    pub store_count: usize,
}

impl RetainedMemory for MockRetainedMemory {
    fn load(&self) -> [u8; RETAINED_SIZE] {
        self.bytes
    }

    fn store(&mut self, bytes: &[u8; RETAINED_SIZE]) {
        self.bytes = *bytes;
        self.store_count += 1;
    }
}

// ============================================================================
// Mock Publisher
// ============================================================================

pub struct MockPublisher {
    pub reply: PublishStatus,
    pub published: Vec<Reading>,
    pub last_host: Option<String>,
}

impl MockPublisher {
    pub fn replying(reply: PublishStatus) -> Self {
        Self {
            reply,
            published: Vec::new(),
            last_host: None,
        }
    }
}

impl Publisher for MockPublisher {
    async fn publish(&mut self, reading: Reading, target: &PublishTarget) -> PublishStatus {
        self.published.push(reading);
        self.last_host = Some(target.host.as_str().to_owned());
        self.reply
    }
}

// ============================================================================
// Mock Sensor
// ============================================================================

/// Liefert die vorgegebenen Samples der Reihe nach
pub struct MockSensor {
    samples: Vec<Result<Reading, SensorError>>,
    pub read_count: usize,
}

impl MockSensor {
    pub fn new(samples: Vec<Result<Reading, SensorError>>) -> Self {
        Self {
            samples,
            read_count: 0,
        }
    }
}

impl Sensor for MockSensor {
    fn read(&mut self) -> Result<Reading, SensorError> {
        let sample = self
            .samples
            .get(self.read_count)
            .copied()
            .unwrap_or(Err(SensorError::ReadFailed));
        self.read_count += 1;
        sample
    }
}
