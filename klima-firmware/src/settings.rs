// Settings Handle - einziger Besitzer des ConfigRecords zur Laufzeit
//
// Schreibzugriffe (HTTP) laufen über das Handle, alle anderen Tasks bekommen
// Snapshots über den ConfigWatch.
use defmt::{info, warn};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use klima_core::{ConfigError, ConfigRecord, ConfigStore, SettingsError, apply_settings};

use crate::hal::FlashConfigStorage;
use crate::{ConfigReceiver, ConfigWatch};

struct Inner {
    store: ConfigStore<FlashConfigStorage>,
    current: ConfigRecord,
}

pub struct SettingsHandle {
    inner: Mutex<CriticalSectionRawMutex, Inner>,
    watch: ConfigWatch,
}

impl SettingsHandle {
    /// Übernimmt den beim Boot geladenen Record
    pub fn new(store: ConfigStore<FlashConfigStorage>, current: ConfigRecord) -> Self {
        let watch = ConfigWatch::new();
        watch.sender().send(current.clone());
        Self {
            inner: Mutex::new(Inner { store, current }),
            watch,
        }
    }

    /// Read-only Snapshot-Receiver für einen Task
    pub fn receiver(&'static self) -> Option<ConfigReceiver> {
        self.watch.receiver()
    }

    pub async fn snapshot(&self) -> ConfigRecord {
        self.inner.lock().await.current.clone()
    }

    /// Validiert und persistiert ein JSON-Update, verteilt danach den Snapshot
    pub async fn update(&self, body: &[u8]) -> Result<ConfigRecord, SettingsError> {
        let mut inner = self.inner.lock().await;
        let Inner { store, current } = &mut *inner;

        match apply_settings(store, current, body) {
            Ok(record) => {
                info!("Config: updated {}", record);
                *current = record.clone();
                self.watch.sender().send(record.clone());
                Ok(record)
            }
            Err(e) => {
                warn!("Config: update rejected: {}", e);
                Err(e)
            }
        }
    }

    /// Factory Reset: Defaults persistieren
    ///
    /// Der Snapshot wird nicht verteilt, das Gerät startet direkt danach neu.
    pub async fn reset_to_defaults(&self) -> Result<ConfigRecord, ConfigError> {
        let mut inner = self.inner.lock().await;
        let record = inner.store.reset_to_defaults()?;
        inner.current = record.clone();
        info!("Config: factory defaults written");
        Ok(record)
    }
}
