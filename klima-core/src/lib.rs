//! Klima Core - Lifecycle- und Persistenz-Logik des Klima-Sensors
//!
//! Diese Crate enthält KEINE Hardware-Dependencies.
//! Sie definiert Traits, die Duty-Cycle-Zustandsmaschine, den Config-Store
//! und die Settings-API, alles auf dem Host testbar.

#![no_std]

pub mod api;
pub mod config_store;
pub mod duty_cycle;
pub mod logic;
pub mod publish;
pub mod retained;
pub mod sampler;
pub mod traits;
pub mod types;
pub mod validation;

// Re-exports für einfachen Zugriff
pub use api::{SettingsError, apply_settings};
pub use config_store::{CONFIG_STORAGE_SIZE, ConfigError, ConfigStore, StorageCorrupt};
pub use duty_cycle::{CycleError, CycleState, DutyCycleController, QuickOutcome, SleepRequest};
pub use logic::is_significant;
pub use publish::{PublishError, line_protocol, write_request};
pub use retained::{RETAINED_SIZE, RetainedState};
pub use sampler::{ServingSampler, TickOutcome};
pub use traits::{
    ConfigStorage, DisplayError, Publisher, RetainedMemory, Sensor, SensorError, StatusDisplay,
    StorageError,
};
pub use types::{
    ConfigRecord, DeviceMode, PublishStatus, PublishTarget, Reading, WakeCause, WakeSource,
};
pub use validation::{Field, ValidationError, Violation};
