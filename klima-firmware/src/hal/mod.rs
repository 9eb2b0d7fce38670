// Hardware Abstraction Layer (HAL) Module
//
// Implementiert die Traits aus klima-core für die echte Hardware.
// Die Logik in klima-core kennt nur die Traits und ist auf dem Host testbar.

pub mod bus;
pub mod display;
pub mod flash_storage;
pub mod rtc_memory;
pub mod sensor;
pub mod sleep;

pub use bus::{SharedI2c, init_i2c_bus};
pub use display::OledDisplay;
pub use flash_storage::FlashConfigStorage;
pub use rtc_memory::RtcRetainedMemory;
pub use sensor::ShtSensor;
