// Task-Modul: Enthält alle Embassy Tasks
//
// Jeder Task läuft asynchron und unabhängig.
// Tasks kommunizieren über Embassy Channels und Watch
// (Sampling → Publish, HTTP → main, Settings → Sampling/Publish).

pub mod http;
pub mod publish;
pub mod sampling;
pub mod wifi;

// Re-export Tasks für einfachen Import
pub use http::http_server_task;
pub use publish::{InfluxPublisher, publish_task};
pub use sampling::sampling_task;
pub use wifi::{connection_task, dhcp_task, net_task, wait_for_network};
