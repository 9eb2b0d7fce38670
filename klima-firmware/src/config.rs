// Projekt-Konfiguration: Konstanten und Hardware-Zuordnungen
//
// Laufzeit-Einstellungen (Intervall, Kontrast, Influx-Ziel) stehen NICHT hier,
// sondern im ConfigRecord im Flash (siehe klima_core::config_store).
#![allow(dead_code)]

// ============================================================================
// Hardware-Zuordnung
// ============================================================================

/// I2C SDA (SHT4x + SSD1306 am selben Bus)
pub const I2C_SDA_GPIO_PIN: u8 = 6;

/// I2C SCL
pub const I2C_SCL_GPIO_PIN: u8 = 7;

/// I2C Taktfrequenz in kHz
pub const I2C_FREQUENCY_KHZ: u32 = 400;

/// Bedien-Taster (LP-GPIO, gegen GND, interner Pull-Up)
/// Gedrückt beim Timer-Wake → volle Sitzung statt Quick-Sample
/// Im Deep-Sleep als EXT1-Wake-Quelle konfiguriert
pub const OPERATOR_GPIO_PIN: u8 = 2;

// ============================================================================
// Persistenz
// ============================================================================

/// Flash-Offset des Config-Bereichs
/// Liegt in der NVS-Partition der Standard-Partitionstabelle (0x9000..0xF000),
/// die von der Firmware sonst nicht genutzt wird
pub const CONFIG_FLASH_OFFSET: u32 = 0x9000;

// ============================================================================
// WiFi Konfiguration
// ============================================================================

/// WiFi SSID (Netzwerk-Name)
/// Wird zur Build-Zeit aus der Environment Variable WIFI_SSID geladen
/// Setze diese in .env file (siehe .env.example)
pub const WIFI_SSID: &str = env!(
    "WIFI_SSID",
    "WiFi SSID nicht gesetzt! Erstelle .env file (siehe .env.example)"
);

/// WiFi Passwort
/// Wird zur Build-Zeit aus der Environment Variable WIFI_PASSWORD geladen
pub const WIFI_PASSWORD: &str = env!(
    "WIFI_PASSWORD",
    "WiFi Password nicht gesetzt! Erstelle .env file (siehe .env.example)"
);

/// Heap-Größe für WiFi (Bytes)
pub const WIFI_HEAP_SIZE: usize = 65536; // 64 KB

/// Zusätzliche Heap-Größe (Bytes)
pub const EXTRA_HEAP_SIZE: usize = 36864; // 36 KB

/// Wartezeit auf IP-Adresse im transienten Wake (Sekunden)
/// Danach wird ohne Publish wieder geschlafen
pub const NETWORK_TIMEOUT_SECS: u64 = 15;

/// Wartezeit zwischen Verbindungsversuchen (Sekunden)
pub const WIFI_RETRY_DELAY_SECS: u64 = 5;

// ============================================================================
// Publishing (InfluxDB)
// ============================================================================

/// DNS Query Timeout in Sekunden
pub const DNS_TIMEOUT_SECS: u64 = 10;

/// Timeout für einen kompletten Publish-Versuch (Connect + Request + Antwort)
pub const PUBLISH_TIMEOUT_SECS: u64 = 10;

/// TCP-Buffer für die Influx-Verbindung
pub const PUBLISH_RX_BUFFER_SIZE: usize = 512;
pub const PUBLISH_TX_BUFFER_SIZE: usize = 512;

/// Bytes der Antwort, die für die Statuszeile gelesen werden
pub const PUBLISH_RESPONSE_PEEK_SIZE: usize = 64;

/// Kapazität der Publish-Queue (Sampling → Publish Task)
pub const PUBLISH_QUEUE_SIZE: usize = 2;

// ============================================================================
// Lifecycle
// ============================================================================

/// Wartezeit zwischen HTTP-Antwort und Neustart (Millisekunden)
/// Gibt dem HTTP-Task Zeit, die Antwort noch auszuliefern
pub const RESTART_DELAY_MS: u64 = 500;

/// Maximale Wartezeit auf das Display vor dem Deep-Sleep (Millisekunden)
pub const DISPLAY_ACK_TIMEOUT_MS: u64 = 500;

// ============================================================================
// HTTP Server Konfiguration
// ============================================================================

/// Anzahl paralleler HTTP-Server-Tasks
pub const HTTP_TASK_COUNT: usize = 4;

/// HTTP Buffer-Größe in Bytes
/// Für HTTP Request/Response Headers und Body
pub const HTTP_BUFFER_SIZE: usize = 1024;

/// TCP RX Buffer-Größe in Bytes
pub const TCP_RX_BUFFER_SIZE: usize = 1024;

/// TCP TX Buffer-Größe in Bytes
pub const TCP_TX_BUFFER_SIZE: usize = 1024;

/// JSON Serialisierungs-Buffer für Settings-Antworten
/// Voller Record mit maximal langen Strings ist ca. 260 Bytes
pub const JSON_BUFFER_SIZE: usize = 384;
