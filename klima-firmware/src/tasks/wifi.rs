// WiFi Task - Verbindet mit WLAN und managed Connection
use core::fmt::Write;

use defmt::{Debug2Format, error, info, warn};
use embassy_futures::select::{Either, select};
use embassy_net::{Runner, Stack};
use embassy_time::{Duration, Timer};
use esp_radio::wifi::{ClientConfig, ModeConfig, WifiController, WifiDevice, WifiEvent};
use heapless::String;

use crate::WIFI_FORGET;
use crate::config::{WIFI_PASSWORD, WIFI_RETRY_DELAY_SECS, WIFI_SSID};

/// WiFi Connection Task
///
/// Managed die WiFi-Verbindung:
/// - Verbindet mit Access Point
/// - Überwacht Verbindung und reconnected bei Bedarf
/// - Trennt auf [`WIFI_FORGET`] hin und bleibt getrennt (Neustart folgt)
#[embassy_executor::task]
pub async fn connection_task(mut controller: WifiController<'static>) {
    info!("WiFi: Starting connection task");

    loop {
        if matches!(controller.is_started(), Ok(false)) {
            info!("WiFi: Configuring and starting...");

            let client_config = ModeConfig::Client(
                ClientConfig::default()
                    .with_ssid(WIFI_SSID.into())
                    .with_password(WIFI_PASSWORD.into()),
            );

            if let Err(e) = controller.set_config(&client_config) {
                error!("WiFi: Failed to set configuration: {}", Debug2Format(&e));
                Timer::after(Duration::from_secs(WIFI_RETRY_DELAY_SECS)).await;
                continue;
            }

            if let Err(e) = controller.start_async().await {
                error!("WiFi: Failed to start: {}", Debug2Format(&e));
                Timer::after(Duration::from_secs(WIFI_RETRY_DELAY_SECS)).await;
                continue;
            }

            info!("WiFi: Started successfully");
        }

        info!("WiFi: Connecting to '{}'...", WIFI_SSID);
        if let Err(e) = controller.connect_async().await {
            error!("WiFi: Connection failed: {}", Debug2Format(&e));
            Timer::after(Duration::from_secs(WIFI_RETRY_DELAY_SECS)).await;
            continue;
        }
        info!("WiFi: Connected successfully!");

        let event = select(
            controller.wait_for_event(WifiEvent::StaDisconnected),
            WIFI_FORGET.wait(),
        )
        .await;

        match event {
            Either::First(_) => {
                warn!("WiFi: Disconnected from AP, will retry...");
                Timer::after(Duration::from_secs(2)).await;
            }
            Either::Second(_) => {
                info!("WiFi: Forgetting association");
                if let Err(e) = controller.disconnect_async().await {
                    warn!("WiFi: Disconnect failed: {}", Debug2Format(&e));
                }
                if let Err(e) = controller.stop_async().await {
                    warn!("WiFi: Stop failed: {}", Debug2Format(&e));
                }
                return;
            }
        }
    }
}

/// Network Task
///
/// Prozessiert Netzwerk-Pakete für den embassy-net Stack.
#[embassy_executor::task]
pub async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) -> ! {
    runner.run().await
}

/// DHCP Monitor Task
///
/// Wartet bis eine IP-Adresse vom DHCP-Server erhalten wurde
/// und loggt dann die Netzwerk-Konfiguration
#[embassy_executor::task]
pub async fn dhcp_task(stack: &'static Stack<'static>) {
    wait_for_network(stack).await;

    if let Some(config) = stack.config_v4() {
        info!("WiFi: Got IP address!");
        info!("  IP:      {}", Debug2Format(&config.address.address()));
        info!("  Gateway: {}", Debug2Format(&config.gateway));
        info!("  DNS:     {}", Debug2Format(&config.dns_servers));
    }
}

/// Wartet bis Link und DHCP-Konfiguration verfügbar sind
pub async fn wait_for_network(stack: &'static Stack<'static>) {
    loop {
        if stack.is_link_up() && stack.config_v4().is_some() {
            break;
        }
        Timer::after(Duration::from_millis(500)).await;
    }
}

/// Aktuelle IPv4-Adresse als Text (für das Display), `None` ohne DHCP-Lease
pub fn ip_address(stack: &Stack<'_>) -> Option<String<16>> {
    let config = stack.config_v4()?;
    let mut text = String::new();
    write!(text, "{}", config.address.address()).ok()?;
    Some(text)
}
