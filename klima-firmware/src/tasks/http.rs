// HTTP Server Task - Info-Seite und Settings-API
use alloc::string::String;
use alloc::vec::Vec;

use defmt::{info, warn};
use embassy_net::Stack;
use embassy_time::Duration;
use klima_core::SettingsError;
use klima_core::api::{render_error, render_publish_status, render_reading, render_settings};
use picoserve::response::{IntoResponse, Response, StatusCode};
use picoserve::routing::{get, post};

use crate::config::*;
use crate::settings::SettingsHandle;
use crate::web::INDEX_HTML;
use crate::{CommandSender, LifecycleCommand, last_publish_status, latest_reading};

/// HTTP Server Task - läuft parallel zu anderen Tasks
///
/// Routen:
/// - `GET  /`                     → Info-Seite
/// - `POST /resetWifi`            → WiFi vergessen, Neustart
/// - `POST /factoryReset`         → Defaults schreiben, WiFi vergessen, Neustart
/// - `POST /lowPower`             → Low-Power-Kontrast, Deep-Sleep
/// - `GET|POST /settings`         → ConfigRecord lesen / ändern (sonst 405)
/// - `GET  /publish/lastResponse` → Status des letzten Publish-Versuchs
/// - `GET  /reading`              → Letzter Messwert
///
/// Kein Handler wartet auf Sensor oder Publisher. Zustandswechsel gehen als
/// [`LifecycleCommand`] an main, die Antwort wird vorher ausgeliefert.
///
/// **Task Pool:** Diese Task wird mehrfach gespawnt für concurrent connections.
#[embassy_executor::task(pool_size = 4)]
pub async fn http_server_task(
    task_id: usize,
    stack: &'static Stack<'static>,
    settings: &'static SettingsHandle,
    commands: CommandSender,
) {
    info!("HTTP: Server task {} starting on port 80...", task_id);

    let app = picoserve::Router::new()
        .route("/", get(serve_html))
        .route(
            "/resetWifi",
            post(move || async move {
                info!("HTTP: WiFi reset requested");
                commands.send(LifecycleCommand::ResetWifi).await;
                "OK. Restarting the sensor."
            }),
        )
        .route(
            "/factoryReset",
            post(move || async move {
                info!("HTTP: Factory reset requested");
                match settings.reset_to_defaults().await {
                    Ok(_) => {
                        commands.send(LifecycleCommand::FactoryReset).await;
                        Response::new(
                            StatusCode::OK,
                            "OK. Factory defaults restored, restarting the sensor.",
                        )
                    }
                    Err(e) => {
                        warn!("HTTP: Factory reset failed: {}", e);
                        Response::new(StatusCode::new(500), "Factory reset failed.")
                    }
                }
            }),
        )
        .route(
            "/lowPower",
            post(move || async move {
                info!("HTTP: Low-power mode requested");
                commands.send(LifecycleCommand::LowPower).await;
                "OK. Entering low-power mode."
            }),
        )
        .route(
            "/settings",
            get(move || async move {
                let record = settings.snapshot().await;
                json(render_json(200, |buf| render_settings(&record, buf)))
            })
            .post(move |body: Vec<u8>| async move {
                match settings.update(&body).await {
                    Ok(record) => json(render_json(200, |buf| render_settings(&record, buf))),
                    Err(e) => json(render_json(e.status_code(), |buf| render_error(&e, buf))),
                }
            }),
        )
        .route(
            "/publish/lastResponse",
            get(|| async {
                json(render_json(200, |buf| {
                    render_publish_status(last_publish_status(), buf)
                }))
            }),
        )
        .route(
            "/reading",
            get(|| async {
                json(render_json(200, |buf| render_reading(&latest_reading(), buf)))
            }),
        );

    // Server-Konfiguration
    let config = picoserve::Config::new(picoserve::Timeouts {
        start_read_request: Some(Duration::from_secs(5)),
        read_request: Some(Duration::from_secs(1)),
        write: Some(Duration::from_secs(1)),
        persistent_start_read_request: Some(Duration::from_secs(5)),
    });

    let mut http_buffer = [0u8; HTTP_BUFFER_SIZE];
    let mut rx_buffer = [0u8; TCP_RX_BUFFER_SIZE];
    let mut tx_buffer = [0u8; TCP_TX_BUFFER_SIZE];

    let server = picoserve::Server::new(&app, &config, &mut http_buffer);

    let _ = server
        .listen_and_serve(task_id, *stack, 80, &mut rx_buffer, &mut tx_buffer)
        .await;

    info!("HTTP: Server task {} ended", task_id);
}

/// Serviert die HTML-Hauptseite
async fn serve_html() -> impl IntoResponse {
    Response::new(StatusCode::OK, INDEX_HTML).with_header("Content-Type", "text/html; charset=utf-8")
}

/// Rendert JSON in einen Puffer
///
/// Passt die Antwort nicht in [`JSON_BUFFER_SIZE`], gibt es 500 mit
/// Fehler-JSON (das immer passt).
fn render_json(
    status: u16,
    render: impl FnOnce(&mut [u8]) -> Result<usize, SettingsError>,
) -> (u16, String) {
    let mut buffer = [0u8; JSON_BUFFER_SIZE];
    let (status, len) = match render(&mut buffer) {
        Ok(len) => (status, len),
        Err(e) => {
            warn!("HTTP: Response rendering failed: {}", e);
            (e.status_code(), render_error(&e, &mut buffer).unwrap_or(0))
        }
    };

    // serde-json-core schreibt nur gültiges UTF-8
    let body = String::from(core::str::from_utf8(&buffer[..len]).unwrap_or("{}"));
    (status, body)
}

fn json((status, body): (u16, String)) -> impl IntoResponse {
    Response::new(StatusCode::new(status), body).with_header("Content-Type", "application/json")
}
