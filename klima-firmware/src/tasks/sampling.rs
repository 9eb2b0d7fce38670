// Sampling Task - Periodische Messung während einer Serving-Sitzung
use defmt::{error, info, warn};
use embassy_futures::select::{Either3, select3};
use embassy_net::Stack;
use embassy_time::{Duration, Timer};
use klima_core::{
    DeviceMode, Reading, Sensor, ServingSampler, StatusDisplay, TickOutcome,
};

use crate::hal::{OledDisplay, ShtSensor};
use crate::tasks::wifi::ip_address;
use crate::{
    ConfigReceiver, DISPLAY_ACK, DISPLAY_MODE, PublishSender, set_latest_reading,
};

/// Sampling Logic - Testbare Logik ohne Hardware-Abhängigkeit
///
/// - Misst alle `sampleIntervalSeconds` einmal (ohne Retry)
/// - Vergleicht gegen den zuletzt publizierten Wert und reicht relevante
///   Änderungen an den Publish Task weiter (fire-and-forget)
/// - Aktualisiert Display und den geteilten Messwert für HTTP
/// - Übernimmt neue Config-Snapshots sofort (Intervall, Kontrast)
/// - Stellt auf Anforderung den Display-Kontrast für den Low-Power-Modus um
///
/// # Trait-basierte Abstraktion
/// `S: Sensor` und `D: StatusDisplay` erlauben Mock-Implementierungen.
pub async fn sampling_logic<S: Sensor, D: StatusDisplay>(
    mut sensor: S,
    mut display: D,
    mut config_rx: ConfigReceiver,
    publish_sender: PublishSender,
    stack: &'static Stack<'static>,
    initial: Reading,
) {
    let mut config = config_rx.get().await;
    let mut sampler = ServingSampler::with_latest(initial);
    set_latest_reading(initial);

    if display
        .set_contrast(config.contrast_for(DeviceMode::Serving))
        .is_err()
    {
        error!("Sampling: Failed to set display contrast");
    }

    info!(
        "Sampling: Started with interval {}s",
        config.sample_interval_secs
    );

    loop {
        match sampler.on_tick(sensor.read()) {
            TickOutcome::ReadFailed(e) => {
                warn!("Sampling: Read failed ({}), keeping last reading", e);
            }
            TickOutcome::Unchanged(reading) => {
                info!("Sampling: {}", reading);
            }
            TickOutcome::Publish(reading) => {
                info!("Sampling: Significant change {}", reading);
                if config.publish_enabled && publish_sender.try_send(reading).is_err() {
                    warn!("Sampling: Publish queue full, dropping reading");
                }
            }
        }

        let latest = sampler.latest();
        set_latest_reading(latest);
        let address = ip_address(stack);
        if display.show(&latest, address.as_deref()).is_err() {
            error!("Sampling: Failed to update display");
        }

        let tick = Timer::after(Duration::from_secs(u64::from(config.sample_interval_secs)));
        match select3(tick, config_rx.changed(), DISPLAY_MODE.wait()).await {
            Either3::First(_) => {}
            Either3::Second(updated) => {
                info!("Sampling: Config updated, interval {}s", updated.sample_interval_secs);
                config = updated;
                if display
                    .set_contrast(config.contrast_for(DeviceMode::Serving))
                    .is_err()
                {
                    error!("Sampling: Failed to set display contrast");
                }
            }
            Either3::Third(mode) => {
                info!("Sampling: Display switching to {}", mode);
                if display.set_contrast(config.contrast_for(mode)).is_err() {
                    error!("Sampling: Failed to set display contrast");
                }
                DISPLAY_ACK.signal(());
                if mode == DeviceMode::LowPowerCycling {
                    // Das Gerät schläft gleich, keine weiteren Messungen
                    return;
                }
            }
        }
    }
}

/// Sampling Task - Embassy Task für parallele Ausführung
///
/// Sensor und Display werden in main erzeugt (geteilter I2C-Bus) und hier
/// nur durchgereicht.
#[embassy_executor::task]
pub async fn sampling_task(
    sensor: ShtSensor,
    display: OledDisplay,
    config_rx: ConfigReceiver,
    publish_sender: PublishSender,
    stack: &'static Stack<'static>,
    initial: Reading,
) {
    sampling_logic(sensor, display, config_rx, publish_sender, stack, initial).await;
}
