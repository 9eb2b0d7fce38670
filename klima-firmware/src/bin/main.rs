// Keine Standard-Bibliothek verwenden (Embedded System)
#![no_std]
// Kein normaler main() Einstiegspunkt (wird von esp_rtos bereitgestellt)
#![no_main]
// Verbiete mem::forget - gefährlich bei ESP HAL Types mit DMA-Buffern
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
// Verbiete große Stack-Frames (Stack ist auf Embedded Systemen begrenzt)
#![deny(clippy::large_stack_frames)]

// Heap Allocator (WiFi benötigt dynamischen Speicher)
extern crate alloc;

use defmt::{error, info, warn};
use embassy_executor::Spawner;
use embassy_net::{Config as NetConfig, Stack, StackResources};
use embassy_time::{Duration, Timer, with_timeout};
use embedded_hal_bus::i2c::RefCellDevice;
use esp_hal::clock::CpuClock;
use esp_hal::peripherals::{GPIO2, LPWR, WIFI};
use esp_hal::rng::Rng;
use esp_hal::timer::timg::TimerGroup;
use klima_core::{
    ConfigRecord, ConfigStore, CycleState, DeviceMode, DutyCycleController, QuickOutcome, Reading,
    RetainedState, Sensor, StatusDisplay,
};
use static_cell::StaticCell;

// Backtrace bei Panic und defmt-Ausgabe
use {esp_backtrace as _, esp_println as _};

// Projekt-Module und Konfiguration
use esp_klima_sensor::config::*;
use esp_klima_sensor::hal::{
    self, FlashConfigStorage, OledDisplay, RtcRetainedMemory, ShtSensor, init_i2c_bus,
};
use esp_klima_sensor::settings::SettingsHandle;
use esp_klima_sensor::tasks::{
    InfluxPublisher, connection_task, dhcp_task, http_server_task, net_task, publish_task,
    sampling_task, wait_for_network,
};
use esp_klima_sensor::{
    CommandChannel, DISPLAY_ACK, DISPLAY_MODE, LifecycleCommand, PublishChannel, WIFI_FORGET,
    latest_reading,
};

// ESP-IDF App Descriptor - erforderlich für den Bootloader!
esp_bootloader_esp_idf::esp_app_desc!();

type Retained = RetainedState<RtcRetainedMemory>;

/// Main Entry Point und Lifecycle-Treiber
///
/// 1. Wake-Grund bestimmen, Config laden, RTC-Memory lesen
/// 2. Timer-Wake ohne Taster: ein Quick-Sample, ggf. kurz aufwachen und
///    publizieren, dann sofort wieder schlafen
/// 3. Sonst: volle Sitzung mit Display, WiFi und HTTP-API; main wartet auf
///    Lifecycle-Kommandos (Low-Power, Neustart)
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    // Heap Allocator initialisieren (WiFi braucht dynamischen Speicher!)
    esp_alloc::heap_allocator!(
        #[esp_hal::ram(reclaimed)]
        size: WIFI_HEAP_SIZE
    );
    esp_alloc::heap_allocator!(size: EXTRA_HEAP_SIZE);

    // Embassy Runtime initialisieren (Timer + Software Interrupt)
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    let sw_interrupt =
        esp_hal::interrupt::software::SoftwareInterruptControl::new(peripherals.SW_INTERRUPT);
    esp_rtos::start(timg0.timer0, sw_interrupt.software_interrupt0);

    // Wake-Grund und Bedien-Taster
    let cause = hal::sleep::wake_cause();
    let mut operator_pin = peripherals.GPIO2;
    let operator_asserted = hal::sleep::operator_asserted(operator_pin.reborrow());
    info!(
        "Lifecycle: Boot, wake cause {}, operator button {}",
        cause, operator_asserted
    );

    // Config laden (heilt sich bei unbekanntem Schema selbst)
    let mut store = ConfigStore::new(FlashConfigStorage::new(peripherals.FLASH));
    let report = store.load_detailed();
    if let Some(reason) = report.discarded {
        warn!("Config: Stored record discarded ({}), using defaults", reason);
    }
    if let Some(e) = report.heal_error {
        error!("Config: Failed to persist defaults: {}", e);
    }
    let record = report.record;
    info!("Config: {}", record);

    let mut retained =
        RetainedState::new(RtcRetainedMemory::take().expect("Retained memory already taken"));
    let restored = retained.restore_after_wake(cause);

    let mut controller = DutyCycleController::new(record.sample_interval_secs);
    controller
        .booted()
        .expect("Lifecycle controller must start in Booting");

    // I2C-Bus für Sensor und Display
    let bus = init_i2c_bus(peripherals.I2C0, peripherals.GPIO6, peripherals.GPIO7);
    let mut sensor = ShtSensor::new(RefCellDevice::new(bus));

    let path = controller
        .decide_wake_path(cause, operator_asserted, restored)
        .expect("Lifecycle controller must be deciding the wake path");
    info!("Lifecycle: {} (retained {})", path, restored);

    // ========================================================================
    // Quick-Sample: messen, ggf. publizieren, schlafen
    // ========================================================================
    if path == CycleState::QuickSample {
        match controller.quick_sample(sensor.read()) {
            Ok(QuickOutcome::WakeAndPublish(reading)) => {
                info!("Lifecycle: Significant change {}, waking up", reading);
                show_transient(OledDisplay::new(RefCellDevice::new(bus)), &record, &reading);

                let stack = if record.publish_enabled {
                    let stack = start_network(spawner, peripherals.WIFI);
                    let connected = with_timeout(
                        Duration::from_secs(NETWORK_TIMEOUT_SECS),
                        wait_for_network(stack),
                    )
                    .await;
                    if connected.is_err() {
                        warn!("Lifecycle: No network after {}s", NETWORK_TIMEOUT_SECS);
                    }
                    connected.ok().map(|_| stack)
                } else {
                    None
                };

                let mut publisher = InfluxPublisher::new(stack);
                match controller.publish_change(&mut publisher, &record).await {
                    Ok(status) => info!("Lifecycle: Publish attempt finished with {}", status),
                    Err(e) => error!("Lifecycle: Publish skipped: {}", e),
                }
            }
            Ok(QuickOutcome::Sleep) => {
                info!("Lifecycle: No significant change");
            }
            Err(e) => error!("Lifecycle: Quick sample rejected: {}", e),
        }

        enter_sleep(&mut controller, &mut retained, peripherals.LPWR, operator_pin);
    }

    // ========================================================================
    // Serving-Sitzung
    // ========================================================================
    let mut display =
        OledDisplay::new(RefCellDevice::new(bus)).expect("Failed to initialize display");
    if display
        .set_contrast(record.contrast_for(DeviceMode::Serving))
        .and_then(|_| display.show(&restored, None))
        .is_err()
    {
        warn!("Lifecycle: Display update failed");
    }

    let stack = start_network(spawner, peripherals.WIFI);

    static SETTINGS: StaticCell<SettingsHandle> = StaticCell::new();
    let settings = &*SETTINGS.init(SettingsHandle::new(store, record));

    static COMMANDS: StaticCell<CommandChannel> = StaticCell::new();
    let commands = &*COMMANDS.init(CommandChannel::new());

    static PUBLISH_QUEUE: StaticCell<PublishChannel> = StaticCell::new();
    let publish_queue = &*PUBLISH_QUEUE.init(PublishChannel::new());

    spawner
        .spawn(sampling_task(
            sensor,
            display,
            settings.receiver().expect("Config receiver for sampling"),
            publish_queue.sender(),
            stack,
            controller.current_reading(),
        ))
        .expect("Failed to spawn sampling task");

    spawner
        .spawn(publish_task(
            stack,
            publish_queue.receiver(),
            settings.receiver().expect("Config receiver for publishing"),
        ))
        .expect("Failed to spawn publish task");

    // HTTP Server Tasks (mehrere für concurrent connections)
    for task_id in 0..HTTP_TASK_COUNT {
        spawner
            .spawn(http_server_task(task_id, stack, settings, commands.sender()))
            .expect("Failed to spawn HTTP task");
    }

    // Supervisor: wartet auf Lifecycle-Kommandos aus der HTTP-API
    loop {
        let command = commands.receive().await;
        info!("Lifecycle: Command {}", command);

        match command {
            LifecycleCommand::LowPower => {
                DISPLAY_MODE.signal(DeviceMode::LowPowerCycling);
                let ack = with_timeout(
                    Duration::from_millis(DISPLAY_ACK_TIMEOUT_MS),
                    DISPLAY_ACK.wait(),
                )
                .await;
                if ack.is_err() {
                    warn!("Lifecycle: Display did not acknowledge low-power contrast");
                }

                // HTTP-Antwort noch ausliefern lassen
                Timer::after(Duration::from_millis(RESTART_DELAY_MS)).await;

                match controller.request_low_power(latest_reading()) {
                    Ok(()) => {
                        let interval = settings.snapshot().await.sample_interval_secs;
                        controller.set_sample_interval(interval);
                        enter_sleep(&mut controller, &mut retained, peripherals.LPWR, operator_pin);
                    }
                    Err(e) => error!("Lifecycle: Low-power request rejected: {}", e),
                }
            }
            LifecycleCommand::ResetWifi | LifecycleCommand::FactoryReset => {
                Timer::after(Duration::from_millis(RESTART_DELAY_MS)).await;
                WIFI_FORGET.signal(());
                Timer::after(Duration::from_millis(RESTART_DELAY_MS)).await;
                info!("Lifecycle: Restarting");
                esp_hal::system::software_reset();
            }
        }
    }
}

/// Netzwerk-Stack aufbauen und WiFi-Tasks spawnen
fn start_network(spawner: Spawner, wifi: WIFI<'static>) -> &'static Stack<'static> {
    static RADIO_INIT: StaticCell<esp_radio::Controller> = StaticCell::new();
    let radio_init =
        RADIO_INIT.init(esp_radio::init().expect("Failed to initialize Wi-Fi/BLE controller"));

    let (wifi_controller, wifi_interface) =
        esp_radio::wifi::new(radio_init, wifi, Default::default())
            .expect("Failed to initialize Wi-Fi");

    // Random seed für TCP/IP Stack (von Hardware RNG)
    let rng = Rng::new();
    let seed = (rng.random() as u64) << 32 | rng.random() as u64;

    // HTTP-Listener (4) + Influx (1) + DNS/DHCP
    static RESOURCES: StaticCell<StackResources<8>> = StaticCell::new();
    let resources = RESOURCES.init(StackResources::new());

    let (stack, runner) = embassy_net::new(
        wifi_interface.sta,
        NetConfig::dhcpv4(Default::default()),
        resources,
        seed,
    );

    static STACK: StaticCell<Stack<'static>> = StaticCell::new();
    let stack = &*STACK.init(stack);

    spawner
        .spawn(connection_task(wifi_controller))
        .expect("Failed to spawn WiFi task");
    spawner
        .spawn(net_task(runner))
        .expect("Failed to spawn network task");
    spawner
        .spawn(dhcp_task(stack))
        .expect("Failed to spawn DHCP task");

    stack
}

/// Display im transienten Wake: Messwert mit Low-Power-Kontrast
fn show_transient(
    display: Result<OledDisplay, klima_core::DisplayError>,
    record: &ConfigRecord,
    reading: &Reading,
) {
    let result = display.and_then(|mut display| {
        display.set_contrast(record.contrast_for(DeviceMode::LowPowerCycling))?;
        display.show(reading, None)
    });
    if let Err(e) = result {
        warn!("Lifecycle: Display update failed: {}", e);
    }
}

/// Persistiert den Messwert und geht in den Deep-Sleep
fn enter_sleep(
    controller: &mut DutyCycleController,
    retained: &mut Retained,
    lpwr: LPWR<'static>,
    operator_pin: GPIO2<'static>,
) -> ! {
    match controller.enter_sleep(retained) {
        Ok(request) => hal::sleep::deep_sleep(lpwr, operator_pin, &request),
        Err(e) => {
            error!("Lifecycle: Cannot enter sleep: {}, restarting", e);
            esp_hal::system::software_reset()
        }
    }
}
