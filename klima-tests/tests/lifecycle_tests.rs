//! Integration Tests für den Duty-Cycle
//!
//! Spielt ganze Boot-Zyklen mit MockSensor, MockPublisher und
//! MockRetainedMemory durch.

mod common;

use common::{MockPublisher, MockRetainedMemory, MockSensor};
use embassy_futures::block_on;
use klima_core::duty_cycle::ServingKind;
use klima_core::retained::{decode_reading, encode_reading};
use klima_core::{
    ConfigRecord, CycleError, CycleState, DeviceMode, DutyCycleController, PublishStatus,
    QuickOutcome, Reading, RetainedState, Sensor, SensorError, ServingSampler, TickOutcome,
    WakeCause,
};

fn retained_with(reading: Reading) -> RetainedState<MockRetainedMemory> {
    RetainedState::new(MockRetainedMemory {
        bytes: encode_reading(&reading),
        store_count: 0,
    })
}

/// Boot bis zur Wake-Entscheidung, wie in main
fn boot(
    cause: WakeCause,
    operator_asserted: bool,
    retained: &RetainedState<MockRetainedMemory>,
    config: &ConfigRecord,
) -> (DutyCycleController, CycleState) {
    let mut controller = DutyCycleController::new(config.sample_interval_secs);
    controller.booted().unwrap();
    let restored = retained.restore_after_wake(cause);
    let path = controller
        .decide_wake_path(cause, operator_asserted, restored)
        .unwrap();
    (controller, path)
}

fn publishing_config() -> ConfigRecord {
    let mut config = ConfigRecord::default();
    config.publish_enabled = true;
    config.publish_target.host = "influx.local".try_into().unwrap();
    config.publish_target.database = "klima".try_into().unwrap();
    config
}

// ============================================================================
// Tests: RetainedState
// ============================================================================

#[test]
fn test_restore_after_cold_boot_is_unknown() {
    let retained = retained_with(Reading::new(20.0, 50.0));

    assert!(retained.restore_after_wake(WakeCause::ColdBoot).is_unknown());
    assert!(retained.restore_after_wake(WakeCause::OperatorWake).is_unknown());
}

#[test]
fn test_restore_after_timer_wake_returns_persisted_reading() {
    let retained = retained_with(Reading::new(20.0, 50.0));

    assert_eq!(
        retained.restore_after_wake(WakeCause::TimerWake),
        Reading::new(20.0, 50.0)
    );
}

#[test]
fn test_restore_with_foreign_layout_is_unknown() {
    let retained = RetainedState::new(MockRetainedMemory::default());

    assert!(retained.restore_after_wake(WakeCause::TimerWake).is_unknown());
}

#[test]
fn test_corrupt_payload_with_valid_tag_is_returned_as_is() {
    let mut bytes = encode_reading(&Reading::new(20.0, 50.0));
    bytes[4..8].copy_from_slice(&1.0e30f32.to_le_bytes());
    let retained = RetainedState::new(MockRetainedMemory {
        bytes,
        store_count: 0,
    });

    let restored = retained.restore_after_wake(WakeCause::TimerWake);

    assert_eq!(restored, Reading::new(1.0e30, 50.0));
}

// ============================================================================
// Tests: Wake-Pfad
// ============================================================================

#[test]
fn test_timer_wake_takes_quick_sample_path() {
    let retained = retained_with(Reading::new(20.0, 50.0));

    let (controller, path) = boot(WakeCause::TimerWake, false, &retained, &ConfigRecord::default());

    assert_eq!(path, CycleState::QuickSample);
    assert_eq!(controller.mode(), DeviceMode::LowPowerCycling);
}

#[test]
fn test_operator_button_forces_session() {
    let retained = retained_with(Reading::new(20.0, 50.0));

    let (controller, path) = boot(WakeCause::TimerWake, true, &retained, &ConfigRecord::default());

    assert_eq!(path, CycleState::Serving(ServingKind::Session));
    assert_eq!(controller.mode(), DeviceMode::Serving);
}

#[test]
fn test_cold_boot_starts_session_with_unknown_reading() {
    let retained = retained_with(Reading::new(20.0, 50.0));

    let (controller, path) = boot(WakeCause::ColdBoot, false, &retained, &ConfigRecord::default());

    assert_eq!(path, CycleState::Serving(ServingKind::Session));
    assert!(controller.current_reading().is_unknown());
}

// ============================================================================
// Tests: Quick-Sample Zyklen
// ============================================================================

#[test]
fn test_small_change_sleeps_without_publish() {
    let config = publishing_config();
    let mut retained = retained_with(Reading::new(20.0, 50.0));
    let mut sensor = MockSensor::new(vec![Ok(Reading::new(20.1, 50.5))]);
    let mut publisher = MockPublisher::replying(PublishStatus(204));

    let (mut controller, _) = boot(WakeCause::TimerWake, false, &retained, &config);
    let outcome = controller.quick_sample(sensor.read()).unwrap();
    assert_eq!(outcome, QuickOutcome::Sleep);

    // Publish ist aus EnteringSleep nicht mehr erlaubt
    assert_eq!(
        block_on(controller.publish_change(&mut publisher, &config)),
        Err(CycleError::InvalidState(CycleState::EnteringSleep))
    );

    let request = controller.enter_sleep(&mut retained).unwrap();
    assert_eq!(request.reading, Reading::new(20.1, 50.5));
    assert_eq!(request.duration_secs, config.sample_interval_secs);
    assert_eq!(retained.memory().store_count, 1);
    assert_eq!(
        decode_reading(&retained.memory().bytes),
        Some(Reading::new(20.1, 50.5))
    );
    assert!(publisher.published.is_empty());
}

#[test]
fn test_significant_change_publishes_once_then_sleeps() {
    let config = publishing_config();
    let mut retained = retained_with(Reading::new(20.0, 50.0));
    let mut sensor = MockSensor::new(vec![Ok(Reading::new(21.0, 50.0))]);
    let mut publisher = MockPublisher::replying(PublishStatus(204));

    let (mut controller, _) = boot(WakeCause::TimerWake, false, &retained, &config);
    let outcome = controller.quick_sample(sensor.read()).unwrap();
    assert_eq!(outcome, QuickOutcome::WakeAndPublish(Reading::new(21.0, 50.0)));
    assert_eq!(controller.state(), CycleState::Serving(ServingKind::Transient));

    let status = block_on(controller.publish_change(&mut publisher, &config)).unwrap();
    assert_eq!(status, PublishStatus(204));
    assert_eq!(publisher.published, vec![Reading::new(21.0, 50.0)]);
    assert_eq!(publisher.last_host.as_deref(), Some("influx.local"));
    assert_eq!(controller.state(), CycleState::EnteringSleep);

    let request = controller.enter_sleep(&mut retained).unwrap();
    assert_eq!(request.reading, Reading::new(21.0, 50.0));
    assert_eq!(sensor.read_count, 1);
}

#[test]
fn test_failed_publish_still_sleeps() {
    let config = publishing_config();
    let mut retained = retained_with(Reading::new(20.0, 50.0));
    let mut publisher = MockPublisher::replying(PublishStatus::CONNECTION_FAILED);

    let (mut controller, _) = boot(WakeCause::TimerWake, false, &retained, &config);
    controller
        .quick_sample(Ok(Reading::new(25.0, 50.0)))
        .unwrap();

    let status = block_on(controller.publish_change(&mut publisher, &config)).unwrap();
    assert_eq!(status, PublishStatus::CONNECTION_FAILED);
    assert_eq!(publisher.published.len(), 1);

    // Auch ohne erfolgreiches Publish wird der neue Wert Referenz
    let request = controller.enter_sleep(&mut retained).unwrap();
    assert_eq!(request.reading, Reading::new(25.0, 50.0));
}

#[test]
fn test_publish_disabled_skips_publisher() {
    let config = ConfigRecord::default();
    let mut retained = retained_with(Reading::new(20.0, 50.0));
    let mut publisher = MockPublisher::replying(PublishStatus(204));

    let (mut controller, _) = boot(WakeCause::TimerWake, false, &retained, &config);
    controller
        .quick_sample(Ok(Reading::new(20.0, 55.0)))
        .unwrap();

    let status = block_on(controller.publish_change(&mut publisher, &config)).unwrap();
    assert_eq!(status, PublishStatus::NONE);
    assert!(publisher.published.is_empty());
    assert!(controller.enter_sleep(&mut retained).is_ok());
}

#[test]
fn test_sensor_failure_keeps_previous_reading() {
    let config = ConfigRecord::default();
    let mut retained = retained_with(Reading::new(20.0, 50.0));
    let mut sensor = MockSensor::new(vec![Err(SensorError::ReadFailed)]);

    let (mut controller, _) = boot(WakeCause::TimerWake, false, &retained, &config);
    let outcome = controller.quick_sample(sensor.read()).unwrap();
    assert_eq!(outcome, QuickOutcome::Sleep);

    let request = controller.enter_sleep(&mut retained).unwrap();
    assert_eq!(request.reading, Reading::new(20.0, 50.0));
}

#[test]
fn test_unknown_sample_is_treated_like_read_failure() {
    let config = publishing_config();
    let mut retained = RetainedState::new(MockRetainedMemory::default());
    let mut sensor = MockSensor::new(vec![Ok(Reading::UNKNOWN)]);
    let mut publisher = MockPublisher::replying(PublishStatus(204));

    let (mut controller, _) = boot(WakeCause::TimerWake, false, &retained, &config);
    let outcome = controller.quick_sample(sensor.read()).unwrap();
    assert_eq!(outcome, QuickOutcome::Sleep);
    assert_eq!(controller.state(), CycleState::EnteringSleep);

    assert!(block_on(controller.publish_change(&mut publisher, &config)).is_err());
    assert!(publisher.published.is_empty());
    assert!(controller.enter_sleep(&mut retained).is_ok());
}

#[test]
fn test_partly_nan_sample_keeps_previous_reading() {
    let config = publishing_config();
    let mut retained = retained_with(Reading::new(20.0, 50.0));

    let (mut controller, _) = boot(WakeCause::TimerWake, false, &retained, &config);
    let outcome = controller
        .quick_sample(Ok(Reading::new(25.0, f32::NAN)))
        .unwrap();
    assert_eq!(outcome, QuickOutcome::Sleep);

    let request = controller.enter_sleep(&mut retained).unwrap();
    assert_eq!(request.reading, Reading::new(20.0, 50.0));
    assert_eq!(
        retained.restore_after_wake(WakeCause::TimerWake),
        Reading::new(20.0, 50.0)
    );
}

#[test]
fn test_unknown_retained_reading_wakes_on_first_sample() {
    let config = ConfigRecord::default();
    let retained = RetainedState::new(MockRetainedMemory::default());

    let (mut controller, path) = boot(WakeCause::TimerWake, false, &retained, &config);
    assert_eq!(path, CycleState::QuickSample);

    let outcome = controller.quick_sample(Ok(Reading::new(18.0, 45.0))).unwrap();
    assert_eq!(outcome, QuickOutcome::WakeAndPublish(Reading::new(18.0, 45.0)));
}

// ============================================================================
// Tests: Sitzung → Low-Power
// ============================================================================

#[test]
fn test_low_power_request_persists_latest_session_reading() {
    let config = ConfigRecord::default();
    let mut retained = retained_with(Reading::new(20.0, 50.0));

    let (mut controller, _) = boot(WakeCause::ColdBoot, false, &retained, &config);
    controller.request_low_power(Reading::new(22.5, 41.0)).unwrap();
    controller.set_sample_interval(300);

    let request = controller.enter_sleep(&mut retained).unwrap();
    assert_eq!(request.duration_secs, 300);
    assert_eq!(
        retained.restore_after_wake(WakeCause::TimerWake),
        Reading::new(22.5, 41.0)
    );
}

#[test]
fn test_low_power_is_rejected_outside_session() {
    let retained = retained_with(Reading::new(20.0, 50.0));

    let (mut controller, _) = boot(WakeCause::TimerWake, false, &retained, &ConfigRecord::default());

    assert_eq!(
        controller.request_low_power(Reading::new(22.0, 40.0)),
        Err(CycleError::InvalidState(CycleState::QuickSample))
    );
}

#[test]
fn test_steps_out_of_order_are_rejected() {
    let mut controller = DutyCycleController::new(10);
    let mut retained = RetainedState::new(MockRetainedMemory::default());

    assert_eq!(
        controller.quick_sample(Ok(Reading::new(20.0, 50.0))),
        Err(CycleError::InvalidState(CycleState::Booting))
    );
    assert_eq!(
        controller.enter_sleep(&mut retained),
        Err(CycleError::InvalidState(CycleState::Booting))
    );
    assert_eq!(retained.memory().store_count, 0);

    controller.booted().unwrap();
    assert_eq!(
        controller.booted(),
        Err(CycleError::InvalidState(CycleState::DecidingWakePath))
    );
}

// ============================================================================
// Tests: Sampling in der Sitzung
// ============================================================================

#[test]
fn test_serving_sampler_publishes_only_significant_changes() {
    let mut sensor = MockSensor::new(vec![
        Ok(Reading::new(20.0, 50.0)),
        Ok(Reading::new(20.1, 50.0)),
        Err(SensorError::ReadFailed),
        Ok(Reading::new(20.3, 50.0)),
    ]);
    let mut sampler = ServingSampler::new();

    let outcomes: Vec<TickOutcome> = (0..4).map(|_| sampler.on_tick(sensor.read())).collect();

    assert_eq!(
        outcomes,
        vec![
            TickOutcome::Publish(Reading::new(20.0, 50.0)),
            TickOutcome::Unchanged(Reading::new(20.1, 50.0)),
            TickOutcome::ReadFailed(SensorError::ReadFailed),
            TickOutcome::Publish(Reading::new(20.3, 50.0)),
        ]
    );
    assert_eq!(sampler.last_published(), Reading::new(20.3, 50.0));
}

#[test]
fn test_serving_sampler_keeps_latest_on_failure() {
    let mut sampler = ServingSampler::with_latest(Reading::new(19.0, 60.0));

    assert_eq!(
        sampler.on_tick(Ok(Reading::UNKNOWN)),
        TickOutcome::ReadFailed(SensorError::InvalidData)
    );
    assert_eq!(sampler.latest(), Reading::new(19.0, 60.0));
}
