//! Integration Tests für Config-Store und Settings-API
//!
//! Diese Tests laufen auf dem Host (x86_64) und nutzen MockConfigStorage

mod common;

use common::MockConfigStorage;
use klima_core::api::{render_error, render_publish_status, render_reading, render_settings};
use klima_core::config_store::SCHEMA_TAG;
use klima_core::{
    ConfigError, ConfigRecord, ConfigStore, Field, PublishStatus, Reading, SettingsError,
    StorageCorrupt, StorageError, ValidationError, Violation, apply_settings,
};

fn saved_store(record: &ConfigRecord) -> ConfigStore<MockConfigStorage> {
    let mut store = ConfigStore::new(MockConfigStorage::erased());
    store.save(record).unwrap();
    store.storage_mut().write_count = 0;
    store
}

fn publishing_record() -> ConfigRecord {
    let mut record = ConfigRecord::default();
    record.publish_enabled = true;
    record.publish_target.host = "influx.local".try_into().unwrap();
    record.publish_target.database = "klima".try_into().unwrap();
    record
}

// ============================================================================
// Tests: ConfigStore laden
// ============================================================================

#[test]
fn test_erased_flash_heals_to_defaults() {
    let mut store = ConfigStore::new(MockConfigStorage::erased());

    let report = store.load_detailed();

    assert_eq!(report.record, ConfigRecord::default());
    assert_eq!(
        report.discarded,
        Some(StorageCorrupt::UnknownSchemaTag(0xFFFF_FFFF))
    );
    assert_eq!(report.heal_error, None);
    assert_eq!(store.storage().write_count, 1);
    assert_eq!(&store.storage().bytes[..4], &SCHEMA_TAG.to_le_bytes());
}

#[test]
fn test_healed_storage_loads_cleanly() {
    let mut store = ConfigStore::new(MockConfigStorage::erased());
    store.load();

    let report = store.load_detailed();

    assert_eq!(report.record, ConfigRecord::default());
    assert_eq!(report.discarded, None);
    assert_eq!(store.storage().write_count, 1);
}

#[test]
fn test_save_then_load_returns_same_record() {
    let record = publishing_record();
    let mut store = saved_store(&record);

    assert_eq!(store.load(), record);
    assert_eq!(store.storage().write_count, 0);
}

#[test]
fn test_save_survives_new_store_instance() {
    let record = publishing_record();
    let store = saved_store(&record);

    let mut reopened = ConfigStore::new(MockConfigStorage {
        bytes: store.storage().bytes,
        ..MockConfigStorage::erased()
    });

    assert_eq!(reopened.load(), record);
}

#[test]
fn test_out_of_domain_value_is_discarded() {
    let mut store = saved_store(&ConfigRecord::default());
    // Erstes Feld nach dem Tag: Intervall als varint (10 → 0)
    assert_eq!(store.storage().bytes[4], 10);
    store.storage_mut().bytes[4] = 0;

    let report = store.load_detailed();

    assert_eq!(
        report.discarded,
        Some(StorageCorrupt::OutOfDomain(Field::SampleIntervalSeconds))
    );
    assert_eq!(report.record, ConfigRecord::default());
    assert_eq!(store.storage().write_count, 1);
}

#[test]
fn test_garbage_payload_with_valid_tag_is_undecodable() {
    let mut storage = MockConfigStorage::erased();
    storage.bytes[..4].copy_from_slice(&SCHEMA_TAG.to_le_bytes());
    let mut store = ConfigStore::new(storage);

    let report = store.load_detailed();

    assert_eq!(report.discarded, Some(StorageCorrupt::Undecodable));
    assert_eq!(report.record, ConfigRecord::default());
}

#[test]
fn test_unreadable_storage_falls_back_to_defaults() {
    let mut storage = MockConfigStorage::erased();
    storage.fail_reads = true;
    let mut store = ConfigStore::new(storage);

    let report = store.load_detailed();

    assert_eq!(report.discarded, Some(StorageCorrupt::Unreadable));
    assert_eq!(report.record, ConfigRecord::default());
    assert_eq!(report.heal_error, None);
}

#[test]
fn test_read_error_does_not_overwrite_stored_record() {
    let record = publishing_record();
    let mut store = saved_store(&record);
    store.storage_mut().fail_reads = true;

    assert_eq!(store.load(), ConfigRecord::default());
    assert_eq!(store.storage().write_count, 0);

    // Nächster Boot liest wieder normal
    store.storage_mut().fail_reads = false;
    assert_eq!(store.load(), record);
}

#[test]
fn test_failed_heal_is_reported() {
    let mut storage = MockConfigStorage::erased();
    storage.fail_next_write = true;
    let mut store = ConfigStore::new(storage);

    let report = store.load_detailed();

    assert_eq!(report.record, ConfigRecord::default());
    assert_eq!(report.heal_error, Some(StorageError::WriteFailed));
    assert_eq!(store.storage().write_count, 0);
}

// ============================================================================
// Tests: ConfigStore speichern
// ============================================================================

#[test]
fn test_save_rejects_out_of_range_interval_without_writing() {
    let mut store = saved_store(&ConfigRecord::default());
    let before = store.storage().bytes;

    let mut record = ConfigRecord::default();
    record.sample_interval_secs = 0;

    assert_eq!(
        store.save(&record),
        Err(ConfigError::Validation(ValidationError::new(
            Field::SampleIntervalSeconds,
            Violation::OutOfRange
        )))
    );
    assert_eq!(store.storage().write_count, 0);
    assert_eq!(store.storage().bytes, before);
}

#[test]
fn test_save_reports_storage_failure() {
    let mut store = saved_store(&ConfigRecord::default());
    store.storage_mut().fail_next_write = true;

    assert_eq!(
        store.save(&publishing_record()),
        Err(ConfigError::Storage(StorageError::WriteFailed))
    );
}

#[test]
fn test_reset_to_defaults_overwrites_record() {
    let mut store = saved_store(&publishing_record());

    let record = store.reset_to_defaults().unwrap();

    assert_eq!(record, ConfigRecord::default());
    assert_eq!(store.load(), ConfigRecord::default());
    assert_eq!(store.storage().write_count, 1);
}

// ============================================================================
// Tests: Settings-API
// ============================================================================

#[test]
fn test_enabling_publish_with_empty_host_is_rejected() {
    let current = ConfigRecord::default();
    let mut store = saved_store(&current);
    let before = store.storage().bytes;

    let result = apply_settings(
        &mut store,
        &current,
        br#"{"publishEnabled":true,"publishTarget":{"host":""}}"#,
    );

    let err = result.unwrap_err();
    assert_eq!(
        err,
        SettingsError::Invalid(ValidationError::new(Field::PublishHost, Violation::Empty))
    );
    assert_eq!(err.status_code(), 400);
    assert_eq!(store.storage().write_count, 0);
    assert_eq!(store.storage().bytes, before);
}

#[test]
fn test_partial_update_keeps_other_fields() {
    let current = publishing_record();
    let mut store = saved_store(&current);

    let record = apply_settings(&mut store, &current, br#"{"sampleIntervalSeconds":60}"#).unwrap();

    assert_eq!(record.sample_interval_secs, 60);
    assert_eq!(record.publish_target, current.publish_target);
    assert_eq!(record.normal_contrast, current.normal_contrast);
    assert_eq!(store.load(), record);
}

#[test]
fn test_nested_target_update_merges_field_by_field() {
    let current = publishing_record();
    let mut store = saved_store(&current);

    let record = apply_settings(
        &mut store,
        &current,
        br#"{"publishTarget":{"port":9999,"tags":"room=office"}}"#,
    )
    .unwrap();

    assert_eq!(record.publish_target.port, 9999);
    assert_eq!(record.publish_target.tags.as_str(), "room=office");
    assert_eq!(record.publish_target.host.as_str(), "influx.local");
    assert_eq!(record.publish_target.database.as_str(), "klima");
}

#[test]
fn test_enabling_publish_with_complete_target_is_saved() {
    let current = ConfigRecord::default();
    let mut store = saved_store(&current);

    let record = apply_settings(
        &mut store,
        &current,
        br#"{"publishEnabled":true,"publishTarget":{"host":"influx.local","database":"klima"}}"#,
    )
    .unwrap();

    assert_eq!(record, publishing_record());
    assert_eq!(store.storage().write_count, 1);
}

#[test]
fn test_malformed_body_is_rejected() {
    let current = ConfigRecord::default();
    let mut store = saved_store(&current);

    let err = apply_settings(&mut store, &current, br#"{"sampleIntervalSeconds":"#).unwrap_err();

    assert_eq!(err, SettingsError::Malformed);
    assert_eq!(err.status_code(), 400);
    assert_eq!(store.storage().write_count, 0);
}

#[test]
fn test_interval_out_of_range_is_rejected() {
    let current = ConfigRecord::default();
    let mut store = saved_store(&current);

    for body in [
        &br#"{"sampleIntervalSeconds":0}"#[..],
        &br#"{"sampleIntervalSeconds":86401}"#[..],
    ] {
        let err = apply_settings(&mut store, &current, body).unwrap_err();
        assert_eq!(
            err,
            SettingsError::Invalid(ValidationError::new(
                Field::SampleIntervalSeconds,
                Violation::OutOfRange
            ))
        );
    }
    assert_eq!(store.storage().write_count, 0);
}

#[test]
fn test_too_long_host_is_rejected() {
    let current = ConfigRecord::default();
    let mut store = saved_store(&current);

    let err = apply_settings(
        &mut store,
        &current,
        br#"{"publishTarget":{"host":"a-very-long-hostname.example"}}"#,
    )
    .unwrap_err();

    assert_eq!(
        err,
        SettingsError::Invalid(ValidationError::new(Field::PublishHost, Violation::TooLong))
    );
}

#[test]
fn test_escaped_string_is_rejected() {
    let current = ConfigRecord::default();
    let mut store = saved_store(&current);

    let err = apply_settings(
        &mut store,
        &current,
        br#"{"publishTarget":{"tags":"name=a"b"}}"#,
    )
    .unwrap_err();

    assert_eq!(
        err,
        SettingsError::Invalid(ValidationError::new(Field::PublishTags, Violation::Escaped))
    );
    assert_eq!(err.status_code(), 400);
    assert_eq!(store.storage().write_count, 0);
}

#[test]
fn test_storage_failure_maps_to_server_error() {
    let current = ConfigRecord::default();
    let mut store = saved_store(&current);
    store.storage_mut().fail_next_write = true;

    let err = apply_settings(&mut store, &current, br#"{"normalDisplayContrast":128}"#).unwrap_err();

    assert_eq!(err, SettingsError::Storage(StorageError::WriteFailed));
    assert_eq!(err.status_code(), 500);
}

// ============================================================================
// Tests: JSON-Antworten
// ============================================================================

fn rendered(render: impl FnOnce(&mut [u8]) -> Result<usize, SettingsError>) -> String {
    let mut buf = [0u8; 384];
    let len = render(&mut buf).unwrap();
    String::from_utf8(buf[..len].to_vec()).unwrap()
}

#[test]
fn test_render_settings_uses_api_names() {
    let json = rendered(|buf| render_settings(&ConfigRecord::default(), buf));

    assert!(json.starts_with(r#"{"sampleIntervalSeconds":10,"#));
    assert!(json.contains(r#""lowPowerDisplayContrast":16"#));
    assert!(json.contains(r#""normalDisplayContrast":255"#));
    assert!(json.contains(r#""publishEnabled":false"#));
    assert!(json.contains(r#""publishTarget":{"host":"","port":8086,"#));
}

#[test]
fn test_render_validation_error_names_field() {
    let err = SettingsError::Invalid(ValidationError::new(Field::PublishHost, Violation::Empty));

    let json = rendered(|buf| render_error(&err, buf));

    assert_eq!(
        json,
        r#"{"field":"publishTarget.host","message":"must not be empty when publishing is enabled"}"#
    );
}

#[test]
fn test_render_malformed_error_has_no_field() {
    let json = rendered(|buf| render_error(&SettingsError::Malformed, buf));

    assert_eq!(json, r#"{"message":"malformed JSON"}"#);
}

#[test]
fn test_render_unknown_reading_as_null() {
    let json = rendered(|buf| render_reading(&Reading::UNKNOWN, buf));

    assert_eq!(json, r#"{"temperatureC":null,"humidityPct":null}"#);
}

#[test]
fn test_render_publish_status_code() {
    let json = rendered(|buf| render_publish_status(PublishStatus::DNS_FAILED, buf));

    assert_eq!(json, r#"{"status":-2}"#);
}

#[test]
fn test_unknown_reading_status_has_own_code() {
    let json = rendered(|buf| render_publish_status(PublishStatus::UNKNOWN_READING, buf));

    assert_eq!(json, r#"{"status":-6}"#);
    assert_ne!(PublishStatus::UNKNOWN_READING, PublishStatus::REQUEST_TOO_LARGE);
}

#[test]
fn test_render_into_small_buffer_fails() {
    let mut buf = [0u8; 8];

    assert_eq!(
        render_settings(&ConfigRecord::default(), &mut buf),
        Err(SettingsError::ResponseTooLarge)
    );
}
