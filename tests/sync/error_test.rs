/*!
 * Error Surface Tests
 * Serialized shape and diagnostics of SyncError
 */

use agent_sync::{
    CountdownEvent, Mutex, PrimitiveKind, Semaphore, SharedPrimitive, SharedRegion, SyncConfig,
    SyncError,
};
use miette::Diagnostic;
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn test_invalid_handle_serializes_tagged() {
    let err = Mutex::attach(Semaphore::new(0, 1).unwrap().buffer(), 0).unwrap_err();
    let value = serde_json::to_value(&err).unwrap();
    assert_eq!(
        value,
        json!({
            "error": "invalid_handle",
            "details": { "expected": "mutex", "word": 0x0010_0000u32 }
        })
    );

    let back: SyncError = serde_json::from_value(value).unwrap();
    assert_eq!(back, err);
}

#[test]
fn test_capacity_exceeded_round_trips_through_json() {
    let err = CountdownEvent::new(1).unwrap().signal(2).unwrap_err();
    assert!(matches!(err, SyncError::CapacityExceeded(_)));

    let text = serde_json::to_string(&err).unwrap();
    assert!(text.contains("\"error\":\"capacity_exceeded\""));
    assert_eq!(serde_json::from_str::<SyncError>(&text).unwrap(), err);
}

#[test]
fn test_diagnostic_codes() {
    let err = Mutex::attach(&SharedRegion::new(0), 0).unwrap_err();
    assert_eq!(err.code().map(|c| c.to_string()), Some("sync::out_of_range".into()));
    assert!(err.help().is_some());

    let err = Mutex::attach(&SharedRegion::new(8), 2).unwrap_err();
    assert_eq!(err.code().map(|c| c.to_string()), Some("sync::not_aligned".into()));
    assert_eq!(
        err.to_string(),
        "Not aligned: byte offset 2 is not a multiple of 4"
    );
}

#[test]
fn test_report_carries_diagnostic() {
    let err = Mutex::attach(&SharedRegion::new(8), 2).unwrap_err();
    let report = miette::Report::new(err.clone());

    assert_eq!(report.code().map(|c| c.to_string()), Some("sync::not_aligned".into()));
    assert_eq!(report.to_string(), err.to_string());
    assert_eq!(report.downcast_ref::<SyncError>(), Some(&err));
}

#[test]
fn test_invalid_handle_message_names_kind() {
    let region = SharedRegion::new(16);
    Mutex::attach(&region, 0).unwrap();

    let err = Semaphore::attach(&region, 0).unwrap_err();
    assert!(matches!(
        err,
        SyncError::InvalidHandle { expected: PrimitiveKind::Semaphore, .. }
    ));
    assert_eq!(
        err.to_string(),
        "Invalid handle: expected Semaphore, found word 0x00040000"
    );

    let err = agent_sync::ManualResetEvent::attach(&region, 0).unwrap_err();
    assert!(err.to_string().starts_with("Invalid handle: expected ManualResetEvent"));
}

#[test]
fn test_config_serializes() {
    let config = SyncConfig::low_latency();
    let value = serde_json::to_value(config).unwrap();
    assert_eq!(value["spin_limit"], json!(100));
    let back: SyncConfig = serde_json::from_value(value).unwrap();
    assert_eq!(back, config);
}
