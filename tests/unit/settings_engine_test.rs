//! Integration-level unit tests for the SettingsEngine public API.
//!
//! These tests exercise the SettingsEngine through its public trait interface,
//! validating default loading, value persistence, and reset behavior.

use passfill::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use passfill::types::errors::SettingsError;
use passfill::types::settings::{LocatorStrategy, RelaySettings, TransportKind};
use rstest::rstest;
use tempfile::TempDir;

/// Helper: create a SettingsEngine backed by a temp directory that lives for the
/// duration of the test (the caller holds the `TempDir` handle).
fn engine_in_temp(dir: &TempDir) -> SettingsEngine {
    let path = dir
        .path()
        .join("settings.json")
        .to_string_lossy()
        .to_string();
    SettingsEngine::new(Some(path))
}

#[test]
fn test_load_defaults_when_no_config_file_exists() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);

    let settings = engine.load().unwrap();

    assert_eq!(settings, RelaySettings::default());
}

#[test]
fn test_default_values() {
    let defaults = RelaySettings::default();
    assert_eq!(defaults.transport.kind, TransportKind::Http);
    assert_eq!(defaults.transport.server_url, "http://127.0.0.1:9123");
    assert_eq!(defaults.transport.request_timeout_ms, 5000);
    assert_eq!(defaults.fill.locator_strategy, LocatorStrategy::Scoped);
    assert_eq!(defaults.popup.min_height, 260);
    assert_eq!(defaults.popup.max_height, 600);
    assert_eq!(defaults.popup.chrome_padding, 80);
}

#[test]
fn test_set_value_persists_changes() {
    let dir = TempDir::new().unwrap();

    {
        let mut engine = engine_in_temp(&dir);
        engine.load().unwrap();
        engine
            .set_value(
                "transport.server_url",
                serde_json::Value::String("http://127.0.0.1:9999".to_string()),
            )
            .unwrap();
    }

    let mut engine = engine_in_temp(&dir);
    let loaded = engine.load().unwrap();
    assert_eq!(loaded.transport.server_url, "http://127.0.0.1:9999");
}

#[test]
fn test_config_file_uses_lowercase_enum_names() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load().unwrap();
    engine.save().unwrap();

    let raw = std::fs::read_to_string(engine.get_config_path()).unwrap();
    assert!(raw.contains("\"http\""), "config: {}", raw);
    assert!(raw.contains("\"scoped\""), "config: {}", raw);
}

#[test]
fn test_native_host_args_can_be_replaced() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load().unwrap();

    engine
        .set_value(
            "transport.native_host.args",
            serde_json::json!(["--native-host", "--profile", "work"]),
        )
        .unwrap();

    assert_eq!(
        engine.get_settings().transport.native_host.args,
        vec!["--native-host", "--profile", "work"]
    );
}

#[rstest]
#[case("", serde_json::json!(true))]
#[case("transport.nonexistent", serde_json::json!(true))]
#[case("transport.server_url.deeper", serde_json::json!("x"))]
fn test_set_value_invalid_key(#[case] key: &str, #[case] value: serde_json::Value) {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load().unwrap();

    let result = engine.set_value(key, value);
    assert!(matches!(result, Err(SettingsError::InvalidKey(_))), "key {:?}", key);
}

#[rstest]
#[case("transport.kind", serde_json::json!("carrier-pigeon"))]
#[case("transport.request_timeout_ms", serde_json::json!("fast"))]
#[case("popup.max_height", serde_json::json!(-1))]
fn test_set_value_invalid_value(#[case] key: &str, #[case] value: serde_json::Value) {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load().unwrap();

    let result = engine.set_value(key, value);
    assert!(matches!(result, Err(SettingsError::InvalidValue(_))), "key {:?}", key);
    assert_eq!(*engine.get_settings(), RelaySettings::default());
}

#[test]
fn test_reset_restores_defaults() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load().unwrap();
    engine
        .set_value("transport.kind", serde_json::json!("native"))
        .unwrap();

    engine.reset().unwrap();

    assert_eq!(*engine.get_settings(), RelaySettings::default());
    let mut reloaded = engine_in_temp(&dir);
    assert_eq!(reloaded.load().unwrap(), RelaySettings::default());
}

#[rstest]
#[case("transport.request_timeout_ms", serde_json::json!(0))]
#[case("transport.server_url", serde_json::json!("not a url"))]
#[case("transport.server_url", serde_json::json!("ftp://127.0.0.1:9123"))]
#[case("popup.min_height", serde_json::json!(601))]
#[case("popup.max_height", serde_json::json!(259))]
fn test_set_value_rejects_constraint_violations(
    #[case] key: &str,
    #[case] value: serde_json::Value,
) {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load().unwrap();

    let result = engine.set_value(key, value);
    assert!(matches!(result, Err(SettingsError::InvalidValue(_))), "key {:?}", key);
    assert_eq!(*engine.get_settings(), RelaySettings::default());
    assert!(!std::path::Path::new(engine.get_config_path()).exists());
}

#[test]
fn test_native_transport_needs_a_command() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load().unwrap();
    engine
        .set_value("transport.native_host.command", serde_json::json!(""))
        .unwrap();

    let result = engine.set_value("transport.kind", serde_json::json!("native"));
    assert!(matches!(result, Err(SettingsError::InvalidValue(_))));
    assert_eq!(engine.get_settings().transport.kind, TransportKind::Http);
}

#[test]
fn test_load_rejects_file_breaking_constraints() {
    let dir = TempDir::new().unwrap();
    let mut settings = RelaySettings::default();
    settings.popup.min_height = 700;
    let path = dir.path().join("settings.json");
    std::fs::write(&path, serde_json::to_string(&settings).unwrap()).unwrap();

    let mut engine = engine_in_temp(&dir);
    assert!(matches!(engine.load(), Err(SettingsError::InvalidValue(_))));
}

#[test]
fn test_set_value_replaces_whole_section() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load().unwrap();

    engine
        .set_value(
            "popup",
            serde_json::json!({"min_height": 300, "max_height": 320, "chrome_padding": 0}),
        )
        .unwrap();
    assert_eq!(engine.get_settings().popup.max_height, 320);
}
