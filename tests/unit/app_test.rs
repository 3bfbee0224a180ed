//! Unit tests for app startup with each transport configuration.

use passfill::app::App;
use passfill::managers::tab_manager::TabManagerTrait;
use passfill::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use passfill::services::transport::CredentialTransport;
use passfill::types::errors::RelayError;
use passfill::types::settings::TransportKind;
use serde_json::json;
use tempfile::TempDir;

const LOGIN_PAGE: &str = r#"<form><input type="text" name="user"><input type="password" name="pw"></form>"#;

fn settings_in(dir: &TempDir) -> SettingsEngine {
    let path = dir.path().join("settings.json").to_string_lossy().to_string();
    SettingsEngine::new(Some(path))
}

#[tokio::test]
async fn test_unstartable_native_host_fails_fill_not_startup() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = settings_in(&dir);
    engine.load().unwrap();
    engine.set_value("transport.kind", json!("native")).unwrap();
    engine
        .set_value("transport.native_host.command", json!("/nonexistent/passfill-host"))
        .unwrap();

    let db_path = dir.path().join("passfill.db");
    let app = App::new(&db_path.to_string_lossy(), &mut engine).unwrap();
    assert_eq!(app.settings.transport.kind, TransportKind::Native);

    app.relay.set_token("tok").unwrap();
    assert_eq!(app.relay.token().unwrap().as_deref(), Some("tok"));

    let ctx = {
        let mut tabs = app.tabs.lock().unwrap();
        tabs.open_tab("https://example.com/login", Some(LOGIN_PAGE), true);
        tabs.active_context().unwrap()
    };
    assert!(matches!(
        app.relay.request_fill(&ctx).await.unwrap_err(),
        RelayError::TransportUnreachable(_)
    ));
}

#[tokio::test]
async fn test_default_settings_start_http_app() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = settings_in(&dir);

    let db_path = dir.path().join("passfill.db");
    let app = App::new(&db_path.to_string_lossy(), &mut engine).unwrap();
    assert_eq!(app.relay.transport().kind(), TransportKind::Http);
    assert!(!app.relay.has_token().unwrap());
}
