//! Unit tests for the runtime-message handler, driven the way the stdio
//! server drives it: JSON messages in, JSON replies out.

use passfill::app::App;
use passfill::database::Database;
use passfill::rpc_handler::handle_message;
use passfill::services::transport::HttpTransport;
use passfill::types::message::RuntimeMessage;
use passfill::types::settings::RelaySettings;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LOGIN_PAGE: &str = r#"<form id="login"><input type="text" id="user" name="username"><input type="password" id="pw" name="password"></form>"#;

fn app_for(server: &MockServer) -> App {
    App::with_transport(
        Database::open_in_memory().unwrap(),
        RelaySettings::default(),
        Box::new(HttpTransport::new(&server.uri())),
    )
}

async fn send(app: &App, message: Value) -> Result<Value, String> {
    let message: RuntimeMessage = serde_json::from_value(message).unwrap();
    handle_message(app, message).await
}

async fn open_login_tab(app: &App) -> String {
    let reply = send(
        app,
        json!({"action": "openTab", "url": "https://example.com/login", "html": LOGIN_PAGE}),
    )
    .await
    .unwrap();
    reply["tabId"].as_str().unwrap().to_string()
}

fn page_values(app: &App, tab: &str) -> Vec<String> {
    use passfill::managers::tab_manager::TabManagerTrait;
    let tabs = app.tabs.lock().unwrap();
    tabs.content_script(tab)
        .unwrap()
        .document()
        .inputs()
        .iter()
        .map(|i| i.value.clone())
        .collect()
}

#[tokio::test]
async fn test_ping() {
    let server = MockServer::start().await;
    let app = app_for(&server);

    let reply = send(&app, json!({"action": "ping"})).await.unwrap();

    assert_eq!(reply["pong"], json!(true));
    assert_eq!(reply["version"], json!(env!("CARGO_PKG_VERSION")));
}

#[tokio::test]
async fn test_open_list_close_tabs() {
    let server = MockServer::start().await;
    let app = app_for(&server);

    let first = open_login_tab(&app).await;
    let second = send(
        &app,
        json!({"action": "openTab", "url": "https://other.example", "active": false}),
    )
    .await
    .unwrap()["tabId"]
        .as_str()
        .unwrap()
        .to_string();

    let listed = send(&app, json!({"action": "listTabs"})).await.unwrap();
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["id"], json!(first));
    assert_eq!(listed[0]["active"], json!(true));
    assert_eq!(listed[0]["scriptable"], json!(true));
    assert_eq!(listed[1]["id"], json!(second));
    assert_eq!(listed[1]["scriptable"], json!(false));

    send(&app, json!({"action": "closeTab", "tabId": second})).await.unwrap();
    let listed = send(&app, json!({"action": "listTabs"})).await.unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let err = send(&app, json!({"action": "closeTab", "tabId": "nope"})).await.unwrap_err();
    assert!(err.contains("nope"));
}

#[tokio::test]
async fn test_fill_without_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let app = app_for(&server);
    open_login_tab(&app).await;

    let reply = send(&app, json!({"action": "fill"})).await.unwrap();

    assert!(reply["error"].as_str().unwrap().contains("token"));
}

#[tokio::test]
async fn test_fill_single_match() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"url": "https://example.com/login", "token": "secret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok", "mode": "single", "username": "dana", "password": "pw"
        })))
        .expect(1)
        .mount(&server)
        .await;
    let app = app_for(&server);
    let tab = open_login_tab(&app).await;
    send(&app, json!({"action": "setToken", "token": "secret"})).await.unwrap();

    let reply = send(&app, json!({"action": "fill"})).await.unwrap();

    assert_eq!(
        reply,
        json!({
            "status": "ok",
            "mode": "single",
            "tabId": tab,
            "usernameFilled": true,
            "passwordFilled": true,
        })
    );
    assert_eq!(page_values(&app, &tab), vec!["dana", "pw"]);
}

#[tokio::test]
async fn test_fill_multiple_then_fill_entry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok", "mode": "multiple", "entries": [
                {"url": "https://example.com", "username": "one", "password": "p1", "entryname": "One"},
                {"url": "https://example.com", "username": "two", "password": "p2"}
            ]
        })))
        .mount(&server)
        .await;
    let app = app_for(&server);
    let tab = open_login_tab(&app).await;
    send(&app, json!({"action": "setToken", "token": "secret"})).await.unwrap();

    let reply = send(&app, json!({"action": "fill", "tabId": tab})).await.unwrap();

    assert_eq!(reply["mode"], json!("multiple"));
    let entries = reply["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["name"], json!("One"));
    assert_eq!(entries[1]["username"], json!("two"));
    assert_eq!(page_values(&app, &tab), vec!["", ""]);

    let reply = send(
        &app,
        json!({"action": "fillEntry", "tabId": tab, "username": "two", "password": "p2"}),
    )
    .await
    .unwrap();
    assert_eq!(reply["success"], json!(true));
    assert_eq!(page_values(&app, &tab), vec!["two", "p2"]);
}

#[tokio::test]
async fn test_fill_not_found_reports_domain() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "not_found"})))
        .mount(&server)
        .await;
    let app = app_for(&server);
    open_login_tab(&app).await;
    send(&app, json!({"action": "setToken", "token": "secret"})).await.unwrap();

    let reply = send(&app, json!({"action": "fill"})).await.unwrap();

    assert_eq!(reply, json!({"status": "not_found", "domain": "example.com"}));
}

#[tokio::test]
async fn test_fill_url_override() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"url": "https://sso.example.net/"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "not_found"})))
        .expect(1)
        .mount(&server)
        .await;
    let app = app_for(&server);
    open_login_tab(&app).await;
    send(&app, json!({"action": "setToken", "token": "secret"})).await.unwrap();

    let reply = send(&app, json!({"action": "fill", "url": "https://sso.example.net/"}))
        .await
        .unwrap();

    assert_eq!(reply["domain"], json!("sso.example.net"));
}

#[tokio::test]
async fn test_fill_unknown_tab() {
    let server = MockServer::start().await;
    let app = app_for(&server);

    let err = send(&app, json!({"action": "fill", "tabId": "missing"})).await.unwrap_err();

    assert_eq!(err, "Tab not found: missing");
}

#[tokio::test]
async fn test_set_and_clear_token() {
    let server = MockServer::start().await;
    let app = app_for(&server);

    let reply = send(&app, json!({"action": "setToken", "token": " abc "})).await.unwrap();
    assert_eq!(reply, json!({"success": true}));
    assert_eq!(app.relay.token().unwrap(), Some("abc".to_string()));

    send(&app, json!({"action": "clearToken"})).await.unwrap();
    assert_eq!(app.relay.token().unwrap(), None);

    assert!(send(&app, json!({"action": "setToken", "token": ""})).await.is_err());
}

#[tokio::test]
async fn test_clipboard_fill() {
    let server = MockServer::start().await;
    let app = app_for(&server);
    let tab = open_login_tab(&app).await;

    send(&app, json!({"action": "setClipboard", "text": "erin\nswordfish"}))
        .await
        .unwrap();
    let reply = send(&app, json!({"action": "fillClipboard"})).await.unwrap();

    assert_eq!(reply["success"], json!(true));
    assert_eq!(page_values(&app, &tab), vec!["erin", "swordfish"]);
    assert_eq!(app.clipboard.lock().unwrap().contents(), "");

    let reply = send(&app, json!({"action": "fillClipboard", "tabId": tab})).await.unwrap();
    assert!(reply["error"].is_string());
}

#[tokio::test]
async fn test_locate_reports_fields() {
    let server = MockServer::start().await;
    let app = app_for(&server);
    open_login_tab(&app).await;

    let reply = send(&app, json!({"action": "locate"})).await.unwrap();

    assert_eq!(reply["username"]["id"], json!("user"));
    assert_eq!(reply["username"]["type"], json!("text"));
    assert_eq!(reply["password"]["name"], json!("password"));
}

#[tokio::test]
async fn test_locate_without_content_script() {
    let server = MockServer::start().await;
    let app = app_for(&server);
    let tab = send(&app, json!({"action": "openTab", "url": "about:blank"}))
        .await
        .unwrap()["tabId"]
        .as_str()
        .unwrap()
        .to_string();

    let err = send(&app, json!({"action": "locate", "tabId": tab})).await.unwrap_err();

    assert!(err.starts_with("No content script"));
}
