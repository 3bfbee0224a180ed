//! Unit tests for the HTTP transport against a mocked extension server.

use passfill::services::transport::{CredentialTransport, HttpTransport};
use passfill::types::credential::FillResponse;
use passfill::types::errors::RelayError;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAGE: &str = "https://example.com/login";

async fn respond_with(template: ResponseTemplate) -> (MockServer, HttpTransport) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(template)
        .mount(&server)
        .await;
    let transport = HttpTransport::new(&server.uri());
    (server, transport)
}

#[tokio::test]
async fn test_posts_fill_request_with_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_json(json!({"action": "fill", "url": PAGE, "token": "tok-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "not_found"})))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&server.uri());
    let response = transport.lookup(PAGE, Some("tok-1")).await.unwrap();
    assert_eq!(response, FillResponse::NotFound);
}

#[tokio::test]
async fn test_single_match() {
    let (_server, transport) = respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "status": "ok", "mode": "single", "username": "alice", "password": "pw1"
    })))
    .await;

    match transport.lookup(PAGE, Some("t")).await.unwrap() {
        FillResponse::Single(entry) => {
            assert_eq!(entry.username, "alice");
            assert_eq!(entry.password, "pw1");
        }
        other => panic!("expected Single, got {:?}", other),
    }
}

#[tokio::test]
async fn test_multiple_matches_keep_service_order() {
    let (_server, transport) = respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "status": "ok", "mode": "multiple", "entries": [
            {"url": "https://example.com", "username": "first", "password": "p1"},
            {"url": "https://example.com/admin", "username": "second", "password": "p2"}
        ]
    })))
    .await;

    match transport.lookup(PAGE, Some("t")).await.unwrap() {
        FillResponse::Multiple(entries) => {
            let users: Vec<&str> = entries.iter().map(|e| e.username.as_str()).collect();
            assert_eq!(users, vec!["first", "second"]);
            assert_eq!(entries[1].url, "https://example.com/admin");
        }
        other => panic!("expected Multiple, got {:?}", other),
    }
}

#[tokio::test]
async fn test_service_error_message() {
    let (_server, transport) = respond_with(
        ResponseTemplate::new(200).set_body_json(json!({"status": "error", "message": "Vault is locked"})),
    )
    .await;

    assert_eq!(
        transport.lookup(PAGE, Some("t")).await.unwrap(),
        FillResponse::Error("Vault is locked".to_string())
    );
}

#[tokio::test]
async fn test_unauthorized_body_is_an_error_response() {
    let (_server, transport) =
        respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "invalid token"}))).await;

    assert_eq!(
        transport.lookup(PAGE, Some("wrong")).await.unwrap(),
        FillResponse::Error("invalid token".to_string())
    );
}

#[tokio::test]
async fn test_non_json_error_status() {
    let (_server, transport) =
        respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error")).await;

    match transport.lookup(PAGE, Some("t")).await.unwrap_err() {
        RelayError::ServiceError(msg) => assert!(msg.contains("500"), "message: {}", msg),
        other => panic!("expected ServiceError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unknown_shape_is_protocol_error() {
    let (_server, transport) =
        respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "maybe"}))).await;

    assert!(matches!(
        transport.lookup(PAGE, Some("t")).await.unwrap_err(),
        RelayError::Protocol(_)
    ));
}

#[tokio::test]
async fn test_missing_token_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&server.uri());
    assert_eq!(
        transport.lookup(PAGE, None).await.unwrap_err(),
        RelayError::AuthTokenMissing
    );
}

#[tokio::test]
async fn test_unreachable_server() {
    let transport = HttpTransport::new("http://127.0.0.1:1");
    assert!(transport.requires_token());
    assert!(matches!(
        transport.lookup(PAGE, Some("t")).await.unwrap_err(),
        RelayError::TransportUnreachable(_)
    ));
}
