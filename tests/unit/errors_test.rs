use passfill::types::errors::*;

// === RelayError Tests ===

#[test]
fn relay_error_auth_token_missing_display() {
    assert_eq!(
        RelayError::AuthTokenMissing.to_string(),
        "Authentication token not set. Please configure in extension settings."
    );
}

#[test]
fn relay_error_timeout_display() {
    assert_eq!(RelayError::Timeout.to_string(), "timeout");
}

#[test]
fn relay_error_display_variants() {
    assert_eq!(
        RelayError::TransportUnreachable("connection refused".to_string()).to_string(),
        "Failed to connect to password manager: connection refused"
    );
    assert_eq!(
        RelayError::ServiceError("Vault is locked".to_string()).to_string(),
        "Vault is locked"
    );
    assert_eq!(
        RelayError::NotFound("example.com".to_string()).to_string(),
        "No credentials found for example.com"
    );
    assert_eq!(
        RelayError::InvalidUrl("about:blank".to_string()).to_string(),
        "Invalid page URL: about:blank"
    );
}

#[test]
fn relay_error_implements_error_trait() {
    let err: Box<dyn std::error::Error> = Box::new(RelayError::Timeout);
    assert!(err.source().is_none());
}

#[test]
fn storage_error_converts_to_relay_error() {
    let err: RelayError = StorageError::DatabaseError("disk full".to_string()).into();
    assert_eq!(
        err,
        RelayError::Storage("Storage database error: disk full".to_string())
    );
}

// === TabError Tests ===

#[test]
fn tab_error_not_found_display() {
    let err = TabError::NotFound("tab-123".to_string());
    assert_eq!(err.to_string(), "Tab not found: tab-123");
}

#[test]
fn tab_error_maps_to_fill_target_missing() {
    let err: RelayError = TabError::NoReceiver("tab-1".to_string()).into();
    match err {
        RelayError::FillTargetMissing(msg) => assert!(msg.contains("tab-1")),
        other => panic!("expected FillTargetMissing, got {:?}", other),
    }
}

// === SettingsError Tests ===

#[test]
fn settings_error_display_variants() {
    assert_eq!(
        SettingsError::InvalidKey("foo.bar".to_string()).to_string(),
        "Invalid settings key: foo.bar"
    );
    assert_eq!(
        SettingsError::IoError("permission denied".to_string()).to_string(),
        "Settings I/O error: permission denied"
    );
}

// === ClipboardError Tests ===

#[test]
fn clipboard_error_display_variants() {
    assert_eq!(
        ClipboardError::InvalidFormat.to_string(),
        "No valid credentials in clipboard."
    );
    assert_eq!(ClipboardError::MissingField.to_string(), "Invalid clipboard format");
    assert_eq!(
        ClipboardError::Fill("tab closed".to_string()).to_string(),
        "Failed to fill: tab closed"
    );
}

// === PopupError Tests ===

#[test]
fn popup_error_display_variants() {
    let err = PopupError::InvalidState {
        action: "save settings",
        state: "idle",
    };
    assert_eq!(err.to_string(), "Cannot save settings while popup is idle");
    assert_eq!(PopupError::NoSuchEntry(3).to_string(), "No entry at position 3");
}
