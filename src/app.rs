//! App Core for passfill.
//!
//! Wires storage, tabs, the configured transport and the relay together.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::info;

use crate::database::connection::Database;
use crate::managers::tab_manager::TabManager;
use crate::services::clipboard_fill::MemoryClipboard;
use crate::services::extension_storage::ExtensionStorage;
use crate::services::message_relay::MessageRelay;
use crate::services::popup_controller::PopupController;
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::services::transport::{CredentialTransport, HttpTransport, NativeTransport};
use crate::types::settings::{RelaySettings, TransportKind, TransportSettings};

/// Central application struct holding the background-side services.
pub struct App {
    pub settings: RelaySettings,
    pub storage: Arc<ExtensionStorage>,
    pub tabs: Arc<Mutex<TabManager>>,
    pub relay: Arc<MessageRelay<ExtensionStorage>>,
    pub clipboard: Mutex<MemoryClipboard>,
}

impl App {
    /// Opens the storage database at `db_path` and sets up the transport
    /// named in the loaded settings. A native host is only started by the
    /// first fill, so a missing host binary surfaces there.
    pub fn new(
        db_path: &str,
        settings_engine: &mut SettingsEngine,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let settings = settings_engine.load()?;
        let db = Database::open(db_path)?;
        let transport = build_transport(&settings.transport);
        info!(db = %db_path, transport = ?settings.transport.kind, "passfill initialized");
        Ok(Self::with_transport(db, settings, transport))
    }

    /// Builds the app around an already-open database and transport.
    pub fn with_transport(
        db: Database,
        settings: RelaySettings,
        transport: Box<dyn CredentialTransport>,
    ) -> Self {
        let storage = Arc::new(ExtensionStorage::new(db));
        let tabs = Arc::new(Mutex::new(TabManager::new(settings.fill.locator_strategy)));
        let relay = MessageRelay::new(storage.clone(), transport, tabs.clone())
            .with_timeout(Duration::from_millis(settings.transport.request_timeout_ms));

        Self {
            settings,
            storage,
            tabs,
            relay: Arc::new(relay),
            clipboard: Mutex::new(MemoryClipboard::default()),
        }
    }

    /// A fresh popup bound to this app's relay.
    pub fn popup(&self) -> PopupController<ExtensionStorage> {
        PopupController::new(self.relay.clone(), self.settings.popup.clone())
    }
}

/// Creates the transport selected in `settings`.
pub fn build_transport(settings: &TransportSettings) -> Box<dyn CredentialTransport> {
    match settings.kind {
        TransportKind::Http => Box::new(HttpTransport::new(&settings.server_url)),
        TransportKind::Native => Box::new(NativeTransport::new(&settings.native_host)),
    }
}
