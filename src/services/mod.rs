// passfill services
// Page-side fill logic, the background relay and its collaborators, and the popup.

pub mod clipboard_fill;
pub mod content_script;
pub mod extension_storage;
pub mod field_locator;
pub mod form_filler;
pub mod message_relay;
pub mod origin;
pub mod popup_controller;
pub mod settings_engine;
pub mod token_cache;
pub mod transport;
