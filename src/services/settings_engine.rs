// passfill Settings Engine
// Loads, saves and updates the client configuration: which transport to use,
// fill behavior and popup sizing. Stored as JSON at the platform config path.

use std::fs;
use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::platform;
use crate::types::errors::SettingsError;
use crate::types::settings::RelaySettings;

/// Trait defining the settings engine interface.
pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<RelaySettings, SettingsError>;
    fn save(&self) -> Result<(), SettingsError>;
    fn get_settings(&self) -> &RelaySettings;
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError>;
    fn reset(&mut self) -> Result<(), SettingsError>;
    fn get_config_path(&self) -> &str;
}

/// Settings engine implementation that persists settings as JSON on disk.
pub struct SettingsEngine {
    config_path: String,
    settings: RelaySettings,
}

impl SettingsEngine {
    /// Creates a new SettingsEngine.
    ///
    /// If `path_override` is `Some`, uses that path for the config file.
    /// Otherwise, uses the platform-specific config directory with `settings.json`.
    pub fn new(path_override: Option<String>) -> Self {
        let config_path = match path_override {
            Some(p) => p,
            None => platform::get_config_dir()
                .join("settings.json")
                .to_string_lossy()
                .to_string(),
        };

        Self {
            config_path,
            settings: RelaySettings::default(),
        }
    }

    /// Bound on the wait for the credential service.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.settings.transport.request_timeout_ms)
    }
}

impl SettingsEngineTrait for SettingsEngine {
    /// Loads settings from the JSON config file.
    ///
    /// If the file does not exist, returns default settings.
    /// If the file exists but is malformed, returns a serialization error,
    /// and if it parses but breaks a settings constraint, an invalid-value error.
    fn load(&mut self) -> Result<RelaySettings, SettingsError> {
        let path = Path::new(&self.config_path);

        if !path.exists() {
            debug!(path = %self.config_path, "no config file, using defaults");
            self.settings = RelaySettings::default();
            return Ok(self.settings.clone());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| SettingsError::IoError(format!("Failed to read config file: {}", e)))?;

        let settings: RelaySettings = serde_json::from_str(&content).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to parse config file: {}", e))
        })?;

        settings.validate()?;
        self.settings = settings;
        Ok(self.settings.clone())
    }

    /// Saves the current settings to the JSON config file, creating parent
    /// directories as needed.
    fn save(&self) -> Result<(), SettingsError> {
        let path = Path::new(&self.config_path);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SettingsError::IoError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;

        fs::write(path, json)
            .map_err(|e| SettingsError::IoError(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    fn get_settings(&self) -> &RelaySettings {
        &self.settings
    }

    /// Updates an individual setting by dot-notation key path and saves.
    ///
    /// # Examples
    /// - `"transport.kind"` → `"native"`
    /// - `"transport.request_timeout_ms"` → `2000`
    /// - `"popup.max_height"` → `480`
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError> {
        if key.is_empty() {
            return Err(SettingsError::InvalidKey("Key cannot be empty".to_string()));
        }

        let mut tree = serde_json::to_value(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;
        let path: Vec<&str> = key.split('.').collect();
        replace_at(&mut tree, &path, value).map_err(|reason| {
            SettingsError::InvalidKey(format!("'{}': {}", key, reason))
        })?;

        let new_settings: RelaySettings = serde_json::from_value(tree).map_err(|e| {
            SettingsError::InvalidValue(format!("Invalid value for key '{}': {}", key, e))
        })?;
        new_settings.validate()?;

        self.settings = new_settings;
        self.save()?;
        Ok(())
    }

    /// Resets all settings to defaults and saves to disk.
    fn reset(&mut self) -> Result<(), SettingsError> {
        self.settings = RelaySettings::default();
        self.save()?;
        Ok(())
    }

    fn get_config_path(&self) -> &str {
        &self.config_path
    }
}

/// Replaces the existing leaf at `path`. Only keys already present in the
/// settings tree can be set.
fn replace_at(
    node: &mut serde_json::Value,
    path: &[&str],
    value: serde_json::Value,
) -> Result<(), &'static str> {
    let (head, tail) = path.split_first().ok_or("empty key")?;
    let map = node.as_object_mut().ok_or("parent is not a section")?;
    let child = map.get_mut(*head).ok_or("no such setting")?;
    if tail.is_empty() {
        *child = value;
        Ok(())
    } else {
        replace_at(child, tail, value)
    }
}
