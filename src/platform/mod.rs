// passfill platform paths
// Where the config file and the extension storage database live on each OS.

use std::env;
use std::path::PathBuf;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "windows")]
mod windows;

/// Overrides the directory holding the storage database.
pub const DATA_DIR_ENV: &str = "PASSFILL_DATA_DIR";

/// File name of the extension storage database.
pub const STORAGE_DB_FILE: &str = "storage.db";

/// Returns the platform-specific configuration directory.
///
/// - **Linux**: `$XDG_CONFIG_HOME/passfill` or `~/.config/passfill`
/// - **macOS**: `~/Library/Preferences/passfill`
/// - **Windows**: `%APPDATA%/passfill/config`
pub fn get_config_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_config_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_config_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_config_dir()
    }
}

/// Returns the data directory, honoring `PASSFILL_DATA_DIR`.
pub fn get_data_dir() -> PathBuf {
    if let Ok(dir) = env::var(DATA_DIR_ENV) {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    #[cfg(target_os = "linux")]
    {
        linux::get_data_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_data_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_data_dir()
    }
}

/// Path of the extension storage database.
pub fn storage_db_path() -> PathBuf {
    get_data_dir().join(STORAGE_DB_FILE)
}
