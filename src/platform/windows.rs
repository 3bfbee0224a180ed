// passfill platform paths for Windows

use std::env;
use std::path::PathBuf;

fn app_dir() -> PathBuf {
    let appdata = env::var("APPDATA")
        .unwrap_or_else(|_| String::from("C:\\Users\\Default\\AppData\\Roaming"));
    PathBuf::from(appdata).join("passfill")
}

pub fn get_config_dir() -> PathBuf {
    app_dir().join("config")
}

pub fn get_data_dir() -> PathBuf {
    app_dir().join("data")
}
