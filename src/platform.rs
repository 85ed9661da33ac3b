// Platform paths
// Settings live in the per-user config directory; the tab/history database and
// tab thumbnails live in the per-user data directory.
//
// - Linux:   $XDG_CONFIG_HOME/browser-models, $XDG_DATA_HOME/browser-models
// - macOS:   ~/Library/Application Support/BrowserModels (both)
// - Windows: %APPDATA%/BrowserModels (both)

use std::env;
use std::path::PathBuf;

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const APP_DIR: &str = "browser-models";
#[cfg(any(target_os = "macos", target_os = "windows"))]
const APP_DIR: &str = "BrowserModels";

#[cfg(not(target_os = "windows"))]
fn home_dir() -> PathBuf {
    PathBuf::from(env::var("HOME").unwrap_or_else(|_| String::from("/tmp")))
}

/// Returns the platform-specific configuration directory.
pub fn get_config_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        home_dir().join("Library").join("Application Support").join(APP_DIR)
    }
    #[cfg(target_os = "windows")]
    {
        let appdata = env::var("APPDATA")
            .unwrap_or_else(|_| String::from("C:\\Users\\Default\\AppData\\Roaming"));
        PathBuf::from(appdata).join(APP_DIR)
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        match env::var("XDG_CONFIG_HOME") {
            Ok(xdg) => PathBuf::from(xdg).join(APP_DIR),
            Err(_) => home_dir().join(".config").join(APP_DIR),
        }
    }
}

/// Returns the platform-specific data directory.
pub fn get_data_dir() -> PathBuf {
    #[cfg(any(target_os = "macos", target_os = "windows"))]
    {
        get_config_dir()
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        match env::var("XDG_DATA_HOME") {
            Ok(xdg) => PathBuf::from(xdg).join(APP_DIR),
            Err(_) => home_dir().join(".local").join("share").join(APP_DIR),
        }
    }
}

/// Default location of the tab/history database.
pub fn get_database_path() -> PathBuf {
    get_data_dir().join("browser.db")
}

/// Directory tab thumbnails are written to.
pub fn get_thumbnail_dir() -> PathBuf {
    get_data_dir().join("thumbs")
}
