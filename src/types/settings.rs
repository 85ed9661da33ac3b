use serde::{Deserialize, Serialize};

/// Browser settings persisted by the setting manager.
///
/// The `clear_*_requested` flags are set from the settings UI and honoured
/// once on the next startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrowserSettings {
    #[serde(default)]
    pub clear_history_requested: bool,
    #[serde(default)]
    pub clear_cookies_requested: bool,
    #[serde(default)]
    pub clear_passwords_requested: bool,
    #[serde(default)]
    pub clear_cache_requested: bool,
    pub search_engine: String,
    #[serde(default)]
    pub do_not_track: bool,
    /// Height of the collapsed toolbar in pixels.
    pub toolbar_small: i32,
    /// Height of the expanded toolbar in pixels.
    pub toolbar_large: i32,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            clear_history_requested: false,
            clear_cookies_requested: false,
            clear_passwords_requested: false,
            clear_cache_requested: false,
            search_engine: "Google".to_string(),
            do_not_track: false,
            toolbar_small: 72,
            toolbar_large: 108,
        }
    }
}
