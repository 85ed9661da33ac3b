// Setting Manager
// Loads and saves browser settings, honours deferred "clear private data" requests on startup,
// and keeps the browser engine's search engine and do-not-track preferences in sync.
// Settings are stored as a JSON file at the platform-specific config path.

use std::fs;
use std::path::Path;

use serde_json::json;

use crate::database::gateway::PersistenceGateway;
use crate::models::notifier::{Notifier, SubscriptionId};
use crate::platform;
use crate::types::errors::SettingsError;
use crate::types::settings::BrowserSettings;

/// Topic the engine listens on for private data removal.
pub const CLEAR_PRIVATE_DATA_TOPIC: &str = "clear-private-data";
/// Topic for search engine queries and their replies.
pub const SEARCH_TOPIC: &str = "embed:search";
pub const PREFS_TOPIC: &str = "embed:setprefs";

/// Message channel into the browser engine.
pub trait EngineChannel {
    fn send(&self, topic: &str, payload: serde_json::Value);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsEvent {
    ToolbarSmallChanged,
    ToolbarLargeChanged,
}

/// Trait defining the setting manager interface.
pub trait SettingManagerTrait {
    fn load(&mut self) -> Result<BrowserSettings, SettingsError>;
    fn save(&self) -> Result<(), SettingsError>;
    fn get_settings(&self) -> &BrowserSettings;
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError>;
    fn get_config_path(&self) -> &str;
}

pub struct SettingManager {
    config_path: String,
    settings: BrowserSettings,
    initialized: bool,
    search_engines_initialized: bool,
    installed_search_engines: Vec<String>,
    notifier: Notifier<SettingsEvent>,
}

impl SettingManager {
    /// Creates a new SettingManager.
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
            settings: BrowserSettings::default(),
            initialized: false,
            search_engines_initialized: false,
            installed_search_engines: Vec::new(),
            notifier: Notifier::new(),
        }
    }

    pub fn subscribe<F>(&mut self, observer: F) -> SubscriptionId
    where
        F: FnMut(&SettingsEvent) + 'static,
    {
        self.notifier.subscribe(observer)
    }

    pub fn clear_history_requested(&self) -> bool {
        self.settings.clear_history_requested
    }

    pub fn toolbar_small(&self) -> i32 {
        self.settings.toolbar_small
    }

    pub fn toolbar_large(&self) -> i32 {
        self.settings.toolbar_large
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn installed_search_engines(&self) -> &[String] {
        &self.installed_search_engines
    }

    /// Performs pending clear requests and pushes preferences to the engine.
    ///
    /// Runs once; later calls return `Ok(false)` without doing anything.
    /// Returns whether browsing history was cleared.
    pub fn initialize(
        &mut self,
        gateway: &dyn PersistenceGateway,
        engine: &dyn EngineChannel,
    ) -> Result<bool, SettingsError> {
        if self.initialized {
            return Ok(false);
        }

        let mut changed = false;
        let mut history_cleared = false;

        if self.settings.clear_history_requested {
            // A failed clear stays requested and is retried on the next start.
            match gateway.clear_history().and_then(|_| gateway.remove_all_tabs()) {
                Ok(()) => {
                    self.settings.clear_history_requested = false;
                    history_cleared = true;
                    changed = true;
                }
                Err(e) => log::warn!("failed to clear history: {}", e),
            }
        }

        let requests = [
            (self.settings.clear_cookies_requested, "cookies"),
            (self.settings.clear_passwords_requested, "passwords"),
            (self.settings.clear_cache_requested, "cache"),
        ];
        for (requested, data) in requests {
            if requested {
                log::debug!("clearing {}", data);
                engine.send(CLEAR_PRIVATE_DATA_TOPIC, json!(data));
                changed = true;
            }
        }
        self.settings.clear_cookies_requested = false;
        self.settings.clear_passwords_requested = false;
        self.settings.clear_cache_requested = false;

        engine.send(SEARCH_TOPIC, json!({ "msg": "getlist" }));
        self.do_not_track(engine);

        if changed {
            self.save()?;
        }
        self.initialized = true;
        Ok(history_cleared)
    }

    /// Handles a message from the engine. The search engine list reply
    /// records the installed engines and applies the configured default.
    pub fn handle_observe(&mut self, topic: &str, data: &serde_json::Value, engine: &dyn EngineChannel) {
        if topic != SEARCH_TOPIC {
            return;
        }
        if data.get("msg").and_then(|v| v.as_str()) != Some("init") {
            return;
        }

        self.installed_search_engines = data
            .get("engines")
            .and_then(|v| v.as_array())
            .map(|engines| {
                engines
                    .iter()
                    .filter_map(|e| e.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        self.search_engines_initialized = true;
        self.set_search_engine(engine);
    }

    fn set_search_engine(&self, engine: &dyn EngineChannel) {
        if !self.search_engines_initialized {
            return;
        }
        let name = &self.settings.search_engine;
        if self.installed_search_engines.iter().any(|e| e == name) {
            engine.send(SEARCH_TOPIC, json!({ "msg": "setdefault", "name": name }));
        } else {
            log::warn!("search engine {} is not installed", name);
        }
    }

    fn do_not_track(&self, engine: &dyn EngineChannel) {
        engine.send(
            PREFS_TOPIC,
            json!([{ "name": "privacy.donottrack.header.enabled", "value": self.settings.do_not_track }]),
        );
    }
}

impl SettingManagerTrait for SettingManager {
    /// Loads settings from the JSON config file.
    ///
    /// If the file does not exist, returns default settings.
    /// If the file exists but is malformed, returns a serialization error.
    fn load(&mut self) -> Result<BrowserSettings, SettingsError> {
        let path = Path::new(&self.config_path);

        if !path.exists() {
            self.settings = BrowserSettings::default();
            return Ok(self.settings.clone());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| SettingsError::IoError(format!("Failed to read config file: {}", e)))?;

        self.settings = serde_json::from_str(&content).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to parse config file: {}", e))
        })?;
        Ok(self.settings.clone())
    }

    /// Saves the current settings, creating parent directories as needed.
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
            .map_err(|e| SettingsError::IoError(format!("Failed to write config file: {}", e)))
    }

    fn get_settings(&self) -> &BrowserSettings {
        &self.settings
    }

    /// Updates a single setting by key, validates it by deserializing the
    /// result, and saves to disk.
    ///
    /// # Examples
    /// - `"do_not_track"` → updates `settings.do_not_track`
    /// - `"toolbar_small"` → updates `settings.toolbar_small` and notifies
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError> {
        if key.is_empty() {
            return Err(SettingsError::InvalidKey("Key cannot be empty".to_string()));
        }

        let mut json_value = serde_json::to_value(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;

        match json_value.as_object_mut() {
            Some(map) if map.contains_key(key) => {
                map.insert(key.to_string(), value);
            }
            _ => {
                return Err(SettingsError::InvalidKey(format!(
                    "Key '{}' not found in settings",
                    key
                )))
            }
        }

        let new_settings: BrowserSettings = serde_json::from_value(json_value).map_err(|e| {
            SettingsError::InvalidValue(format!("Invalid value for key '{}': {}", key, e))
        })?;

        let small_changed = new_settings.toolbar_small != self.settings.toolbar_small;
        let large_changed = new_settings.toolbar_large != self.settings.toolbar_large;
        self.settings = new_settings;
        self.save()?;

        if small_changed {
            self.notifier.emit(&SettingsEvent::ToolbarSmallChanged);
        }
        if large_changed {
            self.notifier.emit(&SettingsEvent::ToolbarLargeChanged);
        }
        Ok(())
    }

    fn get_config_path(&self) -> &str {
        &self.config_path
    }
}
