//! Unit tests for SettingManager: JSON persistence, keyed updates, and the
//! one-time startup work driven by the clear-data flags.

use std::cell::RefCell;
use std::rc::Rc;

use browser_models::database::{DbManager, PersistenceGateway};
use browser_models::services::setting_manager::{
    EngineChannel, SettingManager, SettingManagerTrait, SettingsEvent, CLEAR_PRIVATE_DATA_TOPIC,
    PREFS_TOPIC, SEARCH_TOPIC,
};
use browser_models::types::errors::{PersistenceError, SettingsError};
use browser_models::types::history::Link;
use browser_models::types::settings::BrowserSettings;
use browser_models::types::tab::Tab;
use serde_json::json;
use tempfile::TempDir;

#[derive(Default)]
struct RecordingEngine {
    sent: RefCell<Vec<(String, serde_json::Value)>>,
}

impl EngineChannel for RecordingEngine {
    fn send(&self, topic: &str, payload: serde_json::Value) {
        self.sent.borrow_mut().push((topic.to_string(), payload));
    }
}

impl RecordingEngine {
    fn topics(&self) -> Vec<String> {
        self.sent.borrow().iter().map(|(t, _)| t.clone()).collect()
    }

    fn payloads_for(&self, topic: &str) -> Vec<serde_json::Value> {
        self.sent
            .borrow()
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, p)| p.clone())
            .collect()
    }
}

/// Gateway whose every operation fails.
struct BrokenGateway;

impl PersistenceGateway for BrokenGateway {
    fn create_tab(&self, _tab: &Tab) -> Result<(), PersistenceError> {
        Err(PersistenceError::DatabaseError("broken".into()))
    }
    fn navigate_to(&self, _: i32, _: &str, _: &str, _: &str) -> Result<(), PersistenceError> {
        Err(PersistenceError::DatabaseError("broken".into()))
    }
    fn remove_tab(&self, _: i32) -> Result<(), PersistenceError> {
        Err(PersistenceError::DatabaseError("broken".into()))
    }
    fn remove_all_tabs(&self) -> Result<(), PersistenceError> {
        Err(PersistenceError::DatabaseError("broken".into()))
    }
    fn clear_tab_history(&self, _: i32) -> Result<(), PersistenceError> {
        Err(PersistenceError::DatabaseError("broken".into()))
    }
    fn clear_history(&self) -> Result<(), PersistenceError> {
        Err(PersistenceError::DatabaseError("broken".into()))
    }
    fn update_thumb_path(&self, _: i32, _: &str) -> Result<(), PersistenceError> {
        Err(PersistenceError::DatabaseError("broken".into()))
    }
    fn update_title(&self, _: i32, _: &str, _: &str) -> Result<(), PersistenceError> {
        Err(PersistenceError::DatabaseError("broken".into()))
    }
    fn tab_history(&self, _: i32) -> Result<Vec<Link>, PersistenceError> {
        Err(PersistenceError::DatabaseError("broken".into()))
    }
    fn history(&self) -> Result<Vec<Link>, PersistenceError> {
        Err(PersistenceError::DatabaseError("broken".into()))
    }
    fn all_tabs(&self) -> Result<Vec<Tab>, PersistenceError> {
        Err(PersistenceError::DatabaseError("broken".into()))
    }
    fn max_tab_id(&self) -> Result<i32, PersistenceError> {
        Err(PersistenceError::DatabaseError("broken".into()))
    }
}

/// Helper: a SettingManager storing its file in a temp directory.
fn manager_in(dir: &TempDir) -> SettingManager {
    let path = dir.path().join("settings.json").to_string_lossy().to_string();
    SettingManager::new(Some(path))
}

// ─── load / save ───

#[test]
fn test_load_missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = manager_in(&dir);

    let settings = manager.load().unwrap();

    assert_eq!(settings, BrowserSettings::default());
    assert_eq!(manager.toolbar_small(), 72);
    assert_eq!(manager.toolbar_large(), 108);
    assert!(!manager.clear_history_requested());
}

#[test]
fn test_save_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = manager_in(&dir);
    manager.set_value("search_engine", json!("Bing")).unwrap();
    manager.set_value("do_not_track", json!(true)).unwrap();

    let mut reloaded = manager_in(&dir);
    let settings = reloaded.load().unwrap();

    assert_eq!(settings.search_engine, "Bing");
    assert!(settings.do_not_track);
}

#[test]
fn test_save_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("deeper").join("settings.json");
    let manager = SettingManager::new(Some(path.to_string_lossy().to_string()));

    manager.save().unwrap();

    assert!(path.exists());
}

#[test]
fn test_load_malformed_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("settings.json"), "{ not json").unwrap();
    let mut manager = manager_in(&dir);

    assert!(matches!(manager.load(), Err(SettingsError::SerializationError(_))));
}

#[test]
fn test_load_file_without_request_flags() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("settings.json"),
        r#"{ "search_engine": "Yahoo", "toolbar_small": 60, "toolbar_large": 90 }"#,
    )
    .unwrap();
    let mut manager = manager_in(&dir);

    let settings = manager.load().unwrap();

    assert_eq!(settings.search_engine, "Yahoo");
    assert!(!settings.clear_history_requested);
    assert!(!settings.do_not_track);
}

// ─── set_value ───

#[test]
fn test_set_value_rejects_bad_keys_and_values() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = manager_in(&dir);

    assert!(matches!(manager.set_value("", json!(1)), Err(SettingsError::InvalidKey(_))));
    assert!(matches!(manager.set_value("no_such_key", json!(1)), Err(SettingsError::InvalidKey(_))));
    assert!(matches!(
        manager.set_value("toolbar_small", json!("tall")),
        Err(SettingsError::InvalidValue(_))
    ));
    assert_eq!(manager.get_settings(), &BrowserSettings::default());
}

#[test]
fn test_toolbar_changes_are_notified() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = manager_in(&dir);
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    manager.subscribe(move |e| sink.borrow_mut().push(*e));

    manager.set_value("toolbar_small", json!(64)).unwrap();
    manager.set_value("toolbar_small", json!(64)).unwrap();
    manager.set_value("toolbar_large", json!(120)).unwrap();
    manager.set_value("do_not_track", json!(true)).unwrap();

    assert_eq!(
        *events.borrow(),
        vec![SettingsEvent::ToolbarSmallChanged, SettingsEvent::ToolbarLargeChanged]
    );
    assert_eq!(manager.toolbar_small(), 64);
    assert_eq!(manager.toolbar_large(), 120);
}

// ─── initialize ───

#[test]
fn test_initialize_without_requests_pushes_preferences() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = manager_in(&dir);
    let db = DbManager::open_in_memory().unwrap();
    let engine = RecordingEngine::default();

    assert!(!manager.initialize(&db, &engine).unwrap());

    assert!(manager.is_initialized());
    assert_eq!(engine.topics(), vec![SEARCH_TOPIC, PREFS_TOPIC]);
    assert_eq!(engine.payloads_for(SEARCH_TOPIC), vec![json!({ "msg": "getlist" })]);
    assert_eq!(
        engine.payloads_for(PREFS_TOPIC),
        vec![json!([{ "name": "privacy.donottrack.header.enabled", "value": false }])]
    );
    assert!(!dir.path().join("settings.json").exists(), "nothing changed, nothing saved");
}

#[test]
fn test_initialize_clears_requested_history() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = manager_in(&dir);
    manager.set_value("clear_history_requested", json!(true)).unwrap();

    let db = DbManager::open_in_memory().unwrap();
    db.create_tab(&Tab::new(1, "", "", "")).unwrap();
    db.navigate_to(1, "https://a.com", "", "").unwrap();
    let engine = RecordingEngine::default();

    assert!(manager.initialize(&db, &engine).unwrap());

    assert!(db.history().unwrap().is_empty());
    assert!(db.all_tabs().unwrap().is_empty());
    assert!(!manager.clear_history_requested());

    let mut reloaded = manager_in(&dir);
    assert!(!reloaded.load().unwrap().clear_history_requested);
}

#[test]
fn test_initialize_forwards_private_data_requests() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = manager_in(&dir);
    manager.set_value("clear_cookies_requested", json!(true)).unwrap();
    manager.set_value("clear_cache_requested", json!(true)).unwrap();
    let db = DbManager::open_in_memory().unwrap();
    let engine = RecordingEngine::default();

    assert!(!manager.initialize(&db, &engine).unwrap());

    assert_eq!(
        engine.payloads_for(CLEAR_PRIVATE_DATA_TOPIC),
        vec![json!("cookies"), json!("cache")]
    );
    let settings = manager.get_settings();
    assert!(!settings.clear_cookies_requested);
    assert!(!settings.clear_passwords_requested);
    assert!(!settings.clear_cache_requested);

    let mut reloaded = manager_in(&dir);
    assert!(!reloaded.load().unwrap().clear_cookies_requested);
}

#[test]
fn test_failed_history_clear_stays_requested() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = manager_in(&dir);
    manager.set_value("clear_history_requested", json!(true)).unwrap();
    let engine = RecordingEngine::default();

    assert!(!manager.initialize(&BrokenGateway, &engine).unwrap());

    assert!(manager.clear_history_requested());
    assert!(manager.is_initialized());
}

#[test]
fn test_initialize_runs_once() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = manager_in(&dir);
    let db = DbManager::open_in_memory().unwrap();
    let engine = RecordingEngine::default();

    manager.initialize(&db, &engine).unwrap();
    let sent = engine.sent.borrow().len();
    manager.set_value("clear_history_requested", json!(true)).unwrap();

    assert!(!manager.initialize(&db, &engine).unwrap());
    assert_eq!(engine.sent.borrow().len(), sent);
    assert!(manager.clear_history_requested());
}

#[test]
fn test_do_not_track_preference_follows_setting() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = manager_in(&dir);
    manager.set_value("do_not_track", json!(true)).unwrap();
    let db = DbManager::open_in_memory().unwrap();
    let engine = RecordingEngine::default();

    manager.initialize(&db, &engine).unwrap();

    assert_eq!(
        engine.payloads_for(PREFS_TOPIC),
        vec![json!([{ "name": "privacy.donottrack.header.enabled", "value": true }])]
    );
}

// ─── search engines ───

#[test]
fn test_engine_list_reply_sets_default_engine() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = manager_in(&dir);
    manager.set_value("search_engine", json!("DuckDuckGo")).unwrap();
    let engine = RecordingEngine::default();

    manager.handle_observe(
        SEARCH_TOPIC,
        &json!({ "msg": "init", "engines": ["Google", "DuckDuckGo"] }),
        &engine,
    );

    assert_eq!(manager.installed_search_engines(), ["Google", "DuckDuckGo"]);
    assert_eq!(
        engine.payloads_for(SEARCH_TOPIC),
        vec![json!({ "msg": "setdefault", "name": "DuckDuckGo" })]
    );
}

#[test]
fn test_other_search_messages_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = manager_in(&dir);
    let engine = RecordingEngine::default();

    manager.handle_observe(SEARCH_TOPIC, &json!({ "msg": "search", "engines": ["Google"] }), &engine);

    assert!(manager.installed_search_engines().is_empty());
    assert!(engine.sent.borrow().is_empty());
}
