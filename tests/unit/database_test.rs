//! Unit tests for the database layer: schema migrations and the SQLite
//! persistence gateway.

use std::cell::RefCell;
use std::rc::Rc;

use browser_models::database::migrations::{get_schema_version, CURRENT_SCHEMA_VERSION};
use browser_models::database::{Database, DbEvent, DbManager, PersistenceGateway};
use browser_models::types::errors::PersistenceError;
use browser_models::types::tab::Tab;

fn record(db: &DbManager) -> Rc<RefCell<Vec<DbEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    db.subscribe(move |e| sink.borrow_mut().push(e.clone()));
    events
}

fn urls(links: Vec<browser_models::types::history::Link>) -> Vec<String> {
    links.into_iter().map(|l| l.url).collect()
}

// ─── Schema ───

#[test]
fn test_migrations_create_all_tables() {
    let db = Database::open_in_memory().expect("open_in_memory failed");
    let conn = db.connection();

    for table in &["link", "tab", "tab_history", "browser_history", "schema_version"] {
        let exists: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name=?1",
                [table],
                |row| row.get(0),
            )
            .unwrap_or(false);
        assert!(exists, "Table '{}' should exist after migrations", table);
    }
}

#[test]
fn test_schema_version_is_current() {
    let db = Database::open_in_memory().unwrap();
    assert_eq!(get_schema_version(db.connection()), CURRENT_SCHEMA_VERSION);
}

#[test]
fn test_reopening_file_database_keeps_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("browser.db");

    {
        let db = DbManager::open(&path).unwrap();
        db.create_tab(&Tab::new(3, "https://a.com", "A", "")).unwrap();
    }

    let db = DbManager::open(&path).unwrap();
    assert_eq!(get_schema_version(db.database().connection()), CURRENT_SCHEMA_VERSION);
    assert_eq!(db.max_tab_id().unwrap(), 3);
    assert_eq!(db.all_tabs().unwrap()[0].url(), "https://a.com");
}

// ─── Tabs ───

#[test]
fn test_create_and_list_tabs() {
    let db = DbManager::open_in_memory().unwrap();
    db.create_tab(&Tab::new(2, "https://b.com", "B", "")).unwrap();
    db.create_tab(&Tab::new(1, "https://a.com", "A", "")).unwrap();
    db.create_tab(&Tab::new(5, "", "", "")).unwrap();

    let tabs = db.all_tabs().unwrap();
    let ids: Vec<i32> = tabs.iter().map(|t| t.tab_id).collect();
    assert_eq!(ids, vec![1, 2, 5]);
    assert_eq!(tabs[0].title(), "A");
    assert_eq!(tabs[2].url(), "", "a tab without a page has an empty link");
    assert_eq!(db.max_tab_id().unwrap(), 5);
}

#[test]
fn test_max_tab_id_of_empty_store_is_zero() {
    let db = DbManager::open_in_memory().unwrap();
    assert_eq!(db.max_tab_id().unwrap(), 0);
}

#[test]
fn test_remove_tab_drops_its_history() {
    let db = DbManager::open_in_memory().unwrap();
    db.create_tab(&Tab::new(1, "https://a.com", "", "")).unwrap();
    db.navigate_to(1, "https://b.com", "", "").unwrap();

    db.remove_tab(1).unwrap();

    assert!(db.all_tabs().unwrap().is_empty());
    assert!(db.tab_history(1).unwrap().is_empty());
    // Browsing history survives tab removal.
    assert_eq!(urls(db.history().unwrap()), vec!["https://b.com"]);
}

#[test]
fn test_remove_all_tabs() {
    let db = DbManager::open_in_memory().unwrap();
    db.create_tab(&Tab::new(1, "https://a.com", "", "")).unwrap();
    db.create_tab(&Tab::new(2, "https://b.com", "", "")).unwrap();

    db.remove_all_tabs().unwrap();

    assert!(db.all_tabs().unwrap().is_empty());
    assert_eq!(db.max_tab_id().unwrap(), 0);
}

// ─── Navigation and history ───

#[test]
fn test_navigate_to_unknown_tab_fails() {
    let db = DbManager::open_in_memory().unwrap();
    match db.navigate_to(9, "https://a.com", "", "") {
        Err(PersistenceError::NotFound(9)) => {}
        other => panic!("expected NotFound(9), got {:?}", other),
    }
}

#[test]
fn test_tab_history_is_most_recent_first() {
    let db = DbManager::open_in_memory().unwrap();
    db.create_tab(&Tab::new(1, "https://a.com", "", "")).unwrap();
    db.navigate_to(1, "https://b.com", "", "").unwrap();
    db.navigate_to(1, "https://c.com", "", "").unwrap();

    assert_eq!(
        urls(db.tab_history(1).unwrap()),
        vec!["https://c.com", "https://b.com", "https://a.com"]
    );
    assert_eq!(db.all_tabs().unwrap()[0].url(), "https://c.com");
}

#[test]
fn test_browsing_history_has_one_row_per_url() {
    let db = DbManager::open_in_memory().unwrap();
    db.create_tab(&Tab::new(1, "", "", "")).unwrap();
    db.create_tab(&Tab::new(2, "", "", "")).unwrap();
    db.navigate_to(1, "https://a.com", "", "").unwrap();
    db.navigate_to(2, "https://b.com", "", "").unwrap();
    db.navigate_to(1, "https://a.com", "", "").unwrap();

    assert_eq!(urls(db.history().unwrap()), vec!["https://a.com", "https://b.com"]);
}

#[test]
fn test_clear_tab_history_keeps_current_page() {
    let db = DbManager::open_in_memory().unwrap();
    db.create_tab(&Tab::new(1, "https://a.com", "", "")).unwrap();
    db.navigate_to(1, "https://b.com", "", "").unwrap();

    db.clear_tab_history(1).unwrap();

    assert_eq!(urls(db.tab_history(1).unwrap()), vec!["https://b.com"]);
    assert_eq!(db.all_tabs().unwrap()[0].url(), "https://b.com");
}

#[test]
fn test_clear_history_keeps_tabs() {
    let db = DbManager::open_in_memory().unwrap();
    db.create_tab(&Tab::new(1, "https://a.com", "", "")).unwrap();
    db.navigate_to(1, "https://b.com", "", "").unwrap();

    db.clear_history().unwrap();

    assert!(db.history().unwrap().is_empty());
    assert_eq!(db.all_tabs().unwrap().len(), 1);
}

#[test]
fn test_navigation_title_is_kept() {
    let db = DbManager::open_in_memory().unwrap();
    db.create_tab(&Tab::new(1, "", "", "")).unwrap();
    db.navigate_to(1, "https://a.com", "Alpha", "").unwrap();
    db.navigate_to(1, "https://a.com", "", "").unwrap();

    assert_eq!(db.history().unwrap()[0].title, "Alpha");
}

// ─── Link updates ───

#[test]
fn test_update_thumb_path_of_current_link() {
    let db = DbManager::open_in_memory().unwrap();
    db.create_tab(&Tab::new(1, "https://a.com", "", "")).unwrap();
    let events = record(&db);

    db.update_thumb_path(1, "/thumbs/1.png").unwrap();

    assert_eq!(db.all_tabs().unwrap()[0].thumbnail_path(), "/thumbs/1.png");
    assert_eq!(
        *events.borrow(),
        vec![DbEvent::ThumbPathChanged {
            url: "https://a.com".into(),
            path: "/thumbs/1.png".into(),
        }]
    );
}

#[test]
fn test_update_thumb_path_without_page_fails() {
    let db = DbManager::open_in_memory().unwrap();
    db.create_tab(&Tab::new(1, "", "", "")).unwrap();
    assert!(matches!(db.update_thumb_path(1, "/x.png"), Err(PersistenceError::NotFound(1))));
}

#[test]
fn test_update_title_only_notifies_for_known_links() {
    let db = DbManager::open_in_memory().unwrap();
    db.create_tab(&Tab::new(1, "https://a.com", "", "")).unwrap();
    let events = record(&db);

    db.update_title(1, "https://a.com", "Alpha").unwrap();
    db.update_title(1, "https://unknown.com", "Nope").unwrap();

    assert_eq!(
        *events.borrow(),
        vec![DbEvent::TitleChanged {
            url: "https://a.com".into(),
            title: "Alpha".into(),
        }]
    );
    assert_eq!(db.all_tabs().unwrap()[0].title(), "Alpha");
}

// ─── Events ───

#[test]
fn test_tab_writes_emit_tab_changed() {
    let db = DbManager::open_in_memory().unwrap();
    let events = record(&db);

    db.create_tab(&Tab::new(1, "https://a.com", "", "")).unwrap();
    db.navigate_to(1, "https://b.com", "", "").unwrap();
    db.clear_tab_history(1).unwrap();

    assert_eq!(
        *events.borrow(),
        vec![DbEvent::TabChanged(1), DbEvent::TabChanged(1), DbEvent::TabChanged(1)]
    );
}

#[test]
fn test_unsubscribe_stops_events() {
    let db = DbManager::open_in_memory().unwrap();
    let count = Rc::new(RefCell::new(0));
    let sink = count.clone();
    let id = db.subscribe(move |_| *sink.borrow_mut() += 1);

    assert!(db.unsubscribe(id));
    db.create_tab(&Tab::new(1, "https://a.com", "", "")).unwrap();

    assert_eq!(*count.borrow(), 0);
}
