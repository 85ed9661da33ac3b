//! SQLite implementation of [`PersistenceGateway`].
//!
//! Links are deduplicated by url and shared between a tab's own history and
//! the global browsing history. Each tab row points at its current entry in
//! `tab_history`.

use std::cell::RefCell;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{params, OptionalExtension};

use super::connection::Database;
use super::gateway::{DbEvent, PersistenceGateway};
use crate::models::notifier::{Notifier, SubscriptionId};
use crate::types::errors::PersistenceError;
use crate::types::history::Link;
use crate::types::tab::Tab;

/// Tab/history store backed by a SQLite database.
pub struct DbManager {
    db: Database,
    events: RefCell<Notifier<DbEvent>>,
}

impl DbManager {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            events: RefCell::new(Notifier::new()),
        }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        Ok(Self::new(Database::open(path)?))
    }

    pub fn open_in_memory() -> Result<Self, PersistenceError> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
    where
        F: FnMut(&DbEvent) + 'static,
    {
        self.events.borrow_mut().subscribe(observer)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        match self.events.try_borrow_mut() {
            Ok(mut events) => events.unsubscribe(id),
            Err(_) => {
                log::warn!("cannot unsubscribe {:?} while events are being delivered", id);
                false
            }
        }
    }

    /// Number of observers currently subscribed to database events.
    pub fn observer_count(&self) -> usize {
        self.events.borrow().observer_count()
    }

    fn emit(&self, event: DbEvent) {
        match self.events.try_borrow_mut() {
            Ok(mut events) => events.emit(&event),
            // An observer wrote back into the store while being notified.
            Err(_) => log::warn!("dropping nested database event {:?}", event),
        }
    }

    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }

    fn tab_exists(&self, tab_id: i32) -> Result<bool, PersistenceError> {
        let found: Option<i32> = self
            .db
            .connection()
            .query_row("SELECT tab_id FROM tab WHERE tab_id = ?1", params![tab_id], |row| row.get(0))
            .optional()?;
        Ok(found.is_some())
    }

    /// Returns the id of the link for `url`, creating it if needed. A
    /// non-empty title or favicon replaces the stored one.
    fn upsert_link(&self, url: &str, title: &str, favicon: &str) -> Result<i64, PersistenceError> {
        let conn = self.db.connection();
        let existing: Option<i64> = conn
            .query_row("SELECT link_id FROM link WHERE url = ?1", params![url], |row| row.get(0))
            .optional()?;

        match existing {
            Some(link_id) => {
                if !title.is_empty() {
                    conn.execute("UPDATE link SET title = ?1 WHERE link_id = ?2", params![title, link_id])?;
                }
                if !favicon.is_empty() {
                    conn.execute("UPDATE link SET favicon = ?1 WHERE link_id = ?2", params![favicon, link_id])?;
                }
                Ok(link_id)
            }
            None => {
                conn.execute(
                    "INSERT INTO link (url, title, favicon) VALUES (?1, ?2, ?3)",
                    params![url, title, favicon],
                )?;
                Ok(conn.last_insert_rowid())
            }
        }
    }

    /// Appends a tab history entry for `link_id` and makes it the tab's current one.
    fn push_tab_history(&self, tab_id: i32, link_id: i64, date: i64) -> Result<(), PersistenceError> {
        let conn = self.db.connection();
        conn.execute(
            "INSERT INTO tab_history (tab_id, link_id, date) VALUES (?1, ?2, ?3)",
            params![tab_id, link_id, date],
        )?;
        let entry_id = conn.last_insert_rowid();
        conn.execute(
            "UPDATE tab SET tab_history_id = ?1 WHERE tab_id = ?2",
            params![entry_id, tab_id],
        )?;
        Ok(())
    }

    fn current_link(&self, tab_id: i32) -> Result<Option<Link>, PersistenceError> {
        let link = self
            .db
            .connection()
            .query_row(
                "SELECT l.link_id, l.url, l.title, l.thumb_path \
                 FROM tab t JOIN tab_history th ON th.id = t.tab_history_id \
                 JOIN link l ON l.link_id = th.link_id WHERE t.tab_id = ?1",
                params![tab_id],
                Self::row_to_link,
            )
            .optional()?;
        Ok(link)
    }

    fn row_to_link(row: &rusqlite::Row) -> rusqlite::Result<Link> {
        Ok(Link {
            link_id: row.get(0)?,
            url: row.get(1)?,
            title: row.get(2)?,
            thumb_path: row.get(3)?,
        })
    }

    fn query_links(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Link>, PersistenceError> {
        let mut stmt = self.db.connection().prepare(sql)?;
        let rows = stmt.query_map(params, Self::row_to_link)?;
        let mut links = Vec::new();
        for row in rows {
            links.push(row?);
        }
        Ok(links)
    }
}

impl PersistenceGateway for DbManager {
    /// Stores a tab row; a tab created with a url also gets its first history entry.
    fn create_tab(&self, tab: &Tab) -> Result<(), PersistenceError> {
        self.db.connection().execute(
            "INSERT OR REPLACE INTO tab (tab_id, tab_history_id) VALUES (?1, NULL)",
            params![tab.tab_id],
        )?;
        if !tab.url().is_empty() {
            let link_id = self.upsert_link(tab.url(), tab.title(), "")?;
            self.push_tab_history(tab.tab_id, link_id, Self::now())?;
        }
        log::debug!("stored new tab {}", tab.tab_id);
        self.emit(DbEvent::TabChanged(tab.tab_id));
        Ok(())
    }

    fn navigate_to(&self, tab_id: i32, url: &str, title: &str, favicon: &str) -> Result<(), PersistenceError> {
        if !self.tab_exists(tab_id)? {
            return Err(PersistenceError::NotFound(tab_id));
        }
        let now = Self::now();
        let link_id = self.upsert_link(url, title, favicon)?;
        self.push_tab_history(tab_id, link_id, now)?;
        self.db.connection().execute(
            "INSERT INTO browser_history (link_id, date) VALUES (?1, ?2)",
            params![link_id, now],
        )?;
        self.emit(DbEvent::TabChanged(tab_id));
        Ok(())
    }

    fn remove_tab(&self, tab_id: i32) -> Result<(), PersistenceError> {
        let conn = self.db.connection();
        conn.execute("DELETE FROM tab_history WHERE tab_id = ?1", params![tab_id])?;
        conn.execute("DELETE FROM tab WHERE tab_id = ?1", params![tab_id])?;
        Ok(())
    }

    fn remove_all_tabs(&self) -> Result<(), PersistenceError> {
        self.db
            .connection()
            .execute_batch("DELETE FROM tab_history; DELETE FROM tab;")?;
        Ok(())
    }

    /// Drops every entry of the tab's history except the page it shows now.
    fn clear_tab_history(&self, tab_id: i32) -> Result<(), PersistenceError> {
        self.db.connection().execute(
            "DELETE FROM tab_history WHERE tab_id = ?1 AND id IS NOT \
             (SELECT tab_history_id FROM tab WHERE tab_id = ?1)",
            params![tab_id],
        )?;
        self.emit(DbEvent::TabChanged(tab_id));
        Ok(())
    }

    fn clear_history(&self) -> Result<(), PersistenceError> {
        self.db.connection().execute("DELETE FROM browser_history", [])?;
        Ok(())
    }

    fn update_thumb_path(&self, tab_id: i32, path: &str) -> Result<(), PersistenceError> {
        let link = self
            .current_link(tab_id)?
            .ok_or(PersistenceError::NotFound(tab_id))?;
        self.db.connection().execute(
            "UPDATE link SET thumb_path = ?1 WHERE link_id = ?2",
            params![path, link.link_id],
        )?;
        self.emit(DbEvent::ThumbPathChanged {
            url: link.url,
            path: path.to_string(),
        });
        Ok(())
    }

    fn update_title(&self, tab_id: i32, url: &str, title: &str) -> Result<(), PersistenceError> {
        let affected = self
            .db
            .connection()
            .execute("UPDATE link SET title = ?1 WHERE url = ?2", params![title, url])?;
        if affected == 0 {
            log::debug!("no stored link for {} (tab {}), title not persisted", url, tab_id);
            return Ok(());
        }
        self.emit(DbEvent::TitleChanged {
            url: url.to_string(),
            title: title.to_string(),
        });
        Ok(())
    }

    fn tab_history(&self, tab_id: i32) -> Result<Vec<Link>, PersistenceError> {
        self.query_links(
            "SELECT l.link_id, l.url, l.title, l.thumb_path \
             FROM tab_history th JOIN link l ON l.link_id = th.link_id \
             WHERE th.tab_id = ?1 ORDER BY th.id DESC",
            params![tab_id],
        )
    }

    fn history(&self) -> Result<Vec<Link>, PersistenceError> {
        self.query_links(
            "SELECT l.link_id, l.url, l.title, l.thumb_path \
             FROM browser_history h JOIN link l ON l.link_id = h.link_id \
             GROUP BY l.link_id ORDER BY MAX(h.id) DESC",
            [],
        )
    }

    fn all_tabs(&self) -> Result<Vec<Tab>, PersistenceError> {
        let mut stmt = self.db.connection().prepare(
            "SELECT t.tab_id, l.link_id, l.url, l.title, l.thumb_path \
             FROM tab t LEFT JOIN tab_history th ON th.id = t.tab_history_id \
             LEFT JOIN link l ON l.link_id = th.link_id ORDER BY t.tab_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Tab {
                tab_id: row.get(0)?,
                current_link: Link {
                    link_id: row.get::<_, Option<i32>>(1)?.unwrap_or_default(),
                    url: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    title: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                    thumb_path: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                },
                desktop_mode: false,
            })
        })?;
        let mut tabs = Vec::new();
        for row in rows {
            tabs.push(row?);
        }
        Ok(tabs)
    }

    fn max_tab_id(&self) -> Result<i32, PersistenceError> {
        let max = self
            .db
            .connection()
            .query_row("SELECT COALESCE(MAX(tab_id), 0) FROM tab", [], |row| row.get(0))?;
        Ok(max)
    }
}
